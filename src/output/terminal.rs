// Colored terminal output for rankings, frequency tables, and members.
//
// main.rs delegates all display work here.

use colored::Colorize;

use crate::models::Member;
use crate::pipeline::rank::Ranking;
use crate::stats::tables::FrequencyTables;

const VALUE_WIDTH: usize = 40;

/// Display the top-K list and a short run summary.
pub fn display_ranking(ranking: &Ranking) {
    let failed = ranking.failed_ids();

    println!(
        "\n{}",
        format!(
            "=== Top {} Rarest in {} ===",
            ranking.top.len(),
            ranking.collection.slug
        )
        .bold()
    );
    println!();

    if ranking.top.is_empty() {
        println!("  No members ranked.");
    } else {
        println!(
            "  {:>4}  {:>8}  {:>10}",
            "Rank".dimmed(),
            "Member".dimmed(),
            "Rarity".dimmed(),
        );
        println!("  {}", "-".repeat(26).dimmed());

        for (i, entry) in ranking.top.iter().enumerate() {
            let score = format!("{:>10.6}", entry.score);
            let score = if i == 0 { score.green().bold() } else { score.normal() };
            println!("  {:>4}. {:>8}  {}", i + 1, format!("#{}", entry.id), score);
        }
    }

    println!();
    println!(
        "  Fetched {} of {} members",
        ranking.fetched(),
        ranking.requested()
    );
    if !failed.is_empty() {
        println!(
            "  {} {} fetches failed: {}",
            "!".yellow(),
            failed.len(),
            summarize_ids(&failed, 10).dimmed()
        );
    }
    if ranking.sheet.missing_pairs > 0 {
        println!(
            "  {} {} trait lookups missed the frequency tables",
            "!!".red().bold(),
            ranking.sheet.missing_pairs
        );
    }
}

/// Dump both frequency tables, sorted for stable output.
pub fn display_tables(tables: &FrequencyTables) {
    println!(
        "\n{}",
        format!(
            "=== Trait-Value Counts ({} members) ===",
            tables.members_observed()
        )
        .bold()
    );
    for (category, value, count) in tables.frequency_rows() {
        println!(
            "  {}: {:<width$} {:>6}",
            category.cyan(),
            super::truncate_chars(value, VALUE_WIDTH),
            count,
            width = VALUE_WIDTH + 3,
        );
    }

    println!(
        "\n{}",
        format!(
            "=== Trait Category Value Counts ({} categories) ===",
            tables.category_count()
        )
        .bold()
    );
    for (category, distinct) in tables.distinct_rows() {
        println!("  {:<32} {:>6}", category.cyan(), distinct);
    }
}

/// List every fetched member with its traits and score.
pub fn display_members(ranking: &Ranking) {
    println!("\n{}", "=== Members ===".bold());
    for (member, score) in ranking.scored_members() {
        println!("  Member #{}  rarity {:.6}", member.id, score);
        print_traits(member);
    }
}

/// Display a single member's traits (no score: there are no tables to score against).
pub fn display_member(member: &Member) {
    println!("\n{}", format!("=== Member #{} ===", member.id).bold());
    if member.traits.is_empty() {
        println!("  (no traits)");
        return;
    }
    print_traits(member);
}

fn print_traits(member: &Member) {
    for (category, value) in member.pairs() {
        println!(
            "    {:<24} {}",
            category.dimmed(),
            super::truncate_chars(value, VALUE_WIDTH)
        );
    }
}

/// Render up to `limit` ids, then "(+N more)".
fn summarize_ids(ids: &[u32], limit: usize) -> String {
    let shown: Vec<String> = ids.iter().take(limit).map(|id| id.to_string()).collect();
    let mut out = shown.join(", ");
    if ids.len() > limit {
        out.push_str(&format!(" (+{} more)", ids.len() - limit));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_ids_short_list() {
        assert_eq!(summarize_ids(&[3, 7], 10), "3, 7");
    }

    #[test]
    fn test_summarize_ids_truncates() {
        assert_eq!(summarize_ids(&[1, 2, 3, 4], 2), "1, 2 (+2 more)");
    }
}
