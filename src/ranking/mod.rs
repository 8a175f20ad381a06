// Ranking — bounded top-K selection over member scores.

pub mod top_k;
