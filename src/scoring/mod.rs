// Scoring — per-member rarity against the collection's frequency tables.

pub mod rarity;
