// Rarity: rank collection members by how uncommon their traits are.
//
// This is the library root. Each module corresponds to one stage of the
// fetch -> aggregate -> score -> rank pipeline.

pub mod config;
pub mod metadata;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod ranking;
pub mod scoring;
pub mod stats;
