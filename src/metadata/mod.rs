// Metadata provider — per-member attribute lookups.
//
// The pipeline talks to the provider only through the MetadataSource trait.
// The HTTP client is the production implementation; tests swap in
// in-memory sources.

pub mod client;
pub mod traits;
