// Metadata source trait — the swap-ready abstraction over the provider.
//
// The scheduler only needs "give me member N of collection X". Keeping that
// behind a trait means the fetch strategies can be exercised without a
// network, and an alternate provider only has to implement one method.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{MemberId, Traits};

/// Trait for fetching one member's attribute map.
///
/// Implementations must be async because the real provider is an HTTP
/// endpoint. An `Err` is a per-member failure: the scheduler logs it and
/// leaves the member's slot empty. Implementations must not retry.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch the category -> value attributes for one member.
    async fn fetch_traits(&self, collection: &str, id: MemberId) -> Result<Traits>;
}
