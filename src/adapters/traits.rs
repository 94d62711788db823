//! Registry access traits
//!
//! Read seams between the pipeline stages and the store. Each stage
//! depends only on the slice of the registry it actually reads, so a
//! stage can be exercised against an in-memory source while production
//! code runs against [`crate::adapters::postgres::RegistryStore`].

use crate::core::filter::CompiledFilter;
use crate::core::lookup::LookupKind;
use crate::domain::{CompositeKey, EntityKey, EstablishmentRow, PartnerRecord, StoreError};
use async_trait::async_trait;

/// Keyset window retrieval over the joined primary dataset
#[async_trait]
pub trait WindowSource: Send + Sync {
    /// Fetch up to `limit` rows strictly greater than `cursor` (all rows
    /// when `cursor` is `None`), matching the compiled predicate, in
    /// ascending composite-key order.
    async fn fetch_window(
        &self,
        filter: &CompiledFilter,
        cursor: Option<&CompositeKey>,
        limit: usize,
    ) -> Result<Vec<EstablishmentRow>, StoreError>;
}

/// Partner retrieval for a set of entity keys
#[async_trait]
pub trait PartnerSource: Send + Sync {
    /// Fetch every partner record of the given entities, grouped by
    /// entity and ordered by entry date within each group.
    async fn fetch_partners(&self, keys: &[EntityKey])
        -> Result<Vec<PartnerRecord>, StoreError>;
}

/// Full-table preload of one reference category
#[async_trait]
pub trait LookupSource: Send + Sync {
    async fn load_lookup(&self, kind: LookupKind) -> Result<Vec<(String, String)>, StoreError>;
}

/// Everything the export coordinator reads from the registry
pub trait RegistryReader: WindowSource + PartnerSource + LookupSource {}

impl<T: WindowSource + PartnerSource + LookupSource> RegistryReader for T {}
