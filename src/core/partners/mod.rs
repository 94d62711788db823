//! Partner Resolver
//!
//! Fetches and aggregates partner records for a batch of entity keys
//! into a per-key summary string. Deliberately uncached: partner sets
//! are large and cardinality-unbounded, so a cache would grow without
//! limit — every window re-fetches.
//!
//! Keys are grouped into IN-list sub-chunks bounded by the chunk hint.
//! A transient sub-chunk failure is retried at half size (the retry
//! budget is configuration); a sub-chunk that keeps failing aborts the
//! run, because silently missing partner data for part of a window is a
//! correctness violation. Failing one sub-chunk never loses data for
//! keys in the others.

use crate::adapters::traits::PartnerSource;
use crate::config::PartnerConfig;
use crate::core::lookup::{LookupCache, LookupKind};
use crate::domain::{CnpjError, EntityKey, PartnerRecord, Result};
use std::collections::HashMap;

/// Separator between the fields of one partner and between partners
const SUMMARY_SEPARATOR: &str = " | ";

/// Batched partner aggregation over the registry store
///
/// Holds no mutable state; safe to invoke concurrently for disjoint key
/// sets.
pub struct PartnerResolver<'a, S> {
    store: &'a S,
    config: PartnerConfig,
}

impl<'a, S: PartnerSource> PartnerResolver<'a, S> {
    pub fn new(store: &'a S, config: PartnerConfig) -> Self {
        Self { store, config }
    }

    /// Resolve aggregated partner summaries for a batch of entity keys
    ///
    /// Every requested key is present in the result; a key without
    /// partners maps to an empty string, never to a missing entry.
    /// Sub-chunks are fetched concurrently — they partition the key set,
    /// so no two touch the same entity.
    pub async fn resolve(
        &self,
        keys: &[EntityKey],
        lookups: &LookupCache,
    ) -> Result<HashMap<EntityKey, String>> {
        let unique = dedupe_preserving_order(keys);
        let mut summaries: HashMap<EntityKey, String> =
            unique.iter().map(|k| ((*k).clone(), String::new())).collect();

        if unique.is_empty() {
            return Ok(summaries);
        }

        let chunk_fetches = unique
            .chunks(self.config.chunk_size)
            .map(|chunk| self.fetch_chunk(chunk));
        let fetched = futures::future::try_join_all(chunk_fetches).await?;

        for record in fetched.into_iter().flatten() {
            let summary = summaries
                .entry(record.entity.clone())
                .or_default();
            if !summary.is_empty() {
                summary.push_str(SUMMARY_SEPARATOR);
            }
            summary.push_str(&format_partner(&record, lookups));
        }

        Ok(summaries)
    }

    /// Fetch one sub-chunk, halving on transient failure
    ///
    /// Uses an explicit work list instead of recursion: a failing slice
    /// is split in two and both halves are re-fetched with one retry
    /// fewer. Retrieval order is preserved by processing the first half
    /// before the second.
    async fn fetch_chunk(&self, chunk: &[&EntityKey]) -> Result<Vec<PartnerRecord>> {
        let owned: Vec<EntityKey> = chunk.iter().map(|k| (*k).clone()).collect();
        let mut records = Vec::new();
        let mut work: Vec<(usize, usize, usize)> = vec![(0, owned.len(), self.config.retries)];

        while let Some((start, end, retries_left)) = work.pop() {
            let slice = &owned[start..end];
            match self.store.fetch_partners(slice).await {
                Ok(mut fetched) => records.append(&mut fetched),
                Err(e) if e.is_transient() && retries_left > 0 && slice.len() > 1 => {
                    let mid = start + slice.len() / 2;
                    tracing::warn!(
                        chunk_len = slice.len(),
                        retries_left,
                        error = %e,
                        "Partner sub-chunk failed, retrying at half size"
                    );
                    work.push((mid, end, retries_left - 1));
                    work.push((start, mid, retries_left - 1));
                }
                Err(e) => {
                    return Err(CnpjError::PartnerResolution {
                        chunk_len: slice.len(),
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(records)
    }
}

fn format_partner(record: &PartnerRecord, lookups: &LookupCache) -> String {
    let qualification = record
        .qualification_code
        .map(|code| lookups.describe(LookupKind::Qualification, &code.to_string()).to_string())
        .unwrap_or_default();
    format!(
        "Nome: {} | Qualificação: {} | Data Entrada: {}",
        record.name.as_deref().unwrap_or(""),
        qualification,
        record.entry_date.as_deref().unwrap_or("")
    )
}

fn dedupe_preserving_order(keys: &[EntityKey]) -> Vec<&EntityKey> {
    let mut seen = std::collections::HashSet::new();
    keys.iter().filter(|k| seen.insert(*k)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StoreError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn key(s: &str) -> EntityKey {
        EntityKey::new(s).unwrap()
    }

    fn qualification_cache() -> LookupCache {
        LookupCache::from_entries([(
            LookupKind::Qualification,
            vec![("49".to_string(), "Sócio-Administrador".to_string())],
        )])
    }

    fn partner(entity: &str, name: &str, entry_date: &str) -> PartnerRecord {
        PartnerRecord {
            entity: key(entity),
            name: Some(name.to_string()),
            qualification_code: Some(49),
            entry_date: Some(entry_date.to_string()),
            legal_representative: None,
        }
    }

    /// In-memory partner source; slices larger than `fail_above` fail
    /// transiently, and every requested slice size is recorded.
    struct ScriptedSource {
        records: Vec<PartnerRecord>,
        fail_above: Option<usize>,
        requests: Mutex<Vec<usize>>,
    }

    impl ScriptedSource {
        fn new(records: Vec<PartnerRecord>) -> Self {
            Self {
                records,
                fail_above: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing_above(records: Vec<PartnerRecord>, limit: usize) -> Self {
            Self {
                fail_above: Some(limit),
                ..Self::new(records)
            }
        }
    }

    #[async_trait]
    impl PartnerSource for ScriptedSource {
        async fn fetch_partners(
            &self,
            keys: &[EntityKey],
        ) -> std::result::Result<Vec<PartnerRecord>, StoreError> {
            self.requests.lock().unwrap().push(keys.len());
            if let Some(limit) = self.fail_above {
                if keys.len() > limit {
                    return Err(StoreError::Transient("connection reset".to_string()));
                }
            }
            Ok(self
                .records
                .iter()
                .filter(|r| keys.contains(&r.entity))
                .cloned()
                .collect())
        }
    }

    #[tokio::test]
    async fn test_resolve_empty_key_list() {
        let source = ScriptedSource::new(Vec::new());
        let resolver = PartnerResolver::new(&source, PartnerConfig::default());
        let summaries = resolver.resolve(&[], &qualification_cache()).await.unwrap();
        assert!(summaries.is_empty());
        assert!(source.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_every_key_present_even_without_partners() {
        let source = ScriptedSource::new(vec![partner("11111111", "MARIA", "20150310")]);
        let resolver = PartnerResolver::new(&source, PartnerConfig::default());

        let keys = vec![key("11111111"), key("22222222")];
        let summaries = resolver.resolve(&keys, &qualification_cache()).await.unwrap();

        assert_eq!(summaries.len(), 2);
        assert!(summaries[&key("11111111")].contains("MARIA"));
        assert_eq!(summaries[&key("22222222")], "");
    }

    #[tokio::test]
    async fn test_partners_aggregated_in_order_across_chunks() {
        let source = ScriptedSource::new(vec![
            partner("11111111", "MARIA", "20100101"),
            partner("11111111", "JOSE", "20150310"),
            partner("22222222", "ANA", "20200801"),
        ]);
        let config = PartnerConfig {
            chunk_size: 1,
            ..PartnerConfig::default()
        };
        let resolver = PartnerResolver::new(&source, config);

        let keys = vec![key("11111111"), key("22222222")];
        let summaries = resolver.resolve(&keys, &qualification_cache()).await.unwrap();

        let first = &summaries[&key("11111111")];
        let maria = first.find("MARIA").unwrap();
        let jose = first.find("JOSE").unwrap();
        assert!(maria < jose, "retrieval order must survive aggregation");
        assert_eq!(first.matches("Nome:").count(), 2);
        assert_eq!(summaries[&key("22222222")].matches("Nome:").count(), 1);
        assert_eq!(*source.requests.lock().unwrap(), vec![1, 1]);
    }

    #[tokio::test]
    async fn test_halved_retry_keeps_every_partner() {
        let records = vec![
            partner("11111111", "A", "20100101"),
            partner("22222222", "B", "20100101"),
            partner("33333333", "C", "20100101"),
            partner("44444444", "D", "20100101"),
        ];
        let source = ScriptedSource::failing_above(records, 2);
        let config = PartnerConfig {
            chunk_size: 4,
            retries: 1,
        };
        let resolver = PartnerResolver::new(&source, config);

        let keys = vec![
            key("11111111"),
            key("22222222"),
            key("33333333"),
            key("44444444"),
        ];
        let summaries = resolver.resolve(&keys, &qualification_cache()).await.unwrap();

        for k in &keys {
            assert!(!summaries[k].is_empty(), "partner lost for {}", k.as_str());
        }
        // Full chunk fails once, then both halves succeed, first half first
        assert_eq!(*source.requests.lock().unwrap(), vec![4, 2, 2]);
    }

    #[tokio::test]
    async fn test_exhausted_retries_abort_the_chunk() {
        let source = ScriptedSource::failing_above(Vec::new(), 0);
        let config = PartnerConfig {
            chunk_size: 4,
            retries: 1,
        };
        let resolver = PartnerResolver::new(&source, config);

        let keys = vec![key("11111111"), key("22222222"), key("33333333"), key("44444444")];
        let err = resolver
            .resolve(&keys, &qualification_cache())
            .await
            .unwrap_err();
        assert!(matches!(err, CnpjError::PartnerResolution { .. }));
    }

    #[test]
    fn test_dedupe_preserves_first_occurrence_order() {
        let keys = vec![key("11111111"), key("22222222"), key("11111111")];
        let unique = dedupe_preserving_order(&keys);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].as_str(), "11111111");
        assert_eq!(unique[1].as_str(), "22222222");
    }

    #[test]
    fn test_format_partner_with_qualification() {
        let record = PartnerRecord {
            entity: key("11111111"),
            name: Some("MARIA DA SILVA".to_string()),
            qualification_code: Some(49),
            entry_date: Some("20150310".to_string()),
            legal_representative: None,
        };
        let formatted = format_partner(&record, &qualification_cache());
        assert_eq!(
            formatted,
            "Nome: MARIA DA SILVA | Qualificação: Sócio-Administrador | Data Entrada: 20150310"
        );
    }

    #[test]
    fn test_format_partner_with_unknown_qualification() {
        let record = PartnerRecord {
            entity: key("11111111"),
            name: Some("JOSE SANTOS".to_string()),
            qualification_code: Some(99),
            entry_date: None,
            legal_representative: None,
        };
        let formatted = format_partner(&record, &qualification_cache());
        assert_eq!(formatted, "Nome: JOSE SANTOS | Qualificação:  | Data Entrada: ");
    }
}
