//! Lookup Cache
//!
//! Preloads the small reference tables (activity codes, municipalities,
//! countries, legal natures, partner qualifications, status reasons) into
//! immutable code→description maps. Loaded once at pipeline start and
//! shared read-only afterwards, so intra-window concurrency needs no
//! locking.

use crate::adapters::traits::LookupSource;
use crate::domain::{CnpjError, Result};
use std::collections::HashMap;
use std::fmt;

/// Canonical domestic country code (Brazil)
pub const DOMESTIC_COUNTRY_CODE: i32 = 105;

/// Legacy placeholder country code found on older establishment rows
pub const LEGACY_COUNTRY_PLACEHOLDER: i32 = 0;

/// The static reference categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    /// CNAE activity code → description
    Activity,
    /// Municipality code → name
    Municipality,
    /// Country code → name
    Country,
    /// Legal-nature code → description
    LegalNature,
    /// Partner-qualification code → description
    Qualification,
    /// Registration status-reason code → description
    StatusReason,
}

impl LookupKind {
    /// Every kind the output contract depends on
    pub fn all() -> [LookupKind; 6] {
        [
            LookupKind::Activity,
            LookupKind::Municipality,
            LookupKind::Country,
            LookupKind::LegalNature,
            LookupKind::Qualification,
            LookupKind::StatusReason,
        ]
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LookupKind::Activity => "activity",
            LookupKind::Municipality => "municipality",
            LookupKind::Country => "country",
            LookupKind::LegalNature => "legal_nature",
            LookupKind::Qualification => "qualification",
            LookupKind::StatusReason => "status_reason",
        };
        write!(f, "{name}")
    }
}

/// A country code that has already had the legacy placeholder corrected
///
/// This is the only input type [`LookupCache::country_name`] accepts, so a
/// country-name lookup on an unnormalized code does not compile. The
/// normalization itself lives in the constructor and is idempotent: the
/// canonical domestic code maps to itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedCountryCode(i32);

impl NormalizedCountryCode {
    /// Normalizes a raw country code from the store
    ///
    /// The legacy placeholder 0 becomes the canonical domestic code; a
    /// NULL code stays absent (the row is not assumed domestic).
    pub fn from_raw(raw: Option<i32>) -> Option<Self> {
        raw.map(|code| {
            if code == LEGACY_COUNTRY_PLACEHOLDER {
                Self(DOMESTIC_COUNTRY_CODE)
            } else {
                Self(code)
            }
        })
    }

    /// The normalized numeric code
    pub fn as_i32(&self) -> i32 {
        self.0
    }
}

/// Immutable in-memory reference maps, one per loaded kind
///
/// Unknown codes resolve to an empty description; a kind whose table
/// could not be loaded at all is a fatal error at load time, because the
/// output contract depends on every kind.
pub struct LookupCache {
    maps: HashMap<LookupKind, HashMap<String, String>>,
}

impl LookupCache {
    /// Loads the requested kinds fully from the registry store
    ///
    /// Idempotent per run: each call builds a fresh cache.
    ///
    /// # Errors
    ///
    /// Returns [`CnpjError::LookupUnavailable`] naming the kind whose
    /// table failed to load.
    pub async fn load<S: LookupSource>(store: &S, kinds: &[LookupKind]) -> Result<Self> {
        let mut maps = HashMap::with_capacity(kinds.len());

        for kind in kinds {
            let entries = store.load_lookup(*kind).await.map_err(|e| {
                CnpjError::LookupUnavailable {
                    kind: kind.to_string(),
                    message: e.to_string(),
                }
            })?;

            tracing::info!(kind = %kind, entries = entries.len(), "Lookup table loaded");
            maps.insert(*kind, entries.into_iter().collect());
        }

        Ok(Self { maps })
    }

    /// Builds a cache from in-memory entries (tests and dry runs)
    pub fn from_entries(
        entries: impl IntoIterator<Item = (LookupKind, Vec<(String, String)>)>,
    ) -> Self {
        let maps = entries
            .into_iter()
            .map(|(kind, pairs)| (kind, pairs.into_iter().collect()))
            .collect();
        Self { maps }
    }

    /// Description for a code, or "" when the code or kind is unknown
    ///
    /// Country descriptions go through [`Self::country_name`] instead so
    /// the normalization step cannot be skipped.
    pub fn describe(&self, kind: LookupKind, code: &str) -> &str {
        self.maps
            .get(&kind)
            .and_then(|map| map.get(code))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Country name for an already-normalized code
    pub fn country_name(&self, code: NormalizedCountryCode) -> &str {
        self.describe(LookupKind::Country, &code.as_i32().to_string())
    }

    /// Number of entries loaded for a kind
    pub fn len(&self, kind: LookupKind) -> usize {
        self.maps.get(&kind).map_or(0, HashMap::len)
    }

    /// Whether nothing was loaded for a kind
    pub fn is_empty(&self, kind: LookupKind) -> bool {
        self.len(kind) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_with_countries() -> LookupCache {
        LookupCache::from_entries([(
            LookupKind::Country,
            vec![
                ("105".to_string(), "BRASIL".to_string()),
                ("249".to_string(), "ESTADOS UNIDOS".to_string()),
            ],
        )])
    }

    #[test]
    fn test_legacy_placeholder_normalizes_to_domestic() {
        let code = NormalizedCountryCode::from_raw(Some(0)).unwrap();
        assert_eq!(code.as_i32(), DOMESTIC_COUNTRY_CODE);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let once = NormalizedCountryCode::from_raw(Some(0)).unwrap();
        let twice = NormalizedCountryCode::from_raw(Some(once.as_i32())).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_null_country_stays_absent() {
        assert!(NormalizedCountryCode::from_raw(None).is_none());
    }

    #[test]
    fn test_placeholder_resolves_to_domestic_name() {
        let cache = cache_with_countries();
        let code = NormalizedCountryCode::from_raw(Some(0)).unwrap();
        assert_eq!(cache.country_name(code), "BRASIL");
    }

    #[test]
    fn test_foreign_code_unchanged() {
        let cache = cache_with_countries();
        let code = NormalizedCountryCode::from_raw(Some(249)).unwrap();
        assert_eq!(cache.country_name(code), "ESTADOS UNIDOS");
    }

    #[test]
    fn test_unknown_code_resolves_empty() {
        let cache = cache_with_countries();
        let code = NormalizedCountryCode::from_raw(Some(999)).unwrap();
        assert_eq!(cache.country_name(code), "");
    }

    #[test]
    fn test_describe_missing_kind_is_empty() {
        let cache = cache_with_countries();
        assert_eq!(cache.describe(LookupKind::Activity, "4781400"), "");
        assert!(cache.is_empty(LookupKind::Activity));
    }
}
