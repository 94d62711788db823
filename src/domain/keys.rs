//! Registry identifier types with validation
//!
//! Newtype wrappers for the CNPJ key fragments. The composite key doubles
//! as the pagination cursor, so its ordering must match the store's
//! `ORDER BY cnpj_part1, cnpj_part2, cnpj_part3`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Entity key newtype wrapper
///
/// The 8-character root fragment of a CNPJ, identifying the legal entity.
/// All establishments and partners of an entity share this fragment.
///
/// # Examples
///
/// ```
/// use cnpj_export::domain::keys::EntityKey;
/// use std::str::FromStr;
///
/// let key = EntityKey::from_str("12345678").unwrap();
/// assert_eq!(key.as_str(), "12345678");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityKey(String);

impl EntityKey {
    /// Creates a new EntityKey from a string
    ///
    /// # Errors
    ///
    /// Returns `Err` when the fragment is not exactly 8 ASCII digits.
    pub fn new(key: impl Into<String>) -> Result<Self, String> {
        let key = key.into();
        if key.len() != 8 || !key.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!(
                "Entity key must be exactly 8 digits, got: '{key}'"
            ));
        }
        Ok(Self(key))
    }

    /// Returns the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for EntityKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Composite establishment key, also the pagination cursor
///
/// Ordered tuple (entity, branch, order): the 8-char entity fragment, the
/// 4-char branch fragment and the 2-char order fragment. The derived
/// lexicographic ordering matches the store's composite index order, which
/// is what keyset pagination relies on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CompositeKey {
    entity: EntityKey,
    branch: String,
    order: String,
}

impl CompositeKey {
    /// Creates a new CompositeKey from its three fragments
    ///
    /// # Errors
    ///
    /// Returns `Err` when any fragment has the wrong length or contains
    /// non-digit characters.
    pub fn new(
        entity: impl Into<String>,
        branch: impl Into<String>,
        order: impl Into<String>,
    ) -> Result<Self, String> {
        let entity = EntityKey::new(entity)?;
        let branch = branch.into();
        let order = order.into();
        if branch.len() != 4 || !branch.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("Branch fragment must be 4 digits, got: '{branch}'"));
        }
        if order.len() != 2 || !order.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("Order fragment must be 2 digits, got: '{order}'"));
        }
        Ok(Self {
            entity,
            branch,
            order,
        })
    }

    /// The entity fragment
    pub fn entity(&self) -> &EntityKey {
        &self.entity
    }

    /// The branch fragment
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// The order fragment
    pub fn order(&self) -> &str {
        &self.order
    }

    /// Full 14-digit CNPJ string
    pub fn full_cnpj(&self) -> String {
        format!("{}{}{}", self.entity, self.branch, self.order)
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}-{}", self.entity, self.branch, self.order)
    }
}
