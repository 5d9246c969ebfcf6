//! # Value Objects
//!
//! Wrapper types that can only exist in a valid state.
//!
//! ## Construction-Time Gate
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Value Object Lifecycle                               │
//! │                                                                         │
//! │  Raw input ("XYZ Corp", "", 42, -1)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  MandatoryText::new / EntityId::new  ← THIS MODULE                     │
//! │       │                                                                 │
//! │       ├── invalid? → Err(ValidationError)  (no instance is created)    │
//! │       │                                                                 │
//! │       └── valid    → Ok(value)  (immutable, always valid)              │
//! │                          │                                              │
//! │                          ▼                                              │
//! │                  Repository write (folio-db)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no `Default`, no setter and no unchecked constructor. Serde
//! deserialization routes through the same checks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ValidationError, ValidationResult, UNNAMED_FIELD};
use crate::validation::{validate_positive_id, validate_required};

// =============================================================================
// Mandatory Text
// =============================================================================

/// A string that is guaranteed to be non-empty.
///
/// The stored value is exactly the input: no trimming, no normalisation.
///
/// ## Example
/// ```rust
/// use folio_core::MandatoryText;
///
/// let name = MandatoryText::new("XYZ Corp").unwrap();
/// assert_eq!(name.as_str(), "XYZ Corp");
///
/// let err = MandatoryText::new("").unwrap_err();
/// assert_eq!(err.to_string(), "value cannot be empty");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MandatoryText(String);

impl MandatoryText {
    /// Creates a new value, failing with [`ValidationError::Required`] on
    /// empty input.
    pub fn new(value: impl Into<String>) -> ValidationResult<Self> {
        Self::for_field(UNNAMED_FIELD, value)
    }

    /// Like [`MandatoryText::new`], but names `field` in the error.
    pub fn for_field(field: &str, value: impl Into<String>) -> ValidationResult<Self> {
        let value = value.into();
        validate_required(field, &value)?;
        Ok(MandatoryText(value))
    }

    /// Returns the wrapped text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the owned text.
    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MandatoryText {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        MandatoryText::new(value)
    }
}

impl TryFrom<&str> for MandatoryText {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        MandatoryText::new(value)
    }
}

impl FromStr for MandatoryText {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MandatoryText::new(s)
    }
}

impl From<MandatoryText> for String {
    fn from(value: MandatoryText) -> Self {
        value.0
    }
}

impl AsRef<str> for MandatoryText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MandatoryText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Entity Identity
// =============================================================================

/// A store-assigned row identity (always `> 0`).
///
/// Used for every read/update/delete by identity so that a zero or negative
/// id is rejected before a query is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct EntityId(i64);

/// Identity of a [`crate::Brokerage`].
pub type BrokerageId = EntityId;

/// Identity of an [`crate::AssetHolding`].
pub type HoldingId = EntityId;

impl EntityId {
    /// Creates an identity, failing with [`ValidationError::MustBePositive`]
    /// for zero or negative input.
    pub fn new(id: i64) -> ValidationResult<Self> {
        validate_positive_id("id", id)?;
        Ok(EntityId(id))
    }

    /// Returns the raw integer.
    #[inline]
    pub const fn get(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for EntityId {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        EntityId::new(value)
    }
}

impl From<EntityId> for i64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
