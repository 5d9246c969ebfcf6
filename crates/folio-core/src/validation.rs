//! # Validation Module
//!
//! Input validation rules backing the value objects in [`crate::value`].
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Presentation layer                                           │
//! │  ├── Immediate user feedback                                           │
//! │  └── Builds value objects, never raw strings                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Value objects (Rust)                                         │
//! │  └── THIS MODULE: construction-time gate                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  └── Foreign key constraints (ON DELETE RESTRICT)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use folio_core::validation::{validate_required, validate_positive_id};
//!
//! assert!(validate_required("name", "XYZ Corp").is_ok());
//! assert!(validate_required("name", "").is_err());
//! assert!(validate_positive_id("id", 0).is_err());
//! ```

use crate::error::{ValidationError, ValidationResult};

// =============================================================================
// String Validators
// =============================================================================

/// Validates that a value is non-empty.
///
/// Whitespace counts as content: `" "` is accepted and kept verbatim.
/// Only the zero-length string is rejected.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    Ok(())
}

// =============================================================================
// Identity Validators
// =============================================================================

/// Validates a store-assigned identity.
///
/// SQLite `INTEGER PRIMARY KEY AUTOINCREMENT` never hands out values below 1,
/// so zero and negatives can only come from callers.
pub fn validate_positive_id(field: &str, id: i64) -> ValidationResult<()> {
    if id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
            value: id,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_required() {
        assert!(validate_required("name", "XYZ Corp").is_ok());
        assert!(validate_required("name", " ").is_ok());
        assert_eq!(
            validate_required("name", ""),
            Err(ValidationError::required("name"))
        );
    }

    #[test]
    fn test_validate_positive_id() {
        assert!(validate_positive_id("id", 1).is_ok());
        assert!(validate_positive_id("id", i64::MAX).is_ok());
        assert!(validate_positive_id("id", 0).is_err());
        assert!(validate_positive_id("id", -1).is_err());
    }
}
