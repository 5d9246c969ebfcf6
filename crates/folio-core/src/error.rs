//! # Error Types
//!
//! Domain-specific error types for folio-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  folio-core errors (this file)                                         │
//! │  └── ValidationError  - Value object construction failures             │
//! │                                                                         │
//! │  folio-db errors (separate crate)                                      │
//! │  └── DbError          - Storage, migration and initialization failures │
//! │                                                                         │
//! │  Flow: ValidationError → DbError::Validation → application boundary    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include the offending field in every message
//! 3. Errors are enum variants, never String
//! 4. Validation failures are raised at construction, never later

use thiserror::Error;

/// Field name used when a value object is built without a field label.
pub const UNNAMED_FIELD: &str = "value";

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised synchronously when a value object is constructed from raw input.
/// The caller recovers by supplying corrected input; there is no repair path
/// and no default substitution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} cannot be empty")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive, got {value}")]
    MustBePositive { field: String, value: i64 },
}

impl ValidationError {
    /// Creates a `Required` error for the given field.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Returns the name of the field that failed validation.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::MustBePositive { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================
