//! # folio-core: Pure Domain Layer for Folio
//!
//! Value objects, validation rules and entity records for the Folio
//! investment tracker. Zero I/O: everything here is deterministic and
//! testable without a database.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Folio Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Presentation layer (desktop/mobile)             │   │
//! │  │        builds MandatoryText / EntityId, reads records           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ folio-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────────┐  ┌─────────────┐  ┌─────────────┐            │   │
//! │  │   │    value    │  │    types    │  │ validation  │            │   │
//! │  │   │MandatoryText│  │  Brokerage  │  │    rules    │            │   │
//! │  │   │  EntityId   │  │AssetHolding │  │             │            │   │
//! │  │   └─────────────┘  └─────────────┘  └─────────────┘            │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO FILESYSTEM                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    folio-db (Database Layer)                    │   │
//! │  │          schema, migrations, repositories, builder              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`value`] - Value objects (`MandatoryText`, `EntityId`)
//! - [`types`] - Entity records (`Brokerage`, `AssetHolding`)
//! - [`error`] - Validation error type
//! - [`validation`] - Validation rules used by the value objects
//!
//! ## Example Usage
//!
//! ```rust
//! use folio_core::{EntityId, MandatoryText};
//!
//! let name = MandatoryText::new("XYZ Corp").unwrap();
//! assert_eq!(name.as_str(), "XYZ Corp");
//!
//! assert!(MandatoryText::new("").is_err());
//! assert!(EntityId::new(0).is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod types;
pub mod validation;
pub mod value;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{ValidationError, ValidationResult};
pub use types::{AssetHolding, Brokerage};
pub use value::{BrokerageId, EntityId, HoldingId, MandatoryText};
