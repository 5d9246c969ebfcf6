//! # Repository Module
//!
//! Database repository implementations for Folio.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Presentation layer                                                    │
//! │       │                                                                 │
//! │       │  db.brokerages().insert(&MandatoryText::new("XYZ Corp")?)      │
//! │       ▼                                                                 │
//! │  BrokerageRepository / HoldingRepository                               │
//! │  ├── insert(..)        → store-assigned id                             │
//! │  ├── get_by_id(id)     → Option<record>                                │
//! │  ├── list_all()        → Vec<record>                                   │
//! │  ├── update(id, ..)    → NotFound if absent                            │
//! │  └── delete(id)        → NotFound / ForeignKeyViolation                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (schema version 4)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Write methods take value objects only, so unvalidated input cannot reach
//! a column.
//!
//! ## Available Repositories
//!
//! - [`BrokerageRepository`](brokerage::BrokerageRepository) - Brokerage CRUD, lookup by name
//! - [`HoldingRepository`](holding::HoldingRepository) - Holding CRUD, listing per brokerage

pub mod brokerage;
pub mod holding;
