//! # Entity Records
//!
//! Typed projections of the rows folio-db persists.
//!
//! ## Relations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Entities                                        │
//! │                                                                         │
//! │  ┌─────────────────┐          ┌─────────────────────┐                   │
//! │  │   Brokerage     │ 1      * │    AssetHolding     │                   │
//! │  │  ─────────────  │◄─────────│  ─────────────────  │                   │
//! │  │  id (INTEGER)   │          │  id (INTEGER)       │                   │
//! │  │  name           │          │  brokerage_id (FK)  │                   │
//! │  └─────────────────┘          └─────────────────────┘                   │
//! │                                                                         │
//! │  ON DELETE RESTRICT: a brokerage with holdings cannot be deleted.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Records are transient: the database is the source of truth. Writes go
//! through value objects ([`crate::MandatoryText`], [`crate::EntityId`]),
//! never through these structs.
//!
//! Holdings no longer carry quantity, average cost, invested value or
//! current value. Those are derived elsewhere and have no field here.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::value::EntityId;

// =============================================================================
// Brokerage
// =============================================================================

/// A custodial institution holding the user's assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Brokerage {
    /// Store-assigned identity.
    pub id: i64,

    /// Display name, never empty.
    pub name: String,
}

impl Brokerage {
    /// Returns the identity as a value object.
    ///
    /// Rows read from the store always carry a positive id; `None` only for
    /// records assembled by hand.
    pub fn entity_id(&self) -> Option<EntityId> {
        EntityId::new(self.id).ok()
    }
}

// =============================================================================
// Asset Holding
// =============================================================================

/// A position in a tradable asset, kept at one brokerage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AssetHolding {
    /// Store-assigned identity.
    pub id: i64,

    /// Owning brokerage.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "brokerageId"))]
    pub brokerage_id: i64,
}

impl AssetHolding {
    /// Returns the identity as a value object.
    pub fn entity_id(&self) -> Option<EntityId> {
        EntityId::new(self.id).ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holding_serializes_without_valuation_fields() {
        let holding = AssetHolding {
            id: 3,
            brokerage_id: 1,
        };
        let json = serde_json::to_value(&holding).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj.len(), 2);
        assert_eq!(obj["brokerageId"], 1);
        for dropped in ["quantity", "averageCost", "investedValue", "currentValue"] {
            assert!(!obj.contains_key(dropped));
        }
    }

    #[test]
    fn test_entity_id_projection() {
        let brokerage = Brokerage {
            id: 9,
            name: "XYZ Corp".to_string(),
        };
        assert_eq!(brokerage.entity_id().map(|id| id.get()), Some(9));

        let unsaved = Brokerage {
            id: 0,
            name: "Draft".to_string(),
        };
        assert!(unsaved.entity_id().is_none());
    }
}
