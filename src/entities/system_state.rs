//! System state entity - Stores the ledger's key-value pairs.
//! Holds the serialized record list, quota list, metadata document and the data
//! version, one row per key.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// System state database model - stores key-value pairs
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "system_state")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Storage key (e.g., `"leave-records"`)
    #[sea_orm(unique)]
    pub key: String,
    /// Value stored as text (JSON for everything but the data version)
    #[sea_orm(column_type = "Text")]
    pub value: String,
    /// When this value was last written
    pub updated_at: DateTime,
}

/// `SystemState` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
