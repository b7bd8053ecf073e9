//! Entity module - Contains the SeaORM entity definitions for the database.
//! The ledger persists through a single key-value table; each entity has a Model
//! struct for data and an Entity struct for operations.

pub mod system_state;

pub use system_state::{
    Column as SystemStateColumn, Entity as SystemState, Model as SystemStateModel,
};
