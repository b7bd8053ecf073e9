use crate::{
    entities::{SystemState, system_state},
    errors::Result,
    storage::KeyValueStore,
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use tracing::debug;

/// Key-value store persisted to the `system_state` table.
#[derive(Debug, Clone)]
pub struct SystemStateStore {
    db: DatabaseConnection,
}

impl SystemStateStore {
    /// Wraps an open connection whose tables already exist.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl KeyValueStore for SystemStateStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let state = SystemState::find()
            .filter(system_state::Column::Key.eq(key))
            .one(&self.db)
            .await?;

        Ok(state.map(|s| s.value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = Utc::now().naive_utc();

        let existing = SystemState::find()
            .filter(system_state::Column::Key.eq(key))
            .one(&self.db)
            .await?;

        if let Some(state) = existing {
            let mut active_model: system_state::ActiveModel = state.into();
            active_model.value = Set(value.to_string());
            active_model.updated_at = Set(now);
            active_model.update(&self.db).await?;
        } else {
            let new_state = system_state::ActiveModel {
                key: Set(key.to_string()),
                value: Set(value.to_string()),
                updated_at: Set(now),
                ..Default::default()
            };
            new_state.insert(&self.db).await?;
        }

        debug!("Stored {} bytes under '{}'", value.len(), key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        SystemState::delete_many()
            .filter(system_state::Column::Key.eq(key))
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
