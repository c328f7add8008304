use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use surrealdb::{Datetime, RecordId};

use crate::db::connection::CanonDb;
use crate::DramaturgError;

/// Worldbuilding category. Part of the world entry merge key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WorldCategory {
    #[default]
    Location,
    Culture,
    Rule,
    History,
    Technology,
}

impl WorldCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorldCategory::Location => "location",
            WorldCategory::Culture => "culture",
            WorldCategory::Rule => "rule",
            WorldCategory::History => "history",
            WorldCategory::Technology => "technology",
        }
    }
}

/// World entry as stored in database. `(category, name)` is unique per drama.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldEntry {
    pub id: RecordId,
    pub drama: RecordId,
    pub category: WorldCategory,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Datetime,
    pub updated_at: Datetime,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct WorldEntryCreate {
    pub drama: RecordId,
    pub category: WorldCategory,
    pub name: String,
    pub description: Option<String>,
}

/// Only the description can change; category and name are the key.
#[skip_serializing_none]
#[derive(Debug, Default, Clone, Serialize)]
pub struct WorldEntryUpdate {
    pub description: Option<String>,
}

pub async fn create_world_entry(
    db: &CanonDb,
    data: WorldEntryCreate,
) -> Result<WorldEntry, DramaturgError> {
    let result: Option<WorldEntry> = db.create("world_entry").content(data).await?;
    result.ok_or_else(|| DramaturgError::Database("Failed to create world entry".into()))
}

pub async fn list_world_entries(
    db: &CanonDb,
    drama: &RecordId,
) -> Result<Vec<WorldEntry>, DramaturgError> {
    let mut response = db
        .query("SELECT * FROM world_entry WHERE drama = $drama ORDER BY category ASC, name ASC")
        .bind(("drama", drama.clone()))
        .await?;
    let result: Vec<WorldEntry> = response.take(0)?;
    Ok(result)
}

pub async fn update_world_entry(
    db: &CanonDb,
    id: &RecordId,
    data: WorldEntryUpdate,
) -> Result<WorldEntry, DramaturgError> {
    let result: Option<WorldEntry> = db.update(id.clone()).merge(data).await?;
    result.ok_or_else(|| DramaturgError::not_found("world_entry", id.key().to_string()))
}
