use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use surrealdb::{Datetime, RecordId};

use crate::db::connection::CanonDb;
use crate::DramaturgError;

/// A drama (project). Every canon entity is scoped under one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drama {
    pub id: RecordId,
    pub title: String,
    pub genre: Option<String>,
    pub tone: Option<String>,
    pub setting: Option<String>,
    pub logline: Option<String>,
    pub total_episodes: Option<i64>,
    pub created_at: Datetime,
    pub updated_at: Datetime,
}

impl Drama {
    /// The record key, used as the project id across the crate.
    pub fn project_id(&self) -> String {
        self.id.key().to_string()
    }
}

/// Data for creating a new drama.
#[skip_serializing_none]
#[derive(Debug, Default, Clone, Serialize)]
pub struct DramaCreate {
    pub title: String,
    pub genre: Option<String>,
    pub tone: Option<String>,
    pub setting: Option<String>,
    pub logline: Option<String>,
    pub total_episodes: Option<i64>,
}

/// Fields to change on a drama. `None` leaves the stored value alone.
#[skip_serializing_none]
#[derive(Debug, Default, Clone, Serialize)]
pub struct DramaUpdate {
    pub title: Option<String>,
    pub genre: Option<String>,
    pub tone: Option<String>,
    pub setting: Option<String>,
    pub logline: Option<String>,
    pub total_episodes: Option<i64>,
}

impl DramaUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.genre.is_none()
            && self.tone.is_none()
            && self.setting.is_none()
            && self.logline.is_none()
            && self.total_episodes.is_none()
    }
}

pub async fn create_drama(db: &CanonDb, data: DramaCreate) -> Result<Drama, DramaturgError> {
    let result: Option<Drama> = db.create("drama").content(data).await?;
    result.ok_or_else(|| DramaturgError::Database("Failed to create drama".into()))
}

/// Get a drama by key, `None` if absent.
pub async fn get_drama(db: &CanonDb, id: &str) -> Result<Option<Drama>, DramaturgError> {
    let result: Option<Drama> = db.select(("drama", id)).await?;
    Ok(result)
}

/// Get a drama by key, failing with `NotFound` if absent.
pub async fn require_drama(db: &CanonDb, id: &str) -> Result<Drama, DramaturgError> {
    get_drama(db, id)
        .await?
        .ok_or_else(|| DramaturgError::not_found("drama", id))
}

pub async fn list_dramas(db: &CanonDb) -> Result<Vec<Drama>, DramaturgError> {
    let result: Vec<Drama> = db.select("drama").await?;
    Ok(result)
}

pub async fn update_drama(
    db: &CanonDb,
    id: &RecordId,
    data: DramaUpdate,
) -> Result<Drama, DramaturgError> {
    let result: Option<Drama> = db.update(id.clone()).merge(data).await?;
    result.ok_or_else(|| DramaturgError::not_found("drama", id.key().to_string()))
}
