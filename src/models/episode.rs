use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use surrealdb::{Datetime, RecordId};

use crate::db::connection::CanonDb;
use crate::DramaturgError;

/// Status given to episodes created without one.
pub const DEFAULT_EPISODE_STATUS: &str = "planned";

/// Episode entity as stored in database. `number` is unique per drama.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    pub id: RecordId,
    pub drama: RecordId,
    pub number: i64,
    pub title: String,
    pub synopsis: Option<String>,
    pub status: String,
    pub created_at: Datetime,
    pub updated_at: Datetime,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct EpisodeCreate {
    pub drama: RecordId,
    pub number: i64,
    pub title: String,
    pub synopsis: Option<String>,
    pub status: String,
}

#[skip_serializing_none]
#[derive(Debug, Default, Clone, Serialize)]
pub struct EpisodeUpdate {
    pub title: Option<String>,
    pub synopsis: Option<String>,
    pub status: Option<String>,
}

impl EpisodeUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.synopsis.is_none() && self.status.is_none()
    }
}

pub async fn create_episode(db: &CanonDb, data: EpisodeCreate) -> Result<Episode, DramaturgError> {
    let result: Option<Episode> = db.create("episode").content(data).await?;
    result.ok_or_else(|| DramaturgError::Database("Failed to create episode".into()))
}

/// List a drama's episodes in broadcast order.
pub async fn list_episodes(db: &CanonDb, drama: &RecordId) -> Result<Vec<Episode>, DramaturgError> {
    let mut response = db
        .query("SELECT * FROM episode WHERE drama = $drama ORDER BY number ASC")
        .bind(("drama", drama.clone()))
        .await?;
    let result: Vec<Episode> = response.take(0)?;
    Ok(result)
}

pub async fn update_episode(
    db: &CanonDb,
    id: &RecordId,
    data: EpisodeUpdate,
) -> Result<Episode, DramaturgError> {
    let result: Option<Episode> = db.update(id.clone()).merge(data).await?;
    result.ok_or_else(|| DramaturgError::not_found("episode", id.key().to_string()))
}
