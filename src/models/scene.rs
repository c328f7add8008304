use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use surrealdb::{Datetime, RecordId};

use crate::db::connection::CanonDb;
use crate::DramaturgError;

/// Scene entity as stored in database.
///
/// Scenes belong to an episode; `number` is unique within that episode.
/// `episode_number` is denormalized so rendering doesn't need a join.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub id: RecordId,
    pub drama: RecordId,
    pub episode: RecordId,
    #[serde(default)]
    pub episode_number: i64,
    pub number: i64,
    pub location: Option<String>,
    pub time_of_day: Option<String>,
    pub description: Option<String>,
    pub dialogue: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub characters_present: Vec<String>,
    pub created_at: Datetime,
    pub updated_at: Datetime,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct SceneCreate {
    pub drama: RecordId,
    pub episode: RecordId,
    pub episode_number: i64,
    pub number: i64,
    pub location: Option<String>,
    pub time_of_day: Option<String>,
    pub description: Option<String>,
    pub dialogue: Option<String>,
    pub notes: Option<String>,
    pub characters_present: Vec<String>,
}

#[skip_serializing_none]
#[derive(Debug, Default, Clone, Serialize)]
pub struct SceneUpdate {
    pub location: Option<String>,
    pub time_of_day: Option<String>,
    pub description: Option<String>,
    pub dialogue: Option<String>,
    pub notes: Option<String>,
    pub characters_present: Option<Vec<String>>,
}

impl SceneUpdate {
    pub fn is_empty(&self) -> bool {
        self.location.is_none()
            && self.time_of_day.is_none()
            && self.description.is_none()
            && self.dialogue.is_none()
            && self.notes.is_none()
            && self.characters_present.is_none()
    }
}

pub async fn create_scene(db: &CanonDb, data: SceneCreate) -> Result<Scene, DramaturgError> {
    let result: Option<Scene> = db.create("scene").content(data).await?;
    result.ok_or_else(|| DramaturgError::Database("Failed to create scene".into()))
}

/// List all scenes of a drama, ordered by episode then scene number.
pub async fn list_scenes(db: &CanonDb, drama: &RecordId) -> Result<Vec<Scene>, DramaturgError> {
    let mut response = db
        .query(
            "SELECT * FROM scene WHERE drama = $drama ORDER BY episode_number ASC, number ASC",
        )
        .bind(("drama", drama.clone()))
        .await?;
    let result: Vec<Scene> = response.take(0)?;
    Ok(result)
}

pub async fn update_scene(
    db: &CanonDb,
    id: &RecordId,
    data: SceneUpdate,
) -> Result<Scene, DramaturgError> {
    let result: Option<Scene> = db.update(id.clone()).merge(data).await?;
    result.ok_or_else(|| DramaturgError::not_found("scene", id.key().to_string()))
}
