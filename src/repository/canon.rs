use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use surrealdb::RecordId;

use crate::db::connection::CanonDb;
use crate::models::{
    CanonEntity, Character, CharacterCreate, CharacterUpdate, Drama, DramaCreate, DramaUpdate,
    Episode, EpisodeCreate, EpisodeUpdate, PlotPoint, PlotPointCreate, Scene, SceneCreate,
    SceneUpdate, WorldEntry, WorldEntryCreate, WorldEntryUpdate,
};
use crate::services::sanitize::CanonSnapshot;
use crate::DramaturgError;

/// Repository trait for canon CRUD, scoped by drama.
///
/// Covers: Drama, Character, Episode, WorldEntry, PlotPoint, Scene.
/// There is no delete: the canon pipeline only creates and updates.
#[async_trait]
pub trait CanonRepository: Send + Sync {
    // Drama operations
    async fn get_drama(&self, id: &str) -> Result<Option<Drama>, DramaturgError>;
    async fn list_dramas(&self) -> Result<Vec<Drama>, DramaturgError>;
    async fn create_drama(&self, data: DramaCreate) -> Result<Drama, DramaturgError>;
    async fn update_drama(&self, id: &RecordId, data: DramaUpdate)
        -> Result<Drama, DramaturgError>;

    // Character operations
    async fn list_characters(&self, drama: &RecordId) -> Result<Vec<Character>, DramaturgError>;
    async fn create_character(&self, data: CharacterCreate) -> Result<Character, DramaturgError>;
    async fn update_character(
        &self,
        id: &RecordId,
        data: CharacterUpdate,
    ) -> Result<Character, DramaturgError>;

    // Episode operations
    async fn list_episodes(&self, drama: &RecordId) -> Result<Vec<Episode>, DramaturgError>;
    async fn create_episode(&self, data: EpisodeCreate) -> Result<Episode, DramaturgError>;
    async fn update_episode(
        &self,
        id: &RecordId,
        data: EpisodeUpdate,
    ) -> Result<Episode, DramaturgError>;

    // World operations
    async fn list_world(&self, drama: &RecordId) -> Result<Vec<WorldEntry>, DramaturgError>;
    async fn create_world_entry(
        &self,
        data: WorldEntryCreate,
    ) -> Result<WorldEntry, DramaturgError>;
    async fn update_world_entry(
        &self,
        id: &RecordId,
        data: WorldEntryUpdate,
    ) -> Result<WorldEntry, DramaturgError>;

    // Plot point operations (create-only)
    async fn list_plot_points(&self, drama: &RecordId) -> Result<Vec<PlotPoint>, DramaturgError>;
    async fn create_plot_point(&self, data: PlotPointCreate)
        -> Result<PlotPoint, DramaturgError>;

    // Scene operations
    async fn list_scenes(&self, drama: &RecordId) -> Result<Vec<Scene>, DramaturgError>;
    async fn create_scene(&self, data: SceneCreate) -> Result<Scene, DramaturgError>;
    async fn update_scene(&self, id: &RecordId, data: SceneUpdate)
        -> Result<Scene, DramaturgError>;

    /// Counts used for foundation gating.
    async fn snapshot(&self, drama: &RecordId) -> Result<CanonSnapshot, DramaturgError>;

    /// Get a drama, failing with `NotFound` if absent.
    async fn require_drama(&self, id: &str) -> Result<Drama, DramaturgError> {
        self.get_drama(id)
            .await?
            .ok_or_else(|| DramaturgError::not_found("drama", id))
    }

    /// Every entity of a drama, the drama itself first.
    async fn list_all(&self, project_id: &str) -> Result<Vec<CanonEntity>, DramaturgError> {
        let drama = self.require_drama(project_id).await?;
        let drama_id = drama.id.clone();
        let mut all = vec![CanonEntity::Drama(drama)];
        all.extend(
            self.list_characters(&drama_id)
                .await?
                .into_iter()
                .map(CanonEntity::Character),
        );
        all.extend(
            self.list_episodes(&drama_id)
                .await?
                .into_iter()
                .map(CanonEntity::Episode),
        );
        all.extend(
            self.list_world(&drama_id)
                .await?
                .into_iter()
                .map(CanonEntity::World),
        );
        all.extend(
            self.list_plot_points(&drama_id)
                .await?
                .into_iter()
                .map(CanonEntity::PlotPoint),
        );
        all.extend(
            self.list_scenes(&drama_id)
                .await?
                .into_iter()
                .map(CanonEntity::Scene),
        );
        Ok(all)
    }
}

/// SurrealDB implementation of CanonRepository.
///
/// Wraps the database connection and delegates to model functions.
pub struct SurrealCanonRepository {
    db: Arc<CanonDb>,
}

impl SurrealCanonRepository {
    pub fn new(db: Arc<CanonDb>) -> Self {
        Self { db }
    }
}

#[derive(Deserialize)]
struct CountRow {
    n: usize,
}

fn first_count(rows: Vec<CountRow>) -> usize {
    rows.first().map(|r| r.n).unwrap_or(0)
}

#[async_trait]
impl CanonRepository for SurrealCanonRepository {
    async fn get_drama(&self, id: &str) -> Result<Option<Drama>, DramaturgError> {
        crate::models::drama::get_drama(&self.db, id).await
    }

    async fn list_dramas(&self) -> Result<Vec<Drama>, DramaturgError> {
        crate::models::drama::list_dramas(&self.db).await
    }

    async fn create_drama(&self, data: DramaCreate) -> Result<Drama, DramaturgError> {
        crate::models::drama::create_drama(&self.db, data).await
    }

    async fn update_drama(
        &self,
        id: &RecordId,
        data: DramaUpdate,
    ) -> Result<Drama, DramaturgError> {
        crate::models::drama::update_drama(&self.db, id, data).await
    }

    async fn list_characters(&self, drama: &RecordId) -> Result<Vec<Character>, DramaturgError> {
        crate::models::character::list_characters(&self.db, drama).await
    }

    async fn create_character(&self, data: CharacterCreate) -> Result<Character, DramaturgError> {
        crate::models::character::create_character(&self.db, data).await
    }

    async fn update_character(
        &self,
        id: &RecordId,
        data: CharacterUpdate,
    ) -> Result<Character, DramaturgError> {
        crate::models::character::update_character(&self.db, id, data).await
    }

    async fn list_episodes(&self, drama: &RecordId) -> Result<Vec<Episode>, DramaturgError> {
        crate::models::episode::list_episodes(&self.db, drama).await
    }

    async fn create_episode(&self, data: EpisodeCreate) -> Result<Episode, DramaturgError> {
        crate::models::episode::create_episode(&self.db, data).await
    }

    async fn update_episode(
        &self,
        id: &RecordId,
        data: EpisodeUpdate,
    ) -> Result<Episode, DramaturgError> {
        crate::models::episode::update_episode(&self.db, id, data).await
    }

    async fn list_world(&self, drama: &RecordId) -> Result<Vec<WorldEntry>, DramaturgError> {
        crate::models::world::list_world_entries(&self.db, drama).await
    }

    async fn create_world_entry(
        &self,
        data: WorldEntryCreate,
    ) -> Result<WorldEntry, DramaturgError> {
        crate::models::world::create_world_entry(&self.db, data).await
    }

    async fn update_world_entry(
        &self,
        id: &RecordId,
        data: WorldEntryUpdate,
    ) -> Result<WorldEntry, DramaturgError> {
        crate::models::world::update_world_entry(&self.db, id, data).await
    }

    async fn list_plot_points(&self, drama: &RecordId) -> Result<Vec<PlotPoint>, DramaturgError> {
        crate::models::plot_point::list_plot_points(&self.db, drama).await
    }

    async fn create_plot_point(
        &self,
        data: PlotPointCreate,
    ) -> Result<PlotPoint, DramaturgError> {
        crate::models::plot_point::create_plot_point(&self.db, data).await
    }

    async fn list_scenes(&self, drama: &RecordId) -> Result<Vec<Scene>, DramaturgError> {
        crate::models::scene::list_scenes(&self.db, drama).await
    }

    async fn create_scene(&self, data: SceneCreate) -> Result<Scene, DramaturgError> {
        crate::models::scene::create_scene(&self.db, data).await
    }

    async fn update_scene(
        &self,
        id: &RecordId,
        data: SceneUpdate,
    ) -> Result<Scene, DramaturgError> {
        crate::models::scene::update_scene(&self.db, id, data).await
    }

    async fn snapshot(&self, drama: &RecordId) -> Result<CanonSnapshot, DramaturgError> {
        let mut response = self
            .db
            .query("SELECT count() AS n FROM character WHERE drama = $drama GROUP ALL")
            .query("SELECT count() AS n FROM episode WHERE drama = $drama GROUP ALL")
            .query("SELECT count() AS n FROM world_entry WHERE drama = $drama GROUP ALL")
            .bind(("drama", drama.clone()))
            .await?;
        let characters: Vec<CountRow> = response.take(0)?;
        let episodes: Vec<CountRow> = response.take(1)?;
        let world: Vec<CountRow> = response.take(2)?;
        Ok(CanonSnapshot {
            characters: first_count(characters),
            episodes: first_count(episodes),
            world: first_count(world),
        })
    }
}
