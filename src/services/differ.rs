//! Persist a sanitized draft against stored canon.
//!
//! Per category: load current rows keyed by merge key, create what is
//! missing, and write an update only when some field actually changes.
//! Incoming values overwrite; absent values never erase.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use surrealdb::RecordId;
use tracing::{debug, info};

use crate::embedding::IndexQueue;
use crate::models::{
    name_key, CanonEntity, Character, CharacterCreate, CharacterUpdate, DramaUpdate,
    EntityKind, Episode, EpisodeCreate, EpisodeUpdate, PlotPointCreate, PlotPointType, Scene,
    SceneCreate, SceneUpdate, WorldCategory, WorldEntry, WorldEntryCreate, WorldEntryUpdate,
    DEFAULT_EPISODE_STATUS,
};
use crate::repository::CanonRepository;
use crate::services::notify::ChangeSink;
use crate::services::sanitize::CleanDraft;
use crate::DramaturgError;

/// Entities touched (created or updated) per category by one `persist` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeStats {
    /// 1 when the drama's own fields changed.
    pub drama: usize,
    pub characters: usize,
    pub episodes: usize,
    pub world: usize,
    pub plot_points: usize,
    pub scenes: usize,
}

impl ChangeStats {
    pub fn total(&self) -> usize {
        self.drama + self.characters + self.episodes + self.world + self.plot_points + self.scenes
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Short human-readable summary, e.g. `learned: 2 characters, 1 episode`.
    pub fn describe(&self) -> String {
        let parts: Vec<String> = [
            (self.drama, "drama", "drama"),
            (self.characters, "character", "characters"),
            (self.episodes, "episode", "episodes"),
            (self.world, "world entry", "world entries"),
            (self.plot_points, "plot point", "plot points"),
            (self.scenes, "scene", "scenes"),
        ]
        .into_iter()
        .filter(|(n, _, _)| *n > 0)
        .map(|(n, one, many)| format!("{} {}", n, if n == 1 { one } else { many }))
        .collect();

        if parts.is_empty() {
            return "nothing new".to_string();
        }
        format!("learned: {}", parts.join(", "))
    }
}

/// `Some(incoming)` only when it is present and differs from what is stored.
fn changed<T: PartialEq + Clone>(incoming: &Option<T>, existing: &Option<T>) -> Option<T> {
    match incoming {
        Some(value) if existing.as_ref() != Some(value) => Some(value.clone()),
        _ => None,
    }
}

fn changed_required<T: PartialEq + Clone>(incoming: &Option<T>, existing: &T) -> Option<T> {
    match incoming {
        Some(value) if value != existing => Some(value.clone()),
        _ => None,
    }
}

pub struct CanonDiffer {
    repo: Arc<dyn CanonRepository>,
    sink: Arc<dyn ChangeSink>,
    index_queue: Option<IndexQueue>,
}

impl CanonDiffer {
    pub fn new(repo: Arc<dyn CanonRepository>, sink: Arc<dyn ChangeSink>) -> Self {
        Self {
            repo,
            sink,
            index_queue: None,
        }
    }

    /// Hand every touched entity to the indexing outbox.
    pub fn with_index_queue(mut self, queue: IndexQueue) -> Self {
        self.index_queue = Some(queue);
        self
    }

    fn touched(&self, entity: CanonEntity) {
        if let Some(queue) = &self.index_queue {
            queue.upsert(entity);
        }
    }

    /// Write `draft` into drama `project_id`.
    ///
    /// Not transactional across the draft: a failure part-way leaves the
    /// earlier categories written.
    pub async fn persist(
        &self,
        project_id: &str,
        draft: &CleanDraft,
    ) -> Result<ChangeStats, DramaturgError> {
        let drama = self.repo.require_drama(project_id).await?;
        let drama_id = drama.id.clone();
        let mut stats = ChangeStats::default();

        // Drama fields first.
        let incoming = draft.drama();
        let update = DramaUpdate {
            title: changed_required(&incoming.title, &drama.title),
            genre: changed(&incoming.genre, &drama.genre),
            tone: changed(&incoming.tone, &drama.tone),
            setting: changed(&incoming.setting, &drama.setting),
            logline: changed(&incoming.logline, &drama.logline),
            total_episodes: changed(&incoming.total_episodes, &drama.total_episodes),
        };
        if !update.is_empty() {
            let updated = self.repo.update_drama(&drama_id, update).await?;
            debug!("Updated drama {}", project_id);
            stats.drama = 1;
            self.touched(CanonEntity::Drama(updated));
        }

        stats.characters = self.persist_characters(&drama_id, draft).await?;
        let (episodes, episode_count) = self.persist_episodes(&drama_id, draft).await?;
        stats.episodes = episode_count;
        stats.world = self.persist_world(&drama_id, draft).await?;
        stats.plot_points = self.persist_plot_points(&drama_id, draft, &episodes).await?;
        stats.scenes = self.persist_scenes(&drama_id, draft, &episodes).await?;

        for (count, kind) in [
            (stats.drama, EntityKind::Drama),
            (stats.characters, EntityKind::Character),
            (stats.episodes, EntityKind::Episode),
            (stats.world, EntityKind::World),
            (stats.plot_points, EntityKind::PlotPoint),
            (stats.scenes, EntityKind::Scene),
        ] {
            if count > 0 {
                self.sink.emit(project_id, kind);
            }
        }

        if !stats.is_empty() {
            info!("Drama {}: {}", project_id, stats.describe());
        }
        Ok(stats)
    }

    async fn persist_characters(
        &self,
        drama_id: &RecordId,
        draft: &CleanDraft,
    ) -> Result<usize, DramaturgError> {
        if draft.characters().is_empty() {
            return Ok(0);
        }
        let mut by_key: HashMap<String, Character> = self
            .repo
            .list_characters(drama_id)
            .await?
            .into_iter()
            .map(|c| (c.name_key.clone(), c))
            .collect();

        let mut touched = 0;
        for incoming in draft.characters() {
            let key = name_key(&incoming.name);
            let written = match by_key.get(&key) {
                Some(existing) => {
                    let update = CharacterUpdate {
                        name: None,
                        role: changed_required(&incoming.role, &existing.role),
                        age: changed(&incoming.age, &existing.age),
                        occupation: changed(&incoming.occupation, &existing.occupation),
                        personality: changed(&incoming.personality, &existing.personality),
                        backstory: changed(&incoming.backstory, &existing.backstory),
                        arc: changed(&incoming.arc, &existing.arc),
                    };
                    if update.is_empty() {
                        debug!("Character {} unchanged", existing.name);
                        continue;
                    }
                    self.repo.update_character(&existing.id, update).await?
                }
                None => {
                    self.repo
                        .create_character(CharacterCreate {
                            drama: drama_id.clone(),
                            name: incoming.name.clone(),
                            name_key: key.clone(),
                            role: incoming.role.unwrap_or_default(),
                            age: incoming.age,
                            occupation: incoming.occupation.clone(),
                            personality: incoming.personality.clone(),
                            backstory: incoming.backstory.clone(),
                            arc: incoming.arc.clone(),
                        })
                        .await?
                }
            };
            touched += 1;
            self.touched(CanonEntity::Character(written.clone()));
            by_key.insert(key, written);
        }
        Ok(touched)
    }

    /// Returns the post-write episode map so later categories can link by number.
    async fn persist_episodes(
        &self,
        drama_id: &RecordId,
        draft: &CleanDraft,
    ) -> Result<(HashMap<i64, Episode>, usize), DramaturgError> {
        let mut by_number: HashMap<i64, Episode> = self
            .repo
            .list_episodes(drama_id)
            .await?
            .into_iter()
            .map(|e| (e.number, e))
            .collect();

        let mut touched = 0;
        for incoming in draft.episodes() {
            let written = match by_number.get(&incoming.number) {
                Some(existing) => {
                    let update = EpisodeUpdate {
                        title: changed_required(&Some(incoming.title.clone()), &existing.title),
                        synopsis: changed(&incoming.synopsis, &existing.synopsis),
                        status: changed_required(&incoming.status, &existing.status),
                    };
                    if update.is_empty() {
                        continue;
                    }
                    self.repo.update_episode(&existing.id, update).await?
                }
                None => {
                    self.repo
                        .create_episode(EpisodeCreate {
                            drama: drama_id.clone(),
                            number: incoming.number,
                            title: incoming.title.clone(),
                            synopsis: incoming.synopsis.clone(),
                            status: incoming
                                .status
                                .clone()
                                .unwrap_or_else(|| DEFAULT_EPISODE_STATUS.to_string()),
                        })
                        .await?
                }
            };
            touched += 1;
            self.touched(CanonEntity::Episode(written.clone()));
            by_number.insert(incoming.number, written);
        }
        Ok((by_number, touched))
    }

    async fn persist_world(
        &self,
        drama_id: &RecordId,
        draft: &CleanDraft,
    ) -> Result<usize, DramaturgError> {
        if draft.world().is_empty() {
            return Ok(0);
        }
        let mut by_key: HashMap<(WorldCategory, String), WorldEntry> = self
            .repo
            .list_world(drama_id)
            .await?
            .into_iter()
            .map(|w| ((w.category, w.name.clone()), w))
            .collect();

        let mut touched = 0;
        for incoming in draft.world() {
            let key = (incoming.category, incoming.name.clone());
            let written = match by_key.get(&key) {
                Some(existing) => {
                    let Some(description) =
                        changed(&incoming.description, &existing.description)
                    else {
                        continue;
                    };
                    self.repo
                        .update_world_entry(
                            &existing.id,
                            WorldEntryUpdate {
                                description: Some(description),
                            },
                        )
                        .await?
                }
                None => {
                    self.repo
                        .create_world_entry(WorldEntryCreate {
                            drama: drama_id.clone(),
                            category: incoming.category,
                            name: incoming.name.clone(),
                            description: incoming.description.clone(),
                        })
                        .await?
                }
            };
            touched += 1;
            self.touched(CanonEntity::World(written.clone()));
            by_key.insert(key, written);
        }
        Ok(touched)
    }

    /// Create-only: an exact `(type, description)` hit is left untouched.
    async fn persist_plot_points(
        &self,
        drama_id: &RecordId,
        draft: &CleanDraft,
        episodes: &HashMap<i64, Episode>,
    ) -> Result<usize, DramaturgError> {
        if draft.plot_points().is_empty() {
            return Ok(0);
        }
        let mut known: Vec<(PlotPointType, String)> = self
            .repo
            .list_plot_points(drama_id)
            .await?
            .into_iter()
            .map(|p| (p.point_type, p.description))
            .collect();

        let mut touched = 0;
        for incoming in draft.plot_points() {
            if known
                .iter()
                .any(|(t, d)| *t == incoming.point_type && *d == incoming.description)
            {
                continue;
            }
            let episode = incoming
                .episode
                .and_then(|n| episodes.get(&n))
                .map(|e| e.id.clone());
            let created = self
                .repo
                .create_plot_point(PlotPointCreate {
                    drama: drama_id.clone(),
                    point_type: incoming.point_type,
                    description: incoming.description.clone(),
                    episode,
                    resolved: incoming.resolved.unwrap_or(false),
                })
                .await?;
            touched += 1;
            known.push((incoming.point_type, incoming.description.clone()));
            self.touched(CanonEntity::PlotPoint(created));
        }
        Ok(touched)
    }

    async fn persist_scenes(
        &self,
        drama_id: &RecordId,
        draft: &CleanDraft,
        episodes: &HashMap<i64, Episode>,
    ) -> Result<usize, DramaturgError> {
        if draft.scenes().is_empty() {
            return Ok(0);
        }
        let mut by_key: HashMap<(i64, i64), Scene> = self
            .repo
            .list_scenes(drama_id)
            .await?
            .into_iter()
            .map(|s| ((s.episode_number, s.number), s))
            .collect();

        let mut touched = 0;
        for incoming in draft.scenes() {
            let Some(episode) = episodes.get(&incoming.episode) else {
                debug!(
                    "Skipping scene S#{}: episode {} does not exist",
                    incoming.number, incoming.episode
                );
                continue;
            };
            let key = (incoming.episode, incoming.number);
            let written = match by_key.get(&key) {
                Some(existing) => {
                    let update = SceneUpdate {
                        location: changed(&incoming.location, &existing.location),
                        time_of_day: changed(&incoming.time_of_day, &existing.time_of_day),
                        description: changed(&incoming.description, &existing.description),
                        dialogue: changed(&incoming.dialogue, &existing.dialogue),
                        notes: changed(&incoming.notes, &existing.notes),
                        characters_present: changed_required(
                            &incoming.characters_present,
                            &existing.characters_present,
                        ),
                    };
                    if update.is_empty() {
                        continue;
                    }
                    self.repo.update_scene(&existing.id, update).await?
                }
                None => {
                    self.repo
                        .create_scene(SceneCreate {
                            drama: drama_id.clone(),
                            episode: episode.id.clone(),
                            episode_number: incoming.episode,
                            number: incoming.number,
                            location: incoming.location.clone(),
                            time_of_day: incoming.time_of_day.clone(),
                            description: incoming.description.clone(),
                            dialogue: incoming.dialogue.clone(),
                            notes: incoming.notes.clone(),
                            characters_present: incoming
                                .characters_present
                                .clone()
                                .unwrap_or_default(),
                        })
                        .await?
                }
            };
            touched += 1;
            self.touched(CanonEntity::Scene(written.clone()));
            by_key.insert(key, written);
        }
        Ok(touched)
    }
}
