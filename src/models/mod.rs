pub mod character;
pub mod drama;
pub mod episode;
pub mod plot_point;
pub mod scene;
pub mod world;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use character::{name_key, Character, CharacterCreate, CharacterRole, CharacterUpdate};
pub use drama::{Drama, DramaCreate, DramaUpdate};
pub use episode::{Episode, EpisodeCreate, EpisodeUpdate, DEFAULT_EPISODE_STATUS};
pub use plot_point::{PlotPoint, PlotPointCreate, PlotPointType};
pub use scene::{Scene, SceneCreate, SceneUpdate};
pub use world::{WorldCategory, WorldEntry, WorldEntryCreate, WorldEntryUpdate};

/// Kind of canon entity. Also the change-notification category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Drama,
    Character,
    Episode,
    World,
    PlotPoint,
    Scene,
}

impl EntityKind {
    /// Get the database table name for this kind.
    pub fn table_name(&self) -> &'static str {
        match self {
            EntityKind::Drama => "drama",
            EntityKind::Character => "character",
            EntityKind::Episode => "episode",
            EntityKind::World => "world_entry",
            EntityKind::PlotPoint => "plot_point",
            EntityKind::Scene => "scene",
        }
    }

    /// Stable name used in vector metadata and notifications.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Drama => "drama",
            EntityKind::Character => "character",
            EntityKind::Episode => "episode",
            EntityKind::World => "world",
            EntityKind::PlotPoint => "plot_point",
            EntityKind::Scene => "scene",
        }
    }

    pub fn from_table(table: &str) -> Option<EntityKind> {
        Self::all().into_iter().find(|k| k.table_name() == table)
    }

    pub fn parse(name: &str) -> Option<EntityKind> {
        Self::all().into_iter().find(|k| k.as_str() == name)
    }

    pub fn all() -> Vec<EntityKind> {
        vec![
            EntityKind::Drama,
            EntityKind::Character,
            EntityKind::Episode,
            EntityKind::World,
            EntityKind::PlotPoint,
            EntityKind::Scene,
        ]
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any stored canon entity.
///
/// Adding a kind means one new variant here plus one arm in
/// [`CanonEntity::merge_key`] and in `embedding::render::render_entity`.
#[derive(Debug, Clone)]
pub enum CanonEntity {
    Drama(Drama),
    Character(Character),
    Episode(Episode),
    World(WorldEntry),
    PlotPoint(PlotPoint),
    Scene(Scene),
}

impl CanonEntity {
    pub fn kind(&self) -> EntityKind {
        match self {
            CanonEntity::Drama(_) => EntityKind::Drama,
            CanonEntity::Character(_) => EntityKind::Character,
            CanonEntity::Episode(_) => EntityKind::Episode,
            CanonEntity::World(_) => EntityKind::World,
            CanonEntity::PlotPoint(_) => EntityKind::PlotPoint,
            CanonEntity::Scene(_) => EntityKind::Scene,
        }
    }

    /// Full record id, e.g. `character:x7f3k`.
    pub fn entity_id(&self) -> String {
        match self {
            CanonEntity::Drama(d) => d.id.to_string(),
            CanonEntity::Character(c) => c.id.to_string(),
            CanonEntity::Episode(e) => e.id.to_string(),
            CanonEntity::World(w) => w.id.to_string(),
            CanonEntity::PlotPoint(p) => p.id.to_string(),
            CanonEntity::Scene(s) => s.id.to_string(),
        }
    }

    /// Key of the owning drama.
    pub fn project_id(&self) -> String {
        let drama = match self {
            CanonEntity::Drama(d) => &d.id,
            CanonEntity::Character(c) => &c.drama,
            CanonEntity::Episode(e) => &e.drama,
            CanonEntity::World(w) => &w.drama,
            CanonEntity::PlotPoint(p) => &p.drama,
            CanonEntity::Scene(s) => &s.drama,
        };
        drama.key().to_string()
    }

    /// Identity of "the same entity across mentions" within a drama.
    pub fn merge_key(&self) -> String {
        match self {
            CanonEntity::Drama(d) => d.id.key().to_string(),
            CanonEntity::Character(c) => c.name_key.clone(),
            CanonEntity::Episode(e) => e.number.to_string(),
            CanonEntity::World(w) => format!("{}:{}", w.category.as_str(), w.name),
            CanonEntity::PlotPoint(p) => format!("{}:{}", p.point_type.as_str(), p.description),
            CanonEntity::Scene(s) => format!("{}:{}", s.episode_number, s.number),
        }
    }
}
