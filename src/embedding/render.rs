//! Canonical text for each entity kind.
//!
//! The same text is embedded and shown back to the model as context, so the
//! templates are fixed. Missing optional fields render as [`UNSET`].

use crate::models::{CanonEntity, Character, Drama, Episode, PlotPoint, Scene, WorldEntry};

pub const UNSET: &str = "unset";

fn or_unset(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(UNSET)
}

pub fn render_entity(entity: &CanonEntity) -> String {
    match entity {
        CanonEntity::Drama(d) => drama_text(d),
        CanonEntity::Character(c) => character_text(c),
        CanonEntity::Episode(e) => episode_text(e),
        CanonEntity::World(w) => world_text(w),
        CanonEntity::PlotPoint(p) => plot_point_text(p),
        CanonEntity::Scene(s) => scene_text(s),
    }
}

pub fn drama_text(drama: &Drama) -> String {
    format!(
        "Drama: {}. Genre: {}. Tone: {}. Setting: {}. Logline: {}.",
        drama.title,
        or_unset(&drama.genre),
        or_unset(&drama.tone),
        or_unset(&drama.setting),
        or_unset(&drama.logline),
    )
}

pub fn character_text(character: &Character) -> String {
    format!(
        "Character: {} ({}) - {}, {}. Backstory: {} Arc: {}.",
        character.name,
        character.role.as_str(),
        or_unset(&character.occupation),
        or_unset(&character.personality),
        or_unset(&character.backstory),
        or_unset(&character.arc),
    )
}

pub fn episode_text(episode: &Episode) -> String {
    format!(
        "Episode {}: {} - {}",
        episode.number,
        episode.title,
        or_unset(&episode.synopsis)
    )
}

pub fn scene_text(scene: &Scene) -> String {
    format!(
        "Scene S#{} ({}, {}) - {}",
        scene.number,
        or_unset(&scene.time_of_day),
        or_unset(&scene.location),
        or_unset(&scene.description),
    )
}

pub fn world_text(entry: &WorldEntry) -> String {
    format!(
        "World [{}]: {} - {}",
        entry.category.as_str(),
        entry.name,
        or_unset(&entry.description)
    )
}

pub fn plot_point_text(point: &PlotPoint) -> String {
    format!("Plot [{}]: {}", point.point_type.as_str(), point.description)
}
