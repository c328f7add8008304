//! Canonical shape of facts extracted from one conversational turn.
//!
//! A [`Draft`] is what the structured-generation call is constrained to emit.
//! [`parse`] turns model output into a validated draft, or nothing.

use std::sync::LazyLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{CharacterRole, PlotPointType, WorldCategory};
use crate::DramaturgError;

/// A fenced code block: optional info tag, then the body.
static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[ \t]*([A-Za-z0-9_+.-]*)[ \t]*\r?\n?(.*?)```").expect("fence pattern")
});

/// Extracted-but-unmerged canon facts from one turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Draft {
    pub drama: DramaDraft,
    pub characters: Vec<CharacterDraft>,
    pub episodes: Vec<EpisodeDraft>,
    pub world: Vec<WorldDraft>,
    pub plot_points: Vec<PlotPointDraft>,
    pub scenes: Vec<SceneDraft>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DramaDraft {
    pub title: Option<String>,
    pub genre: Option<String>,
    pub tone: Option<String>,
    pub setting: Option<String>,
    pub logline: Option<String>,
    pub total_episodes: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CharacterDraft {
    pub name: String,
    #[serde(default)]
    pub role: Option<CharacterRole>,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub personality: Option<String>,
    #[serde(default)]
    pub backstory: Option<String>,
    #[serde(default)]
    pub arc: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EpisodeDraft {
    pub number: i64,
    pub title: String,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WorldDraft {
    #[serde(default)]
    pub category: WorldCategory,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlotPointDraft {
    #[serde(rename = "type")]
    pub point_type: PlotPointType,
    pub description: String,
    /// Episode number this beat belongs to.
    #[serde(default)]
    pub episode: Option<i64>,
    #[serde(default)]
    pub resolved: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SceneDraft {
    /// Episode number, not an id.
    pub episode: i64,
    pub number: i64,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub time_of_day: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub dialogue: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub characters_present: Option<Vec<String>>,
}

impl Draft {
    pub fn is_empty(&self) -> bool {
        self.drama == DramaDraft::default()
            && self.characters.is_empty()
            && self.episodes.is_empty()
            && self.world.is_empty()
            && self.plot_points.is_empty()
            && self.scenes.is_empty()
    }

    /// Check the constraints serde cannot express: every number is positive.
    pub fn validate(&self) -> Result<(), DramaturgError> {
        fn positive(field: &str, value: i64) -> Result<(), DramaturgError> {
            if value > 0 {
                Ok(())
            } else {
                Err(DramaturgError::Validation(format!(
                    "{} must be positive, got {}",
                    field, value
                )))
            }
        }

        if let Some(total) = self.drama.total_episodes {
            positive("drama.total_episodes", total)?;
        }
        for c in &self.characters {
            if let Some(age) = c.age {
                positive("characters[].age", age)?;
            }
        }
        for e in &self.episodes {
            positive("episodes[].number", e.number)?;
        }
        for p in &self.plot_points {
            if let Some(episode) = p.episode {
                positive("plot_points[].episode", episode)?;
            }
        }
        for s in &self.scenes {
            positive("scenes[].episode", s.episode)?;
            positive("scenes[].number", s.number)?;
        }
        Ok(())
    }
}

/// Parse model output into a validated draft.
///
/// Looks at every fenced block: a `json`-tagged one wins, otherwise the first
/// whose body is an object. Without a qualifying fence the whole text is
/// tried. Explicit `null`s count as absent. Returns `None` on any parse or
/// schema failure; never a partial draft.
pub fn parse(text: &str) -> Option<Draft> {
    let payload = json_payload(text);
    if !payload.starts_with('{') {
        return None;
    }

    let mut value: serde_json::Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(e) => {
            debug!("Draft JSON rejected: {}", e);
            return None;
        }
    };
    strip_nulls(&mut value);

    let draft: Draft = match serde_json::from_value(value) {
        Ok(draft) => draft,
        Err(e) => {
            debug!("Draft JSON rejected: {}", e);
            return None;
        }
    };

    if let Err(e) = draft.validate() {
        debug!("Draft failed validation: {}", e);
        return None;
    }

    Some(draft)
}

fn json_payload(text: &str) -> &str {
    let blocks: Vec<(&str, &str)> = FENCED_BLOCK
        .captures_iter(text)
        .filter_map(|c| Some((c.get(1)?.as_str(), c.get(2)?.as_str().trim())))
        .collect();

    blocks
        .iter()
        .find(|(tag, _)| tag.eq_ignore_ascii_case("json"))
        .or_else(|| blocks.iter().find(|(_, body)| body.starts_with('{')))
        .map(|(_, body)| *body)
        .unwrap_or_else(|| text.trim())
}

/// Drop `null` object members at every depth so serde defaults apply.
fn strip_nulls(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

/// JSON Schema of [`Draft`], for constraining a structured-generation call.
pub fn draft_json_schema() -> serde_json::Value {
    let schema = schemars::schema_for!(Draft);
    serde_json::to_value(&schema).unwrap_or(serde_json::Value::Null)
}
