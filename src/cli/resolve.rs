//! Project and kind resolution for CLI arguments.

use anyhow::Result;

use crate::models::{Drama, EntityKind};
use crate::repository::CanonRepository;

/// Strip a `drama:` prefix, returning the bare project key.
/// e.g. "drama:x7f3k" -> "x7f3k", "x7f3k" -> "x7f3k"
pub fn project_key(input: &str) -> &str {
    let key = input.strip_prefix("drama:").unwrap_or(input);
    key.strip_prefix('⟨')
        .and_then(|k| k.strip_suffix('⟩'))
        .unwrap_or(key)
}

/// Parse a kind name, accepting plurals and the table name for world entries.
pub fn parse_kind(input: &str) -> Option<EntityKind> {
    let lower = input.trim().to_lowercase();
    let singular = match lower.as_str() {
        "dramas" => "drama",
        "characters" => "character",
        "episodes" => "episode",
        "world_entry" | "world_entries" => "world",
        "plot" | "plots" | "plot_points" | "plot-point" | "plotpoint" => "plot_point",
        "scenes" => "scene",
        other => other,
    };
    EntityKind::parse(singular)
}

pub fn parse_kinds(inputs: &[String]) -> Result<Vec<EntityKind>> {
    inputs
        .iter()
        .map(|s| {
            parse_kind(s).ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown type '{}'. Valid types: drama, character, episode, world, plot_point, scene",
                    s
                )
            })
        })
        .collect()
}

/// Resolve a project argument by id, falling back to a case-insensitive title match.
pub async fn resolve_project(repo: &dyn CanonRepository, input: &str) -> Result<Drama> {
    if let Some(drama) = repo.get_drama(project_key(input)).await? {
        return Ok(drama);
    }

    let wanted = input.trim().to_lowercase();
    let mut matches: Vec<Drama> = repo
        .list_dramas()
        .await?
        .into_iter()
        .filter(|d| d.title.to_lowercase() == wanted)
        .collect();

    match matches.len() {
        0 => anyhow::bail!("No drama with id or title '{}'", input),
        1 => Ok(matches.remove(0)),
        n => anyhow::bail!(
            "'{}' matches {} dramas by title; use the project id instead",
            input,
            n
        ),
    }
}
