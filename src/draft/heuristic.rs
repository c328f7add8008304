//! Regex fallback extraction for turns where no structured output exists.
//!
//! Deliberately narrow: only labeled sections and explicit episode headings
//! are recognized. Anything ambiguous is left out; the structured path is the
//! one expected to carry recall.

use std::sync::LazyLock;

use regex::Regex;

use crate::draft::schema::{
    CharacterDraft, Draft, EpisodeDraft, PlotPointDraft, WorldDraft,
};
use crate::models::{CharacterRole, PlotPointType, WorldCategory};

static CHARACTER_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[\s*\-#]*(?:등장\s*인물|주요\s*인물|인물|캐릭터|characters?|cast)\s*[:：]\s*(.+)$")
        .expect("character section pattern")
});

/// `이름 (힌트)`; the hint is optional.
static CHARACTER_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([^()（）]+?)\s*(?:[(（]\s*([^)）]*?)\s*[)）])?\s*$").expect("character item pattern")
});

/// `1화: 제목`, `제1화 - 제목`
static EPISODE_KO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[\s*\-#]*제?\s*(\d{1,3})\s*화\s*[:：\-–—]\s*(.+)$").expect("episode pattern")
});

/// `Episode 1: Title`, `Ep. 1 - Title`
static EPISODE_EN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[\s*\-#]*(?:episode|ep\.?)\s*(\d{1,3})\s*[:：\-–—]\s*(.+)$")
        .expect("episode pattern")
});

static SYNOPSIS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[\s*\-#]*(?:줄거리|시놉시스|synopsis|summary)\s*[:：]\s*(.+)$")
        .expect("synopsis pattern")
});

static WORLD_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[\s*\-#]*(?:세계관|배경|world(?:building)?)\s*[:：]\s*(.+)$")
        .expect("world section pattern")
});

/// A count only counts with a series cue: `16부작`, `총 12화`,
/// `10-episode season`, `a total of 8 episodes`, `12 episodes in total`.
static TOTAL_EPISODES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)(?:총|전)\s*(\d{1,3})\s*(?:화|회|부작)",
        r"|(\d{1,3})\s*부작",
        r"|\b(\d{1,3})[\s-]*episodes?[\s-]+(?:series|season|drama|show|run)\b",
        r"|\btotal\s+(?:of\s+)?(\d{1,3})\s+episodes?\b",
        r"|\b(\d{1,3})\s+episodes?\s+in\s+total\b",
    ))
    .expect("total episodes pattern")
});

const PROTAGONIST_HINTS: &[&str] = &["주인공", "protagonist", "main", "lead", "hero"];
const ANTAGONIST_HINTS: &[&str] = &["악역", "빌런", "적대", "antagonist", "villain"];
const SUPPORTING_HINTS: &[&str] = &["조연", "supporting", "side", "sidekick"];

/// Best-effort extraction over free-form prose. Never fails; empty when unsure.
pub fn extract(text: &str) -> Draft {
    let mut draft = Draft {
        characters: extract_characters(text),
        ..Default::default()
    };

    if let Some(episode) = extract_episode(text) {
        if let Some(synopsis) = &episode.synopsis {
            draft.plot_points.push(PlotPointDraft {
                point_type: PlotPointType::Setup,
                description: synopsis.clone(),
                episode: Some(episode.number),
                resolved: None,
            });
        }
        draft.episodes.push(episode);
    }

    if let Some(world) = extract_world(text) {
        draft.world.push(world);
    }

    draft.drama.total_episodes = extract_total_episodes(text);
    draft
}

fn extract_characters(text: &str) -> Vec<CharacterDraft> {
    let Some(section) = CHARACTER_SECTION.captures(text).and_then(|c| c.get(1)) else {
        return Vec::new();
    };

    section
        .as_str()
        .split([',', '/', '、', '，'])
        .filter_map(|item| {
            let caps = CHARACTER_ITEM.captures(item)?;
            let name = clean(caps.get(1)?.as_str());
            if name.is_empty() {
                return None;
            }
            let role = caps.get(2).and_then(|hint| role_from_hint(hint.as_str()));
            Some(CharacterDraft {
                name,
                role,
                ..Default::default()
            })
        })
        .collect()
}

fn role_from_hint(hint: &str) -> Option<CharacterRole> {
    let hint = hint.to_lowercase();
    let hit = |keys: &[&str]| keys.iter().any(|k| hint.contains(k));
    if hit(ANTAGONIST_HINTS) {
        Some(CharacterRole::Antagonist)
    } else if hit(PROTAGONIST_HINTS) {
        Some(CharacterRole::Protagonist)
    } else if hit(SUPPORTING_HINTS) {
        Some(CharacterRole::Supporting)
    } else {
        None
    }
}

fn extract_episode(text: &str) -> Option<EpisodeDraft> {
    let caps = EPISODE_KO
        .captures(text)
        .or_else(|| EPISODE_EN.captures(text))?;
    let number: i64 = caps.get(1)?.as_str().parse().ok()?;
    if number <= 0 {
        return None;
    }
    let title = clean(caps.get(2)?.as_str());
    if title.is_empty() {
        return None;
    }
    let synopsis = SYNOPSIS
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| clean(m.as_str()))
        .filter(|s| !s.is_empty());

    Some(EpisodeDraft {
        number,
        title,
        synopsis,
        status: None,
    })
}

fn extract_world(text: &str) -> Option<WorldDraft> {
    let raw = clean(WORLD_SECTION.captures(text)?.get(1)?.as_str());
    let (name, description) = match raw.split_once(" - ") {
        Some((name, desc)) => (clean(name), Some(clean(desc)).filter(|d| !d.is_empty())),
        None => (raw, None),
    };
    if name.is_empty() {
        return None;
    }
    Some(WorldDraft {
        category: WorldCategory::Location,
        name,
        description,
    })
}

fn extract_total_episodes(text: &str) -> Option<i64> {
    let caps = TOTAL_EPISODES.captures(text)?;
    let digits = (1..=5).find_map(|i| caps.get(i))?;
    digits.as_str().parse().ok().filter(|n: &i64| *n > 0)
}

/// Trim whitespace, markdown emphasis and wrapping quotes.
fn clean(s: &str) -> String {
    s.trim()
        .trim_matches(|c: char| matches!(c, '*' | '"' | '\'' | '「' | '」' | '『' | '』' | '“' | '”'))
        .trim()
        .to_string()
}
