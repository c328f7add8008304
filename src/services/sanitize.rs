//! Business rules applied to a draft before anything is written.
//!
//! Pure functions only: no database, no embedding, no clock. The differ
//! accepts nothing but a [`CleanDraft`], so every write has passed through
//! [`sanitize`].

use serde::{Deserialize, Serialize};

use crate::draft::{
    CharacterDraft, DramaDraft, Draft, EpisodeDraft, PlotPointDraft, SceneDraft, WorldDraft,
};
use crate::models::name_key;

/// Minimum canon before scene detail may persist.
pub const FOUNDATION_MIN_CHARACTERS: usize = 2;
pub const FOUNDATION_MIN_EPISODES: usize = 1;
pub const FOUNDATION_MIN_WORLD: usize = 1;

/// Markers of explicit scene-construction intent in the user's own words.
/// Korean markers match anywhere; English ones only as whole words.
const SCENE_INTENT_MARKERS_KO: &[&str] = &["장면", "씬", "시퀀스", "대사", "콘티", "s#"];
const SCENE_INTENT_WORDS_EN: &[&str] = &[
    "scene", "scenes", "sequence", "sequences", "dialogue", "dialogues",
];

/// Words that contain a Korean marker without meaning one.
const SCENE_INTENT_FALSE_FRIENDS: &[&str] = &["대사관"];

/// Counts of what a drama already has on record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonSnapshot {
    pub characters: usize,
    pub episodes: usize,
    pub world: usize,
}

impl CanonSnapshot {
    /// Macro canon is in place: ≥2 characters, ≥1 episode, ≥1 world entry.
    pub fn has_foundation(&self) -> bool {
        self.characters >= FOUNDATION_MIN_CHARACTERS
            && self.episodes >= FOUNDATION_MIN_EPISODES
            && self.world >= FOUNDATION_MIN_WORLD
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SanitizeOptions {
    /// Set from [`scene_intent`] on the user's text for this turn.
    pub allow_scenes: bool,
}

/// A normalized, deduplicated, policy-filtered draft.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanDraft {
    draft: Draft,
}

impl CleanDraft {
    pub fn drama(&self) -> &DramaDraft {
        &self.draft.drama
    }

    pub fn characters(&self) -> &[CharacterDraft] {
        &self.draft.characters
    }

    pub fn episodes(&self) -> &[EpisodeDraft] {
        &self.draft.episodes
    }

    pub fn world(&self) -> &[WorldDraft] {
        &self.draft.world
    }

    pub fn plot_points(&self) -> &[PlotPointDraft] {
        &self.draft.plot_points
    }

    pub fn scenes(&self) -> &[SceneDraft] {
        &self.draft.scenes
    }

    pub fn is_empty(&self) -> bool {
        self.draft.is_empty()
    }

    pub fn into_inner(self) -> Draft {
        self.draft
    }
}

/// Did the user ask to build scenes in this turn?
pub fn scene_intent(user_text: &str) -> bool {
    let mut text = user_text.to_lowercase();
    for word in SCENE_INTENT_FALSE_FRIENDS {
        text = text.replace(word, " ");
    }
    SCENE_INTENT_MARKERS_KO.iter().any(|m| text.contains(m))
        || SCENE_INTENT_WORDS_EN
            .iter()
            .any(|w| contains_ascii_word(&text, w))
}

/// `word` occurs with no ASCII letter or digit directly on either side.
/// Hangul particles may follow (`scene을`).
fn contains_ascii_word(text: &str, word: &str) -> bool {
    text.match_indices(word).any(|(at, found)| {
        let before = text[..at].chars().next_back();
        let after = text[at + found.len()..].chars().next();
        !before.is_some_and(|c| c.is_ascii_alphanumeric())
            && !after.is_some_and(|c| c.is_ascii_alphanumeric())
    })
}

/// Apply foundation gating, scene-intent gating and name-dedup merge.
pub fn sanitize(draft: &Draft, snapshot: &CanonSnapshot, options: SanitizeOptions) -> CleanDraft {
    let scenes = if snapshot.has_foundation() && options.allow_scenes {
        merge_scenes(&draft.scenes)
    } else {
        Vec::new()
    };

    CleanDraft {
        draft: Draft {
            drama: clean_drama(&draft.drama),
            characters: merge_characters(&draft.characters),
            episodes: merge_episodes(&draft.episodes),
            world: merge_world(&draft.world),
            plot_points: dedup_plot_points(&draft.plot_points),
            scenes,
        },
    }
}

/// Trim; empty becomes unset.
fn opt(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Later non-empty value wins; empty never overrides.
fn overlay<T: Clone>(current: &mut Option<T>, incoming: Option<T>) {
    if incoming.is_some() {
        *current = incoming;
    }
}

fn clean_drama(drama: &DramaDraft) -> DramaDraft {
    DramaDraft {
        title: opt(&drama.title),
        genre: opt(&drama.genre),
        tone: opt(&drama.tone),
        setting: opt(&drama.setting),
        logline: opt(&drama.logline),
        total_episodes: drama.total_episodes.filter(|n| *n > 0),
    }
}

fn merge_characters(items: &[CharacterDraft]) -> Vec<CharacterDraft> {
    let mut merged: Vec<CharacterDraft> = Vec::new();
    for item in items {
        let name = item.name.trim();
        if name.is_empty() {
            continue;
        }
        let key = name_key(name);
        let incoming = CharacterDraft {
            name: name.to_string(),
            role: item.role,
            age: item.age.filter(|a| *a > 0),
            occupation: opt(&item.occupation),
            personality: opt(&item.personality),
            backstory: opt(&item.backstory),
            arc: opt(&item.arc),
        };
        match merged.iter_mut().find(|c| name_key(&c.name) == key) {
            Some(existing) => {
                existing.name = incoming.name;
                overlay(&mut existing.role, incoming.role);
                overlay(&mut existing.age, incoming.age);
                overlay(&mut existing.occupation, incoming.occupation);
                overlay(&mut existing.personality, incoming.personality);
                overlay(&mut existing.backstory, incoming.backstory);
                overlay(&mut existing.arc, incoming.arc);
            }
            None => merged.push(incoming),
        }
    }
    merged
}

fn merge_episodes(items: &[EpisodeDraft]) -> Vec<EpisodeDraft> {
    let mut merged: Vec<EpisodeDraft> = Vec::new();
    for item in items {
        let title = item.title.trim();
        if item.number <= 0 || title.is_empty() {
            continue;
        }
        let incoming = EpisodeDraft {
            number: item.number,
            title: title.to_string(),
            synopsis: opt(&item.synopsis),
            status: opt(&item.status),
        };
        match merged.iter_mut().find(|e| e.number == incoming.number) {
            Some(existing) => {
                existing.title = incoming.title;
                overlay(&mut existing.synopsis, incoming.synopsis);
                overlay(&mut existing.status, incoming.status);
            }
            None => merged.push(incoming),
        }
    }
    merged
}

fn merge_world(items: &[WorldDraft]) -> Vec<WorldDraft> {
    let mut merged: Vec<WorldDraft> = Vec::new();
    for item in items {
        let name = item.name.trim();
        if name.is_empty() {
            continue;
        }
        let incoming = WorldDraft {
            category: item.category,
            name: name.to_string(),
            description: opt(&item.description),
        };
        match merged
            .iter_mut()
            .find(|w| w.category == incoming.category && w.name == incoming.name)
        {
            Some(existing) => overlay(&mut existing.description, incoming.description),
            None => merged.push(incoming),
        }
    }
    merged
}

/// Exact `(type, description)` dedup; the first mention is kept as-is.
fn dedup_plot_points(items: &[PlotPointDraft]) -> Vec<PlotPointDraft> {
    let mut kept: Vec<PlotPointDraft> = Vec::new();
    for item in items {
        let description = item.description.trim();
        if description.is_empty() {
            continue;
        }
        if kept
            .iter()
            .any(|p| p.point_type == item.point_type && p.description == description)
        {
            continue;
        }
        kept.push(PlotPointDraft {
            point_type: item.point_type,
            description: description.to_string(),
            episode: item.episode.filter(|n| *n > 0),
            resolved: item.resolved,
        });
    }
    kept
}

fn merge_scenes(items: &[SceneDraft]) -> Vec<SceneDraft> {
    let mut merged: Vec<SceneDraft> = Vec::new();
    for item in items {
        if item.number <= 0 || item.episode <= 0 {
            continue;
        }
        let present = item.characters_present.as_ref().map(|names| {
            let mut seen = Vec::<String>::new();
            for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
                if !seen.iter().any(|s| name_key(s) == name_key(name)) {
                    seen.push(name.to_string());
                }
            }
            seen
        });
        let incoming = SceneDraft {
            episode: item.episode,
            number: item.number,
            location: opt(&item.location),
            time_of_day: opt(&item.time_of_day),
            description: opt(&item.description),
            dialogue: opt(&item.dialogue),
            notes: opt(&item.notes),
            characters_present: present.filter(|p| !p.is_empty()),
        };
        match merged
            .iter_mut()
            .find(|s| s.episode == incoming.episode && s.number == incoming.number)
        {
            Some(existing) => {
                overlay(&mut existing.location, incoming.location);
                overlay(&mut existing.time_of_day, incoming.time_of_day);
                overlay(&mut existing.description, incoming.description);
                overlay(&mut existing.dialogue, incoming.dialogue);
                overlay(&mut existing.notes, incoming.notes);
                overlay(&mut existing.characters_present, incoming.characters_present);
            }
            None => merged.push(incoming),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CharacterRole, PlotPointType, WorldCategory};
    use pretty_assertions::assert_eq;

    fn character(name: &str) -> CharacterDraft {
        CharacterDraft {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn draft_with_scene() -> Draft {
        Draft {
            scenes: vec![SceneDraft {
                episode: 1,
                number: 1,
                location: Some("법정".into()),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    const FOUNDATION: CanonSnapshot = CanonSnapshot {
        characters: 2,
        episodes: 1,
        world: 1,
    };

    #[test]
    fn test_same_name_merges_into_one_record() {
        let draft = Draft {
            characters: vec![
                CharacterDraft {
                    name: "김서연".into(),
                    role: Some(CharacterRole::Protagonist),
                    ..Default::default()
                },
                CharacterDraft {
                    name: "김서연".into(),
                    occupation: Some("검사".into()),
                    personality: Some("냉정하지만 따뜻함".into()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let clean = sanitize(&draft, &CanonSnapshot::default(), SanitizeOptions::default());

        assert_eq!(
            clean.characters(),
            &[CharacterDraft {
                name: "김서연".into(),
                role: Some(CharacterRole::Protagonist),
                occupation: Some("검사".into()),
                personality: Some("냉정하지만 따뜻함".into()),
                ..Default::default()
            }]
        );
    }

    #[test]
    fn test_empty_fields_never_override() {
        let draft = Draft {
            characters: vec![
                CharacterDraft {
                    name: "Alice".into(),
                    occupation: Some("judge".into()),
                    ..Default::default()
                },
                CharacterDraft {
                    name: " alice ".into(),
                    occupation: Some("   ".into()),
                    arc: Some("learns to trust".into()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let clean = sanitize(&draft, &CanonSnapshot::default(), SanitizeOptions::default());
        assert_eq!(clean.characters().len(), 1);
        assert_eq!(clean.characters()[0].occupation.as_deref(), Some("judge"));
        assert_eq!(clean.characters()[0].arc.as_deref(), Some("learns to trust"));
    }

    #[test]
    fn test_empty_names_dropped() {
        let draft = Draft {
            characters: vec![character(""), character("  "), character("Bob")],
            ..Default::default()
        };
        let clean = sanitize(&draft, &CanonSnapshot::default(), SanitizeOptions::default());
        assert_eq!(clean.characters().len(), 1);
    }

    #[test]
    fn test_episode_world_plot_filters() {
        let draft = Draft {
            episodes: vec![
                EpisodeDraft {
                    number: 1,
                    title: "  ".into(),
                    ..Default::default()
                },
                EpisodeDraft {
                    number: 2,
                    title: " 반격 ".into(),
                    synopsis: Some("".into()),
                    ..Default::default()
                },
            ],
            world: vec![
                WorldDraft {
                    category: WorldCategory::Rule,
                    name: "".into(),
                    description: Some("x".into()),
                },
                WorldDraft {
                    category: WorldCategory::Culture,
                    name: "검찰 문화".into(),
                    description: None,
                },
            ],
            plot_points: vec![
                PlotPointDraft {
                    point_type: PlotPointType::Twist,
                    description: " ".into(),
                    episode: None,
                    resolved: None,
                },
                PlotPointDraft {
                    point_type: PlotPointType::Twist,
                    description: "도윤은 서연의 오빠".into(),
                    episode: Some(2),
                    resolved: None,
                },
                PlotPointDraft {
                    point_type: PlotPointType::Twist,
                    description: "도윤은 서연의 오빠".into(),
                    episode: None,
                    resolved: None,
                },
            ],
            ..Default::default()
        };

        let clean = sanitize(&draft, &CanonSnapshot::default(), SanitizeOptions::default());
        assert_eq!(clean.episodes().len(), 1);
        assert_eq!(clean.episodes()[0].title, "반격");
        assert_eq!(clean.episodes()[0].synopsis, None);
        assert_eq!(clean.world().len(), 1);
        assert_eq!(clean.plot_points().len(), 1);
        assert_eq!(clean.plot_points()[0].episode, Some(2));
    }

    #[test]
    fn test_scenes_gated_without_foundation() {
        let clean = sanitize(
            &draft_with_scene(),
            &CanonSnapshot::default(),
            SanitizeOptions { allow_scenes: true },
        );
        assert!(clean.scenes().is_empty());
    }

    #[test]
    fn test_scenes_pass_with_foundation_and_intent() {
        let clean = sanitize(
            &draft_with_scene(),
            &FOUNDATION,
            SanitizeOptions { allow_scenes: true },
        );
        assert_eq!(clean.scenes().len(), 1);
        assert_eq!(clean.scenes()[0].location.as_deref(), Some("법정"));
    }

    #[test]
    fn test_scenes_gated_without_intent() {
        let clean = sanitize(
            &draft_with_scene(),
            &FOUNDATION,
            SanitizeOptions {
                allow_scenes: false,
            },
        );
        assert!(clean.scenes().is_empty());
    }

    #[test]
    fn test_foundation_needs_every_minimum() {
        assert!(FOUNDATION.has_foundation());
        for snapshot in [
            CanonSnapshot { characters: 1, ..FOUNDATION },
            CanonSnapshot { episodes: 0, ..FOUNDATION },
            CanonSnapshot { world: 0, ..FOUNDATION },
        ] {
            assert!(!snapshot.has_foundation(), "{:?}", snapshot);
        }
    }

    #[test]
    fn test_scene_presence_list_normalized() {
        let draft = Draft {
            scenes: vec![SceneDraft {
                episode: 1,
                number: 4,
                characters_present: Some(vec![
                    " 김서연".into(),
                    "김 서연".into(),
                    "".into(),
                    "박도윤".into(),
                ]),
                ..Default::default()
            }],
            ..Default::default()
        };
        let clean = sanitize(&draft, &FOUNDATION, SanitizeOptions { allow_scenes: true });
        assert_eq!(
            clean.scenes()[0].characters_present,
            Some(vec!["김서연".to_string(), "박도윤".to_string()])
        );
    }

    #[test]
    fn test_scene_intent() {
        assert!(scene_intent("1화 장면을 상세하게 짜자"));
        assert!(scene_intent("Let's write the courtroom SCENE"));
        assert!(scene_intent("S#3 대사 좀 다듬어줘"));
        assert!(!scene_intent("세계관 먼저 잡자"));
        assert!(!scene_intent("주인공 성격을 바꾸고 싶어"));
    }

    #[test]
    fn test_scene_intent_ignores_embedded_words() {
        assert!(!scene_intent("주인공은 주한 대사관 직원이야"));
        assert!(!scene_intent("That joke is borderline obscene"));
        assert!(!scene_intent("a sequencer in the lab"));
        assert!(scene_intent("대사관 앞 장면을 써줘"));
        assert!(scene_intent("대사관에서 나누는 대사를 다듬자"));
        assert!(scene_intent("opening scene을 써줘"));
        assert!(scene_intent("two scenes, please"));
    }

    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_character() -> impl Strategy<Value = CharacterDraft> {
            (
                "[ a-cA-C]{0,4}",
                proptest::option::of("[a-z ]{0,6}"),
            )
                .prop_map(|(name, occupation)| CharacterDraft {
                    name,
                    occupation,
                    ..Default::default()
                })
        }

        proptest! {
            #[test]
            fn prop_characters_unique_and_named(chars in proptest::collection::vec(arb_character(), 0..12)) {
                let draft = Draft { characters: chars, ..Default::default() };
                let clean = sanitize(&draft, &CanonSnapshot::default(), SanitizeOptions::default());
                let mut keys: Vec<String> = clean.characters().iter().map(|c| name_key(&c.name)).collect();
                prop_assert!(clean.characters().iter().all(|c| !c.name.trim().is_empty()));
                prop_assert!(clean.characters().iter().all(|c| c.occupation.as_deref() != Some("")));
                let before = keys.len();
                keys.sort();
                keys.dedup();
                prop_assert_eq!(before, keys.len());
            }

            #[test]
            fn prop_no_scenes_without_foundation(
                characters in 0usize..2,
                episodes in 0usize..3,
                world in 0usize..3,
                allow in any::<bool>(),
            ) {
                let snapshot = CanonSnapshot { characters, episodes, world };
                let clean = sanitize(&draft_with_scene(), &snapshot, SanitizeOptions { allow_scenes: allow });
                prop_assert!(clean.scenes().is_empty());
            }
        }
    }
}
