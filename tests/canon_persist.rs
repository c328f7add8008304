//! Integration tests for persisting sanitized drafts.
//!
//! Covers idempotence, never-erase merging, plot-point no-ops, scene
//! handling, change notifications and the indexing outbox.

mod common;

use std::sync::Arc;

use common::fixtures::FixedEmbedding;
use common::{RecordingSink, TestHarness};
use dramaturg::draft::{
    CharacterDraft, DramaDraft, Draft, EpisodeDraft, PlotPointDraft, SceneDraft, WorldDraft,
};
use dramaturg::models::{CharacterRole, EntityKind, PlotPointType, WorldCategory};
use dramaturg::services::{
    sanitize, BroadcastChangeSink, CanonSnapshot, CleanDraft, NoopChangeSink, SanitizeOptions,
};
use dramaturg::DramaturgError;
use pretty_assertions::assert_eq;

fn clean(draft: &Draft) -> CleanDraft {
    sanitize(draft, &CanonSnapshot::default(), SanitizeOptions::default())
}

fn clean_with_scenes(draft: &Draft) -> CleanDraft {
    let foundation = CanonSnapshot {
        characters: 2,
        episodes: 1,
        world: 1,
    };
    sanitize(draft, &foundation, SanitizeOptions { allow_scenes: true })
}

fn foundation_draft() -> Draft {
    Draft {
        drama: DramaDraft {
            genre: Some("법정 스릴러".into()),
            ..Default::default()
        },
        characters: vec![
            CharacterDraft {
                name: "김서연".into(),
                role: Some(CharacterRole::Protagonist),
                occupation: Some("검사".into()),
                ..Default::default()
            },
            CharacterDraft {
                name: "박도윤".into(),
                role: Some(CharacterRole::Antagonist),
                ..Default::default()
            },
        ],
        episodes: vec![EpisodeDraft {
            number: 1,
            title: "첫 공판".into(),
            synopsis: Some("서연이 첫 사건을 맡는다".into()),
            status: None,
        }],
        world: vec![WorldDraft {
            category: WorldCategory::Location,
            name: "서울중앙지검".into(),
            description: None,
        }],
        plot_points: vec![PlotPointDraft {
            point_type: PlotPointType::Setup,
            description: "서연의 아버지 사건".into(),
            episode: Some(1),
            resolved: None,
        }],
        scenes: vec![],
    }
}

#[tokio::test]
async fn test_persist_twice_is_idempotent() {
    let harness = TestHarness::new().await;
    let drama = harness.create_drama("검사의 밤").await;
    let differ = harness.differ(Arc::new(NoopChangeSink));
    let draft = clean(&foundation_draft());

    let first = differ.persist(&drama.project_id(), &draft).await.unwrap();
    assert_eq!(first.drama, 1);
    assert_eq!(first.characters, 2);
    assert_eq!(first.episodes, 1);
    assert_eq!(first.world, 1);
    assert_eq!(first.plot_points, 1);
    assert_eq!(first.scenes, 0);

    let second = differ.persist(&drama.project_id(), &draft).await.unwrap();
    assert!(second.is_empty(), "second persist changed {:?}", second);

    let snapshot = harness.repo.snapshot(&drama.id).await.unwrap();
    assert_eq!(
        snapshot,
        CanonSnapshot {
            characters: 2,
            episodes: 1,
            world: 1,
        }
    );
    let stored = harness.repo.require_drama(&drama.project_id()).await.unwrap();
    assert_eq!(stored.genre.as_deref(), Some("법정 스릴러"));
    assert_eq!(stored.title, "검사의 밤");
}

#[tokio::test]
async fn test_absent_fields_never_erase() {
    let harness = TestHarness::new().await;
    let drama = harness.create_drama("검사의 밤").await;
    let differ = harness.differ(Arc::new(NoopChangeSink));
    differ
        .persist(&drama.project_id(), &clean(&foundation_draft()))
        .await
        .unwrap();

    // Same person, different spacing, only a new personality.
    let later = Draft {
        characters: vec![CharacterDraft {
            name: "김 서연".into(),
            personality: Some("냉정하지만 따뜻함".into()),
            occupation: Some("   ".into()),
            ..Default::default()
        }],
        ..Default::default()
    };
    let stats = differ
        .persist(&drama.project_id(), &clean(&later))
        .await
        .unwrap();
    assert_eq!(stats.characters, 1);

    let characters = harness.repo.list_characters(&drama.id).await.unwrap();
    assert_eq!(characters.len(), 2);
    let seoyeon = characters.iter().find(|c| c.name_key == "김서연").unwrap();
    assert_eq!(seoyeon.name, "김서연");
    assert_eq!(seoyeon.role, CharacterRole::Protagonist);
    assert_eq!(seoyeon.occupation.as_deref(), Some("검사"));
    assert_eq!(seoyeon.personality.as_deref(), Some("냉정하지만 따뜻함"));
}

#[tokio::test]
async fn test_new_character_without_role_is_supporting() {
    let harness = TestHarness::new().await;
    let drama = harness.create_drama("검사의 밤").await;
    let differ = harness.differ(Arc::new(NoopChangeSink));
    let draft = Draft {
        characters: vec![CharacterDraft {
            name: "이하늘".into(),
            ..Default::default()
        }],
        ..Default::default()
    };
    differ.persist(&drama.project_id(), &clean(&draft)).await.unwrap();

    let characters = harness.repo.list_characters(&drama.id).await.unwrap();
    assert_eq!(characters[0].role, CharacterRole::Supporting);
}

#[tokio::test]
async fn test_unknown_project_is_not_found() {
    let harness = TestHarness::new().await;
    let differ = harness.differ(Arc::new(NoopChangeSink));

    let err = differ
        .persist("does_not_exist", &clean(&foundation_draft()))
        .await
        .unwrap_err();
    assert!(matches!(err, DramaturgError::NotFound { .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_plot_point_key_hit_is_untouched() {
    let harness = TestHarness::new().await;
    let drama = harness.create_drama("검사의 밤").await;
    let differ = harness.differ(Arc::new(NoopChangeSink));
    differ
        .persist(&drama.project_id(), &clean(&foundation_draft()))
        .await
        .unwrap();

    let again = Draft {
        plot_points: vec![
            PlotPointDraft {
                point_type: PlotPointType::Setup,
                description: "서연의 아버지 사건".into(),
                episode: None,
                resolved: Some(true),
            },
            PlotPointDraft {
                point_type: PlotPointType::Foreshadowing,
                description: "서연의 아버지 사건".into(),
                episode: Some(7),
                resolved: None,
            },
        ],
        ..Default::default()
    };
    let stats = differ
        .persist(&drama.project_id(), &clean(&again))
        .await
        .unwrap();
    assert_eq!(stats.plot_points, 1);

    let episodes = harness.repo.list_episodes(&drama.id).await.unwrap();
    let points = harness.repo.list_plot_points(&drama.id).await.unwrap();
    assert_eq!(points.len(), 2);

    let setup = points
        .iter()
        .find(|p| p.point_type == PlotPointType::Setup)
        .unwrap();
    assert!(!setup.resolved);
    assert_eq!(setup.episode.as_ref(), Some(&episodes[0].id));

    let foreshadowing = points
        .iter()
        .find(|p| p.point_type == PlotPointType::Foreshadowing)
        .unwrap();
    assert_eq!(foreshadowing.episode, None);
}

#[tokio::test]
async fn test_scenes_skip_missing_episode_and_merge() {
    let harness = TestHarness::new().await;
    let drama = harness.create_drama("검사의 밤").await;
    let differ = harness.differ(Arc::new(NoopChangeSink));
    differ
        .persist(&drama.project_id(), &clean(&foundation_draft()))
        .await
        .unwrap();

    let scenes = Draft {
        scenes: vec![
            SceneDraft {
                episode: 1,
                number: 1,
                location: Some("법정".into()),
                time_of_day: Some("밤".into()),
                ..Default::default()
            },
            SceneDraft {
                episode: 9,
                number: 1,
                location: Some("옥상".into()),
                ..Default::default()
            },
        ],
        ..Default::default()
    };
    let stats = differ
        .persist(&drama.project_id(), &clean_with_scenes(&scenes))
        .await
        .unwrap();
    assert_eq!(stats.scenes, 1);

    let follow_up = Draft {
        scenes: vec![SceneDraft {
            episode: 1,
            number: 1,
            dialogue: Some("서연: 이의 있습니다.".into()),
            ..Default::default()
        }],
        ..Default::default()
    };
    let stats = differ
        .persist(&drama.project_id(), &clean_with_scenes(&follow_up))
        .await
        .unwrap();
    assert_eq!(stats.scenes, 1);

    let stored = harness.repo.list_scenes(&drama.id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].episode_number, 1);
    assert_eq!(stored[0].location.as_deref(), Some("법정"));
    assert_eq!(stored[0].dialogue.as_deref(), Some("서연: 이의 있습니다."));
}

#[tokio::test]
async fn test_one_event_per_changed_category() {
    let harness = TestHarness::new().await;
    let drama = harness.create_drama("검사의 밤").await;
    let sink = Arc::new(RecordingSink::default());
    let differ = harness.differ(sink.clone());

    differ
        .persist(&drama.project_id(), &clean(&foundation_draft()))
        .await
        .unwrap();
    assert_eq!(
        sink.categories(),
        vec![
            EntityKind::Drama,
            EntityKind::Character,
            EntityKind::Episode,
            EntityKind::World,
            EntityKind::PlotPoint,
        ]
    );
    assert!(sink
        .events()
        .iter()
        .all(|(project, _)| *project == drama.project_id()));

    differ
        .persist(&drama.project_id(), &clean(&foundation_draft()))
        .await
        .unwrap();
    assert_eq!(sink.events().len(), 5, "no-op persist must not emit");
}

#[tokio::test]
async fn test_broadcast_sink_delivers_to_subscribers() {
    let harness = TestHarness::new().await;
    let drama = harness.create_drama("검사의 밤").await;
    let sink = Arc::new(BroadcastChangeSink::new());
    let mut rx = sink.subscribe();
    let differ = harness.differ(sink.clone());

    let draft = Draft {
        world: vec![WorldDraft {
            category: WorldCategory::Rule,
            name: "야간 재판".into(),
            description: Some("자정 이후에만 열린다".into()),
        }],
        ..Default::default()
    };
    differ.persist(&drama.project_id(), &clean(&draft)).await.unwrap();

    let event = rx.recv().await.unwrap();
    assert_eq!(event.project_id, drama.project_id());
    assert_eq!(event.category, EntityKind::World);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_touched_entities_reach_the_index_queue() {
    let harness = TestHarness::new().await;
    let drama = harness.create_drama("검사의 밤").await;
    let embedding = Arc::new(FixedEmbedding::new(&[("김서연", [1.0, 0.0, 0.0, 0.0])]));
    let (queue, mut worker, index) = harness.index_queue(embedding);
    let differ = harness
        .differ(Arc::new(NoopChangeSink))
        .with_index_queue(queue);

    let stats = differ
        .persist(&drama.project_id(), &clean(&foundation_draft()))
        .await
        .unwrap();
    let processed = worker.drain_pending().await;
    assert_eq!(processed, stats.total());

    let matches = index.search("김서연", &drama.project_id(), 3, None).await;
    assert_eq!(matches[0].entity_type, "character");
    assert!(matches[0].content.starts_with("Character: 김서연 (protagonist) - 검사"));

    // Unchanged entities are not re-queued.
    differ
        .persist(&drama.project_id(), &clean(&foundation_draft()))
        .await
        .unwrap();
    assert_eq!(worker.drain_pending().await, 0);
}
