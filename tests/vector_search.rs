//! Integration tests for project-scoped retrieval and contradiction checks.
//!
//! Uses a keyword-to-vector embedder so distances are exact.

mod common;

use std::sync::Arc;

use common::fixtures::{CountingEmbedding, FailingEmbedding, FixedEmbedding};
use common::TestHarness;
use dramaturg::draft::{CharacterDraft, Draft, EpisodeDraft, WorldDraft};
use dramaturg::embedding::index::CONTEXT_HEADING;
use dramaturg::embedding::{EmbeddingService, NoopEmbeddingService, VectorIndex};
use dramaturg::models::{CharacterRole, Drama, EntityKind, WorldCategory};
use dramaturg::services::{sanitize, CanonSnapshot, NoopChangeSink, SanitizeOptions};
use dramaturg::DramaturgError;
use pretty_assertions::assert_eq;

fn embedder() -> Arc<FixedEmbedding> {
    Arc::new(FixedEmbedding::new(&[
        ("경계", [1.0, 0.8, 0.0, 0.0]),
        ("근접", [1.0, 0.5, 0.0, 0.0]),
        ("김서연", [1.0, 0.0, 0.0, 0.0]),
        ("서울중앙지검", [0.0, 1.0, 0.0, 0.0]),
        ("첫 공판", [0.0, 0.0, 1.0, 0.0]),
    ]))
}

fn canon_draft() -> Draft {
    Draft {
        characters: vec![CharacterDraft {
            name: "김서연".into(),
            role: Some(CharacterRole::Protagonist),
            occupation: Some("검사".into()),
            ..Default::default()
        }],
        episodes: vec![EpisodeDraft {
            number: 1,
            title: "첫 공판".into(),
            synopsis: None,
            status: None,
        }],
        world: vec![WorldDraft {
            category: WorldCategory::Location,
            name: "서울중앙지검".into(),
            description: None,
        }],
        ..Default::default()
    }
}

/// Persist the same canon into a drama and embed everything touched.
async fn seed(
    harness: &TestHarness,
    title: &str,
    embedding: Arc<dyn EmbeddingService + Send + Sync>,
) -> (Drama, Arc<VectorIndex>) {
    let drama = harness.create_drama(title).await;
    let (queue, mut worker, index) = harness.index_queue(embedding);
    let differ = harness
        .differ(Arc::new(NoopChangeSink))
        .with_index_queue(queue);
    let clean = sanitize(
        &canon_draft(),
        &CanonSnapshot::default(),
        SanitizeOptions::default(),
    );
    differ.persist(&drama.project_id(), &clean).await.unwrap();
    worker.drain_pending().await;
    (drama, index)
}

#[tokio::test]
async fn test_search_never_leaks_across_projects() {
    let harness = TestHarness::new().await;
    let (first, index) = seed(&harness, "검사의 밤", embedder()).await;
    let (second, _) = seed(&harness, "변호사의 낮", embedder()).await;

    // One character, one episode and one world entry per project.
    let matches = index.search("김서연", &first.project_id(), 10, None).await;
    assert_eq!(matches.len(), 3);
    assert_eq!(matches[0].entity_type, "character");
    assert_eq!(matches[0].distance, 0.0);

    let first_ids = harness
        .repo
        .list_all(&first.project_id())
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.entity_id())
        .collect::<Vec<_>>();
    assert!(matches.iter().all(|m| first_ids.contains(&m.entity_id)));

    let other = index.search("김서연", &second.project_id(), 10, None).await;
    assert!(other.iter().all(|m| !first_ids.contains(&m.entity_id)));
}

#[tokio::test]
async fn test_search_orders_nearest_first_and_truncates() {
    let harness = TestHarness::new().await;
    let (drama, index) = seed(&harness, "검사의 밤", embedder()).await;

    let matches = index.search("근접", &drama.project_id(), 2, None).await;
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].entity_type, "character");
    assert!(matches[0].distance <= matches[1].distance);
}

#[tokio::test]
async fn test_search_type_allow_list() {
    let harness = TestHarness::new().await;
    let (drama, index) = seed(&harness, "검사의 밤", embedder()).await;

    let matches = index
        .search(
            "김서연",
            &drama.project_id(),
            10,
            Some(&[EntityKind::World, EntityKind::Episode]),
        )
        .await;
    let mut kinds: Vec<&str> = matches.iter().map(|m| m.entity_type.as_str()).collect();
    kinds.sort();
    assert_eq!(kinds, vec!["episode", "world"]);
}

#[tokio::test]
async fn test_contradiction_cutoff_is_strict() {
    let harness = TestHarness::new().await;
    let (drama, index) = seed(&harness, "검사의 밤", embedder()).await;

    let close = index
        .detect_contradiction(EntityKind::Character, "근접한 인물", &drama.project_id())
        .await;
    assert_eq!(close.conflicts.len(), 1);
    assert!(close.conflicts[0].content.contains("김서연"));
    assert!(close.warning.unwrap().contains("김서연"));

    let boundary = index
        .detect_contradiction(EntityKind::Character, "경계의 인물", &drama.project_id())
        .await;
    assert!(boundary.conflicts.is_empty());
    assert!(boundary.warning.is_none());
}

#[tokio::test]
async fn test_contradiction_only_compares_same_kind() {
    let harness = TestHarness::new().await;
    let (drama, index) = seed(&harness, "검사의 밤", embedder()).await;

    // Identical vector to the world entry, but checked as a character.
    let report = index
        .detect_contradiction(EntityKind::Character, "서울중앙지검", &drama.project_id())
        .await;
    assert!(!report.has_conflicts());

    let report = index
        .detect_contradiction(EntityKind::World, "서울중앙지검", &drama.project_id())
        .await;
    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(report.conflicts[0].entity_type, "world");
}

#[tokio::test]
async fn test_build_context_formats_top_matches() {
    let harness = TestHarness::new().await;
    let (drama, index) = seed(&harness, "검사의 밤", embedder()).await;

    let context = index.build_context("김서연", &drama.project_id()).await;
    let mut lines = context.lines();
    assert_eq!(lines.next(), Some(CONTEXT_HEADING));
    assert_eq!(
        lines.next(),
        Some("- Character: 김서연 (protagonist) - 검사, unset. Backstory: unset Arc: unset.")
    );

    assert_eq!(index.build_context("김서연", "no_such_project").await, "");
}

#[tokio::test]
async fn test_remove_drops_the_row() {
    let harness = TestHarness::new().await;
    let (drama, index) = seed(&harness, "검사의 밤", embedder()).await;

    let before = index.search("김서연", &drama.project_id(), 1, None).await;
    index.remove(&before[0].entity_id).await.unwrap();

    let after = index.search("김서연", &drama.project_id(), 10, None).await;
    assert!(after.iter().all(|m| m.entity_id != before[0].entity_id));
}

#[tokio::test]
async fn test_reindex_rewrites_every_entity() {
    let harness = TestHarness::new().await;
    let (drama, index) = seed(&harness, "검사의 밤", embedder()).await;

    let written = index
        .reindex_project(harness.repo.as_ref(), &drama.project_id())
        .await
        .unwrap();
    // Drama plus one character, one episode and one world entry.
    assert_eq!(written, 4);
    assert_eq!(
        index.search("김서연", &drama.project_id(), 10, None).await.len(),
        4
    );
}

#[tokio::test]
async fn test_reindex_embeds_in_one_batch() {
    let harness = TestHarness::new().await;
    let (drama, _) = seed(&harness, "검사의 밤", embedder()).await;

    let counting = Arc::new(CountingEmbedding::new(FixedEmbedding::new(&[(
        "김서연",
        [1.0, 0.0, 0.0, 0.0],
    )])));
    let index = harness.vector_index(counting.clone());
    let written = index
        .reindex_project(harness.repo.as_ref(), &drama.project_id())
        .await
        .unwrap();
    assert_eq!(written, 4);
    assert_eq!(counting.batch_calls(), 1);
    assert_eq!(counting.single_calls(), 0);
}

#[tokio::test]
async fn test_reindex_fails_when_batch_fails() {
    let harness = TestHarness::new().await;
    let (drama, _) = seed(&harness, "검사의 밤", embedder()).await;

    let index = harness.vector_index(Arc::new(FailingEmbedding));
    let err = index
        .reindex_project(harness.repo.as_ref(), &drama.project_id())
        .await
        .unwrap_err();
    assert!(matches!(err, DramaturgError::Embedding(_)));
}

#[tokio::test]
async fn test_disabled_embeddings_degrade_to_empty() {
    let harness = TestHarness::new().await;
    let (drama, index) = seed(
        &harness,
        "검사의 밤",
        Arc::new(NoopEmbeddingService::with_dimensions(4)),
    )
    .await;

    assert!(!index.is_available());
    assert_eq!(index.embed("김서연").await.unwrap(), vec![0.0; 4]);
    assert!(index
        .search("김서연", &drama.project_id(), 5, None)
        .await
        .is_empty());
    assert_eq!(index.build_context("김서연", &drama.project_id()).await, "");
    assert!(!index
        .detect_contradiction(EntityKind::Character, "김서연", &drama.project_id())
        .await
        .has_conflicts());
}

#[tokio::test]
async fn test_failing_embedder_degrades_to_empty() {
    let harness = TestHarness::new().await;
    let (drama, index) = seed(&harness, "검사의 밤", Arc::new(FailingEmbedding)).await;

    assert!(index
        .search("김서연", &drama.project_id(), 5, None)
        .await
        .is_empty());
}
