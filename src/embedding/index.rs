//! Project-scoped retrieval over the vector store.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::embedding::render::render_entity;
use crate::embedding::{EmbeddingService, VectorHit, VectorRow, VectorStore};
use crate::models::{CanonEntity, EntityKind};
use crate::repository::CanonRepository;
use crate::DramaturgError;

/// Heading placed above injected context.
pub const CONTEXT_HEADING: &str = "## Related canon";

/// Retrieval tuning, loaded from the `[retrieval]` table of `canon.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Matches strictly closer than this are reported as possible contradictions.
    pub contradiction_distance: f32,
    /// Number of matches injected by [`VectorIndex::build_context`].
    pub context_limit: usize,
    pub query_cache_ttl_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            contradiction_distance: 0.8,
            context_limit: 5,
            query_cache_ttl_secs: 600,
        }
    }
}

/// A ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorMatch {
    pub entity_id: String,
    pub entity_type: String,
    pub content: String,
    pub distance: f32,
}

/// Advisory result of a contradiction check. Never blocks a write.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContradictionReport {
    pub conflicts: Vec<VectorMatch>,
    pub warning: Option<String>,
}

impl ContradictionReport {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

pub struct VectorIndex {
    embedding: Arc<dyn EmbeddingService + Send + Sync>,
    store: Arc<dyn VectorStore>,
    query_cache: Cache<String, Vec<f32>>,
    config: RetrievalConfig,
}

impl VectorIndex {
    pub fn new(
        embedding: Arc<dyn EmbeddingService + Send + Sync>,
        store: Arc<dyn VectorStore>,
        config: RetrievalConfig,
    ) -> Self {
        let query_cache = Cache::builder()
            .max_capacity(1_000)
            .time_to_live(Duration::from_secs(config.query_cache_ttl_secs))
            .build();
        Self {
            embedding,
            store,
            query_cache,
            config,
        }
    }

    pub fn is_available(&self) -> bool {
        self.embedding.is_available()
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Embed text. Zero vector when embeddings are disabled.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, DramaturgError> {
        if !self.is_available() {
            return Ok(vec![0.0; self.embedding.dimensions()]);
        }
        self.embedding.embed_text(text).await
    }

    /// Render, embed and replace the stored row for `entity`.
    ///
    /// Returns `Ok(false)` when embeddings are disabled and nothing was written.
    pub async fn try_index(&self, entity: &CanonEntity) -> Result<bool, DramaturgError> {
        if !self.is_available() {
            return Ok(false);
        }
        let content = render_entity(entity);
        let embedding = self.embedding.embed_text(&content).await?;
        self.store.upsert(vector_row(entity, content, embedding)).await?;
        Ok(true)
    }

    /// Index an entity, logging instead of propagating failures.
    pub async fn index(&self, entity: &CanonEntity) {
        match self.try_index(entity).await {
            Ok(true) => debug!("Indexed {}", entity.entity_id()),
            Ok(false) => debug!("Embeddings disabled, skipped {}", entity.entity_id()),
            Err(e) => warn!("Failed to index {}: {}", entity.entity_id(), e),
        }
    }

    pub async fn remove(&self, entity_id: &str) -> Result<(), DramaturgError> {
        self.store.delete(entity_id).await
    }

    async fn query_vector(&self, query: &str) -> Result<Vec<f32>, DramaturgError> {
        if let Some(cached) = self.query_cache.get(query).await {
            return Ok(cached);
        }
        let vector = self.embedding.embed_text(query).await?;
        self.query_cache
            .insert(query.to_string(), vector.clone())
            .await;
        Ok(vector)
    }

    /// Nearest canon within one project, nearest first.
    ///
    /// Empty when embeddings are disabled or any step fails.
    pub async fn search(
        &self,
        query: &str,
        project_id: &str,
        limit: usize,
        types: Option<&[EntityKind]>,
    ) -> Vec<VectorMatch> {
        if limit == 0 || !self.is_available() {
            return Vec::new();
        }
        let vector = match self.query_vector(query).await {
            Ok(v) => v,
            Err(e) => {
                warn!("Query embedding failed, returning no matches: {}", e);
                return Vec::new();
            }
        };
        let fetch = limit.saturating_mul(2).max(limit);
        match self.store.nearest(&vector, fetch).await {
            Ok(hits) => filter_hits(hits, project_id, types, limit),
            Err(e) => {
                warn!("Vector lookup failed, returning no matches: {}", e);
                Vec::new()
            }
        }
    }

    /// Top matches formatted for prompt injection; empty string if none.
    pub async fn build_context(&self, query: &str, project_id: &str) -> String {
        let matches = self
            .search(query, project_id, self.config.context_limit, None)
            .await;
        format_context(&matches)
    }

    /// Same-kind canon close enough to the new content to deserve a second look.
    pub async fn detect_contradiction(
        &self,
        entity_type: EntityKind,
        content: &str,
        project_id: &str,
    ) -> ContradictionReport {
        let matches = self
            .search(
                content,
                project_id,
                self.config.context_limit,
                Some(&[entity_type]),
            )
            .await;
        contradiction_report(matches, self.config.contradiction_distance)
    }

    /// Re-render and re-embed every entity of a drama in one batch.
    /// Returns how many rows were written.
    ///
    /// A failed or short batch fails the reindex before any row is written.
    pub async fn reindex_project(
        &self,
        repo: &dyn CanonRepository,
        project_id: &str,
    ) -> Result<usize, DramaturgError> {
        let entities = repo.list_all(project_id).await?;
        if !self.is_available() {
            warn!("Embeddings disabled, nothing reindexed for {}", project_id);
            return Ok(0);
        }
        if entities.is_empty() {
            return Ok(0);
        }

        let contents: Vec<String> = entities.iter().map(render_entity).collect();
        let vectors = self.embedding.embed_batch(&contents).await?;
        if vectors.len() != entities.len() {
            return Err(DramaturgError::Embedding(format!(
                "Expected {} embeddings, got {}",
                entities.len(),
                vectors.len()
            )));
        }

        let mut written = 0;
        for ((entity, content), embedding) in entities.iter().zip(contents).zip(vectors) {
            match self.store.upsert(vector_row(entity, content, embedding)).await {
                Ok(()) => written += 1,
                Err(e) => warn!("Failed to reindex {}: {}", entity.entity_id(), e),
            }
        }
        info!(
            "Reindexed {}/{} entities for {}",
            written,
            entities.len(),
            project_id
        );
        Ok(written)
    }
}

fn vector_row(entity: &CanonEntity, content: String, embedding: Vec<f32>) -> VectorRow {
    VectorRow {
        entity_id: entity.entity_id(),
        entity_type: entity.kind().as_str().to_string(),
        project_id: entity.project_id(),
        content,
        embedding,
    }
}

/// Scope raw neighbours to one project and an optional kind allow-list.
pub fn filter_hits(
    hits: Vec<VectorHit>,
    project_id: &str,
    types: Option<&[EntityKind]>,
    limit: usize,
) -> Vec<VectorMatch> {
    hits.into_iter()
        .filter(|hit| hit.project_id == project_id)
        .filter(|hit| match types {
            Some(kinds) => kinds.iter().any(|k| k.as_str() == hit.entity_type),
            None => true,
        })
        .take(limit)
        .map(|hit| VectorMatch {
            entity_id: hit.entity_id,
            entity_type: hit.entity_type,
            content: hit.content,
            distance: hit.distance,
        })
        .collect()
}

pub fn format_context(matches: &[VectorMatch]) -> String {
    if matches.is_empty() {
        return String::new();
    }
    let mut out = String::from(CONTEXT_HEADING);
    out.push('\n');
    for m in matches {
        out.push_str("- ");
        out.push_str(&m.content);
        out.push('\n');
    }
    out
}

pub fn contradiction_report(matches: Vec<VectorMatch>, threshold: f32) -> ContradictionReport {
    let conflicts: Vec<VectorMatch> = matches
        .into_iter()
        .filter(|m| m.distance < threshold)
        .collect();
    if conflicts.is_empty() {
        return ContradictionReport::default();
    }
    let mut warning = format!(
        "Possible contradiction with {} existing {} entr{}:",
        conflicts.len(),
        conflicts[0].entity_type,
        if conflicts.len() == 1 { "y" } else { "ies" }
    );
    for c in &conflicts {
        warning.push_str(&format!("\n- {} (distance {:.3})", c.content, c.distance));
    }
    ContradictionReport {
        conflicts,
        warning: Some(warning),
    }
}
