use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::connection::CanonDb;
use crate::DramaturgError;

/// One stored vector plus the metadata needed to scope and display it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRow {
    pub entity_id: String,
    pub entity_type: String,
    pub project_id: String,
    pub content: String,
    pub embedding: Vec<f32>,
}

/// A nearest-neighbour candidate. Smaller distance is closer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorHit {
    pub entity_id: String,
    pub entity_type: String,
    pub project_id: String,
    pub content: String,
    pub distance: f32,
}

/// Vector storage seam: wholesale replace, delete, and k-NN by vector.
///
/// `nearest` is deliberately unscoped; callers filter by project afterwards.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Replace any prior row for `row.entity_id` with this one.
    async fn upsert(&self, row: VectorRow) -> Result<(), DramaturgError>;

    async fn delete(&self, entity_id: &str) -> Result<(), DramaturgError>;

    /// Up to `k` rows ordered nearest-first by L2 distance.
    async fn nearest(&self, vector: &[f32], k: usize) -> Result<Vec<VectorHit>, DramaturgError>;
}

/// SurrealDB-backed vector store over the `canon_vector` table.
///
/// Brute-force distance scan; canon for a drama is small enough that an
/// HNSW index buys nothing.
pub struct SurrealVectorStore {
    db: Arc<CanonDb>,
}

impl SurrealVectorStore {
    pub fn new(db: Arc<CanonDb>) -> Self {
        Self { db }
    }
}

#[derive(Serialize)]
struct VectorContent {
    entity_id: String,
    entity_type: String,
    project_id: String,
    content: String,
    embedding: Vec<f32>,
}

#[async_trait]
impl VectorStore for SurrealVectorStore {
    async fn upsert(&self, row: VectorRow) -> Result<(), DramaturgError> {
        let key = row.entity_id.clone();
        let content = VectorContent {
            entity_id: row.entity_id,
            entity_type: row.entity_type,
            project_id: row.project_id,
            content: row.content,
            embedding: row.embedding,
        };
        self.db
            .query("DELETE type::thing('canon_vector', $key)")
            .query("CREATE type::thing('canon_vector', $key) CONTENT $content")
            .bind(("key", key))
            .bind(("content", content))
            .await?
            .check()?;
        Ok(())
    }

    async fn delete(&self, entity_id: &str) -> Result<(), DramaturgError> {
        self.db
            .query("DELETE type::thing('canon_vector', $key)")
            .bind(("key", entity_id.to_string()))
            .await?
            .check()?;
        Ok(())
    }

    async fn nearest(&self, vector: &[f32], k: usize) -> Result<Vec<VectorHit>, DramaturgError> {
        if k == 0 || vector.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            r#"SELECT entity_id, entity_type, project_id, content,
                      vector::distance::euclidean(embedding, $vector) AS distance
               FROM canon_vector
               WHERE array::len(embedding) = $dims
               ORDER BY distance ASC
               LIMIT {k}"#,
            k = k
        );
        let mut response = self
            .db
            .query(&query)
            .bind(("vector", vector.to_vec()))
            .bind(("dims", vector.len()))
            .await?;
        let hits: Vec<VectorHit> = response.take(0)?;
        Ok(hits)
    }
}
