//! Test harness for database lifecycle management.
//!
//! Provides isolated database instances per test using tempfile.

use std::sync::Arc;
use tempfile::TempDir;

use dramaturg::db::connection::{init_db, CanonDb, DbConfig};
use dramaturg::db::schema::apply_schema;
use dramaturg::embedding::{
    EmbeddingService, IndexQueue, IndexWorker, RetrievalConfig, SurrealVectorStore, VectorIndex,
};
use dramaturg::models::{Drama, DramaCreate};
use dramaturg::repository::{CanonRepository, SurrealCanonRepository};
use dramaturg::services::{CanonDiffer, CanonLearner, ChangeSink, NoopChangeSink};

/// Test harness that manages database lifecycle.
///
/// Each TestHarness creates an isolated database in a temporary directory.
/// The database is automatically cleaned up when the harness is dropped.
pub struct TestHarness {
    pub db: Arc<CanonDb>,
    pub repo: Arc<dyn CanonRepository>,
    /// Kept alive while the harness exists
    pub temp_dir: TempDir,
}

impl TestHarness {
    /// Panics if database initialization fails (appropriate for tests).
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory for test database");

        let db_path = temp_dir.path().join("test.db");
        let config = DbConfig::Embedded {
            path: Some(db_path.to_string_lossy().into_owned()),
        };
        let db = init_db(&config, temp_dir.path())
            .await
            .expect("Failed to initialize test database");

        apply_schema(&db)
            .await
            .expect("Failed to apply schema to test database");

        let db = Arc::new(db);
        let repo: Arc<dyn CanonRepository> = Arc::new(SurrealCanonRepository::new(db.clone()));
        Self { db, repo, temp_dir }
    }

    pub async fn create_drama(&self, title: &str) -> Drama {
        self.repo
            .create_drama(DramaCreate {
                title: title.to_string(),
                genre: None,
                tone: None,
                setting: None,
                logline: None,
                total_episodes: None,
            })
            .await
            .expect("Failed to create drama")
    }

    pub fn differ(&self, sink: Arc<dyn ChangeSink>) -> CanonDiffer {
        CanonDiffer::new(self.repo.clone(), sink)
    }

    pub fn learner(&self) -> CanonLearner {
        CanonLearner::new(self.repo.clone(), self.differ(Arc::new(NoopChangeSink)))
    }

    pub fn vector_index(
        &self,
        embedding: Arc<dyn EmbeddingService + Send + Sync>,
    ) -> Arc<VectorIndex> {
        Arc::new(VectorIndex::new(
            embedding,
            Arc::new(SurrealVectorStore::new(self.db.clone())),
            RetrievalConfig::default(),
        ))
    }

    /// Index queue plus its worker, for draining by hand.
    pub fn index_queue(
        &self,
        embedding: Arc<dyn EmbeddingService + Send + Sync>,
    ) -> (IndexQueue, IndexWorker, Arc<VectorIndex>) {
        let index = self.vector_index(embedding);
        let (queue, worker) = IndexQueue::new(index.clone());
        (queue, worker, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_harness_creates_database() {
        let harness = TestHarness::new().await;
        let drama = harness.create_drama("검사의 밤").await;
        assert!(harness
            .repo
            .get_drama(&drama.project_id())
            .await
            .unwrap()
            .is_some());
    }
}
