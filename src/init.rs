//! Shared initialization for the CLI and embedding hosts.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::config::{load_canon_config, CanonConfig};
use crate::db::{apply_schema, init_db, load_db_config, CanonDb};
use crate::embedding::{
    create_embedding_service, load_provider_config, EmbeddingService, IndexQueue,
    SurrealVectorStore, VectorIndex,
};
use crate::repository::{CanonRepository, SurrealCanonRepository};
use crate::services::{
    AnthropicSummarizer, BroadcastChangeSink, CanonDiffer, CanonLearner, ContextCompactor,
    Summarizer,
};

/// Data path priority: explicit path > DRAMATURG_DATA_PATH env > ./.dramaturg (if exists) > ~/.dramaturg
pub fn resolve_data_path(explicit_path: Option<PathBuf>) -> PathBuf {
    explicit_path
        .or_else(|| std::env::var("DRAMATURG_DATA_PATH").ok().map(PathBuf::from))
        .or_else(|| {
            let local_path = Path::new(".dramaturg");
            if local_path.is_dir() {
                Some(local_path.to_path_buf())
            } else {
                None
            }
        })
        .unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".dramaturg"))
                .unwrap_or_else(|| PathBuf::from(".dramaturg"))
        })
}

/// Application context holding the wired-up canon services.
pub struct AppContext {
    pub db: Arc<CanonDb>,
    pub data_path: PathBuf,
    pub config: CanonConfig,
    pub repo: Arc<dyn CanonRepository>,
    pub embedding_service: Arc<dyn EmbeddingService + Send + Sync>,
    pub vector_index: Arc<VectorIndex>,
    pub index_queue: IndexQueue,
    pub change_sink: Arc<BroadcastChangeSink>,
    pub learner: CanonLearner,
    pub compactor: ContextCompactor,
    pub summarizer: Option<Arc<dyn Summarizer>>,
    index_worker: JoinHandle<()>,
}

impl AppContext {
    pub async fn new(explicit_path: Option<PathBuf>) -> Result<Self> {
        let data_path = resolve_data_path(explicit_path);
        tracing::info!("Using data path: {}", data_path.display());
        std::fs::create_dir_all(&data_path)?;

        let config = load_canon_config(&data_path);

        let db_config = load_db_config(&data_path);
        let db = init_db(&db_config, &data_path).await?;
        tracing::info!("Database connected");

        apply_schema(&db).await?;
        tracing::info!("Schema applied");

        let db = Arc::new(db);

        let provider = load_provider_config(&data_path);
        let embedding_service = create_embedding_service(&provider)?;
        if embedding_service.is_available() {
            tracing::info!(
                "Embeddings enabled ({} dimensions)",
                embedding_service.dimensions()
            );
        } else {
            tracing::warn!("Embeddings not available; search and contradiction checks are off");
        }

        let repo: Arc<dyn CanonRepository> = Arc::new(SurrealCanonRepository::new(db.clone()));
        let vector_index = Arc::new(VectorIndex::new(
            embedding_service.clone(),
            Arc::new(SurrealVectorStore::new(db.clone())),
            config.retrieval.clone(),
        ));
        let (index_queue, worker) = IndexQueue::new(vector_index.clone());
        let index_worker = worker.spawn();

        let change_sink = Arc::new(BroadcastChangeSink::new());
        let differ = CanonDiffer::new(repo.clone(), change_sink.clone())
            .with_index_queue(index_queue.clone());
        let learner = CanonLearner::new(repo.clone(), differ);

        let compactor = ContextCompactor::new(config.compaction.clone());
        let summarizer: Option<Arc<dyn Summarizer>> = match AnthropicSummarizer::from_env(
            &config.summarizer.api_key_env,
            &config.summarizer.model,
        )? {
            Some(s) => Some(Arc::new(s)),
            None => {
                tracing::debug!(
                    "{} not set; compaction unavailable",
                    config.summarizer.api_key_env
                );
                None
            }
        };

        Ok(Self {
            db,
            data_path,
            config,
            repo,
            embedding_service,
            vector_index,
            index_queue,
            change_sink,
            learner,
            compactor,
            summarizer,
            index_worker,
        })
    }

    /// Close the index outbox and wait until queued jobs are embedded.
    pub async fn shutdown(self) {
        let AppContext {
            learner,
            index_queue,
            index_worker,
            ..
        } = self;
        drop(learner);
        drop(index_queue);
        if let Err(e) = index_worker.await {
            tracing::warn!("Index worker ended abnormally: {}", e);
        }
    }
}
