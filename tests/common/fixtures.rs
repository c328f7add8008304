//! Deterministic embedders, sinks and turn texts.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use dramaturg::embedding::EmbeddingService;
use dramaturg::models::EntityKind;
use dramaturg::services::ChangeSink;
use dramaturg::DramaturgError;

pub const DIMS: usize = 4;

/// Maps text to a vector by the first keyword it contains.
///
/// Lets tests place entities at exact distances from a query.
pub struct FixedEmbedding {
    table: Vec<(String, Vec<f32>)>,
    fallback: Vec<f32>,
}

impl FixedEmbedding {
    pub fn new(entries: &[(&str, [f32; DIMS])]) -> Self {
        Self {
            table: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_vec()))
                .collect(),
            fallback: vec![0.0, 0.0, 0.0, 10.0],
        }
    }
}

#[async_trait]
impl EmbeddingService for FixedEmbedding {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, DramaturgError> {
        Ok(self
            .table
            .iter()
            .find(|(key, _)| text.contains(key.as_str()))
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| self.fallback.clone()))
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// [`FixedEmbedding`] that counts single and batch calls.
pub struct CountingEmbedding {
    inner: FixedEmbedding,
    single: AtomicUsize,
    batches: AtomicUsize,
}

impl CountingEmbedding {
    pub fn new(inner: FixedEmbedding) -> Self {
        Self {
            inner,
            single: AtomicUsize::new(0),
            batches: AtomicUsize::new(0),
        }
    }

    pub fn single_calls(&self) -> usize {
        self.single.load(Ordering::SeqCst)
    }

    pub fn batch_calls(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingService for CountingEmbedding {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, DramaturgError> {
        self.single.fetch_add(1, Ordering::SeqCst);
        self.inner.embed_text(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DramaturgError> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.inner.embed_text(text).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Embedder that is configured but whose endpoint always fails.
pub struct FailingEmbedding;

#[async_trait]
impl EmbeddingService for FailingEmbedding {
    async fn embed_text(&self, _text: &str) -> Result<Vec<f32>, DramaturgError> {
        Err(DramaturgError::Embedding("connection refused".into()))
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Sink that remembers every emitted category.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(String, EntityKind)>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<(String, EntityKind)> {
        self.events.lock().unwrap().clone()
    }

    pub fn categories(&self) -> Vec<EntityKind> {
        self.events().into_iter().map(|(_, k)| k).collect()
    }
}

impl ChangeSink for RecordingSink {
    fn emit(&self, project_id: &str, category: EntityKind) {
        self.events
            .lock()
            .unwrap()
            .push((project_id.to_string(), category));
    }
}

/// A model turn carrying a structured draft that lays the foundation.
pub const FOUNDATION_TURN: &str = r#"정리했어요.

```json
{
  "drama": {"title": "검사의 밤", "genre": "법정 스릴러", "total_episodes": 16},
  "characters": [
    {"name": "김서연", "role": "protagonist", "age": 34, "occupation": "검사"},
    {"name": "박도윤", "role": "antagonist", "occupation": "변호사"}
  ],
  "episodes": [{"number": 1, "title": "첫 공판", "synopsis": "서연이 첫 사건을 맡는다"}],
  "world": [{"category": "location", "name": "서울중앙지검", "description": "야간에도 불이 꺼지지 않는 청사"}],
  "plot_points": [{"type": "setup", "description": "서연의 아버지 사건", "episode": 1}]
}
```"#;

/// A model turn proposing one scene in episode 1.
pub const SCENE_TURN: &str = r#"```json
{
  "scenes": [
    {"episode": 1, "number": 1, "location": "법정", "time_of_day": "밤",
     "description": "서연이 첫 변론을 시작한다", "characters_present": ["김서연", "박도윤"]}
  ]
}
```"#;
