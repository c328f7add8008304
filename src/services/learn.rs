//! Learning pipeline: one conversational turn in, persisted canon out.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::draft::{heuristic, parse, Draft};
use crate::repository::CanonRepository;
use crate::services::differ::{CanonDiffer, ChangeStats};
use crate::services::sanitize::{sanitize, scene_intent, SanitizeOptions};
use crate::DramaturgError;

/// Where a turn's draft came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftSource {
    Structured,
    Heuristic,
}

#[derive(Debug, Clone, Serialize)]
pub struct LearnOutcome {
    pub source: DraftSource,
    pub scenes_allowed: bool,
    pub stats: ChangeStats,
}

pub struct CanonLearner {
    repo: Arc<dyn CanonRepository>,
    differ: CanonDiffer,
}

impl CanonLearner {
    pub fn new(repo: Arc<dyn CanonRepository>, differ: CanonDiffer) -> Self {
        Self { repo, differ }
    }

    /// Learn from a turn.
    ///
    /// `user_text` decides whether scenes may be recorded; `turn_text` is the
    /// text canon is extracted from (model output or the user's own message).
    pub async fn learn(
        &self,
        project_id: &str,
        user_text: &str,
        turn_text: &str,
    ) -> Result<LearnOutcome, DramaturgError> {
        let (draft, source) = match parse(turn_text) {
            Some(draft) => (draft, DraftSource::Structured),
            None => (heuristic::extract(turn_text), DraftSource::Heuristic),
        };
        debug!("Draft for {} from {:?} extraction", project_id, source);
        let allow_scenes = scene_intent(user_text);
        let stats = self.learn_draft(project_id, &draft, allow_scenes).await?;
        Ok(LearnOutcome {
            source,
            scenes_allowed: allow_scenes,
            stats,
        })
    }

    /// Sanitize an already-extracted draft against a fresh snapshot and persist it.
    pub async fn learn_draft(
        &self,
        project_id: &str,
        draft: &Draft,
        allow_scenes: bool,
    ) -> Result<ChangeStats, DramaturgError> {
        let drama = self.repo.require_drama(project_id).await?;
        if draft.is_empty() {
            return Ok(ChangeStats::default());
        }
        let snapshot = self.repo.snapshot(&drama.id).await?;
        let clean = sanitize(draft, &snapshot, SanitizeOptions { allow_scenes });
        if clean.is_empty() {
            return Ok(ChangeStats::default());
        }
        self.differ.persist(project_id, &clean).await
    }
}
