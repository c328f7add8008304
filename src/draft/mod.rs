//! Turning one conversational turn into a [`Draft`].
//!
//! Structured model output goes through [`parse`]; when a turn has none,
//! [`heuristic::extract`] is the fallback.

pub mod heuristic;
pub mod schema;

pub use schema::{
    draft_json_schema, parse, CharacterDraft, DramaDraft, Draft, EpisodeDraft, PlotPointDraft,
    SceneDraft, WorldDraft,
};

