pub mod compactor;
pub mod differ;
pub mod learn;
pub mod notify;
pub mod sanitize;
pub mod summarizer;

pub use compactor::{
    build_prompt, estimate_tokens, Compaction, CompactionConfig, ContextCompactor,
    ConversationMessage, MessageRole, SUMMARY_HEADING,
};
pub use differ::{CanonDiffer, ChangeStats};
pub use learn::{CanonLearner, DraftSource, LearnOutcome};
pub use notify::{BroadcastChangeSink, ChangeEvent, ChangeSink, NoopChangeSink};
pub use sanitize::{
    sanitize, scene_intent, CanonSnapshot, CleanDraft, SanitizeOptions,
};
pub use summarizer::{AnthropicSummarizer, Summarizer, DEFAULT_SUMMARY_MODEL};
