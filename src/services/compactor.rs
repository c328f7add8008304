//! Conversation-size compaction.
//!
//! Decides whether a conversation has grown past the threshold and, if so,
//! asks a [`Summarizer`] for a sectioned canon outline of everything except
//! the newest messages. Splicing the summary in is the caller's job.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::services::summarizer::Summarizer;

/// Heading placed above every compaction summary.
pub const SUMMARY_HEADING: &str = "## Conversation summary (compacted)";

const SECTIONS: [&str; 5] = ["Characters", "Episodes", "World", "Plot", "Scenes"];

/// Compaction settings, loaded from the `[compaction]` table of `canon.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactionConfig {
    /// Compaction triggers once accumulated characters exceed this.
    pub threshold_chars: usize,
    /// Newest messages kept verbatim.
    pub keep_last: usize,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            threshold_chars: 80_000,
            keep_last: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// What the caller should splice in: `summary` replaces every message but
/// the last `keep_last`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Compaction {
    pub summary: String,
    pub keep_last: usize,
}

/// Rough token count: four characters per token.
pub fn estimate_tokens(chars: usize) -> usize {
    chars.div_ceil(4)
}

#[derive(Debug, Clone, Default)]
pub struct ContextCompactor {
    config: CompactionConfig,
}

impl ContextCompactor {
    pub fn new(config: CompactionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompactionConfig {
        &self.config
    }

    pub fn should_compact(&self, total_chars: usize, message_count: usize) -> bool {
        total_chars > self.config.threshold_chars && message_count > self.config.keep_last
    }

    /// Summarize older messages when the conversation is over the threshold.
    ///
    /// `None` below the threshold, when nothing is left after the keep
    /// window, or when the summarizer fails.
    pub async fn compact_if_needed(
        &self,
        total_chars: usize,
        summary_count: usize,
        context: &str,
        messages: &[ConversationMessage],
        summarizer: &dyn Summarizer,
    ) -> Option<Compaction> {
        if !self.should_compact(total_chars, messages.len()) {
            return None;
        }
        let older = &messages[..messages.len() - self.config.keep_last];
        let prompt = build_prompt(total_chars, summary_count, context, older);

        match summarizer.summarize(&prompt).await {
            Ok(text) => {
                info!(
                    "Compacted {} messages (~{} tokens), keeping last {}",
                    older.len(),
                    estimate_tokens(total_chars),
                    self.config.keep_last
                );
                Some(Compaction {
                    summary: format!("{}\n\n{}", SUMMARY_HEADING, text.trim()),
                    keep_last: self.config.keep_last,
                })
            }
            Err(e) => {
                warn!("Compaction skipped, summarizer failed: {}", e);
                None
            }
        }
    }
}

/// Summarization prompt asking for a fixed five-section outline.
pub fn build_prompt(
    total_chars: usize,
    summary_count: usize,
    context: &str,
    messages: &[ConversationMessage],
) -> String {
    let mut prompt = format!(
        "You are compacting a long screenwriting conversation.\n\
         Previous compactions: {}. Current size: {} characters (~{} tokens).\n\n\
         Summarize the established story canon as a bullet outline with exactly \
         these sections, in this order. Write \"- none\" under any section with \
         nothing to record.\n",
        summary_count,
        total_chars,
        estimate_tokens(total_chars)
    );
    for section in SECTIONS {
        prompt.push_str(&format!("\n### {}\n- none\n", section));
    }

    prompt.push_str("\nExisting context:\n");
    let context = context.trim();
    if context.is_empty() {
        prompt.push_str("- none\n");
    } else {
        prompt.push_str(context);
        prompt.push('\n');
    }

    prompt.push_str("\nConversation to summarize:");
    for message in messages {
        prompt.push_str(&format!("\n[{}] {}", message.role.as_str(), message.content.trim()));
    }
    prompt
}
