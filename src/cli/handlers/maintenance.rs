//! Maintenance handlers: reindex, compact, schema.

use anyhow::{Context as _, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use crate::cli::output::{output_json, print_hint, print_kv, print_success, OutputMode};
use crate::cli::resolve::resolve_project;
use crate::draft::draft_json_schema;
use crate::init::AppContext;
use crate::services::{estimate_tokens, ConversationMessage};

pub async fn handle_reindex(ctx: &AppContext, project: &str, mode: OutputMode) -> Result<()> {
    let drama = resolve_project(ctx.repo.as_ref(), project).await?;
    if !ctx.vector_index.is_available() {
        anyhow::bail!("Embeddings are not configured; nothing to reindex");
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Reindexing '{}'", drama.title));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = ctx
        .vector_index
        .reindex_project(ctx.repo.as_ref(), &drama.project_id())
        .await;
    spinner.finish_and_clear();
    let written = result?;

    if mode == OutputMode::Json {
        output_json(&serde_json::json!({
            "project_id": drama.project_id(),
            "reindexed": written,
        }));
    } else {
        print_success(&format!("Reindexed {} entities", written));
    }
    Ok(())
}

pub async fn handle_compact(
    ctx: &AppContext,
    file: &Path,
    summary_count: usize,
    context: &str,
    mode: OutputMode,
) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let messages: Vec<ConversationMessage> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON message array", file.display()))?;
    let total_chars: usize = messages.iter().map(|m| m.content.chars().count()).sum();

    if !ctx.compactor.should_compact(total_chars, messages.len()) {
        if mode == OutputMode::Json {
            output_json(&serde_json::Value::Null);
        } else {
            print_hint(&format!(
                "No compaction needed: {} characters (~{} tokens) across {} messages.",
                total_chars,
                estimate_tokens(total_chars),
                messages.len()
            ));
        }
        return Ok(());
    }

    let summarizer = ctx.summarizer.as_ref().ok_or_else(|| {
        anyhow::anyhow!(
            "Compaction needed but {} is not set",
            ctx.config.summarizer.api_key_env
        )
    })?;

    let compaction = ctx
        .compactor
        .compact_if_needed(
            total_chars,
            summary_count,
            context,
            &messages,
            summarizer.as_ref(),
        )
        .await;

    match (compaction, mode) {
        (Some(c), OutputMode::Json) => output_json(&c),
        (Some(c), OutputMode::Human) => {
            print_kv("keep last", &c.keep_last.to_string());
            println!("\n{}", c.summary);
        }
        (None, _) => anyhow::bail!("Summarizer failed; conversation left as is"),
    }
    Ok(())
}

pub fn handle_schema() {
    output_json(&draft_json_schema());
}
