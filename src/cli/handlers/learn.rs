//! Learn handler: feed one turn through the canon pipeline.

use anyhow::{Context as _, Result};
use std::path::Path;
use tokio::io::AsyncReadExt;

use crate::cli::output::{output_json, print_hint, print_kv, print_success, OutputMode};
use crate::cli::resolve::resolve_project;
use crate::init::AppContext;
use crate::services::DraftSource;

async fn read_turn(file: Option<&Path>, text: Option<&str>) -> Result<String> {
    match (file, text) {
        (Some(path), _) if path == Path::new("-") => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            Ok(buf)
        }
        (Some(path), _) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        (None, Some(text)) => Ok(text.to_string()),
        (None, None) => anyhow::bail!("Provide the turn text inline or with --file"),
    }
}

pub async fn handle_learn(
    ctx: &AppContext,
    project: &str,
    file: Option<&Path>,
    text: Option<&str>,
    user: Option<&str>,
    mode: OutputMode,
) -> Result<()> {
    let drama = resolve_project(ctx.repo.as_ref(), project).await?;
    let turn = read_turn(file, text).await?;
    let user_text = user.unwrap_or(turn.as_str());

    let outcome = ctx
        .learner
        .learn(&drama.project_id(), user_text, &turn)
        .await?;

    if mode == OutputMode::Json {
        output_json(&outcome);
        return Ok(());
    }

    if outcome.stats.is_empty() {
        print_hint("Nothing new to record.");
    } else {
        print_success(&outcome.stats.describe());
    }
    let source = match outcome.source {
        DraftSource::Structured => "structured draft",
        DraftSource::Heuristic => "heuristic extraction",
    };
    print_kv("source", source);
    if !outcome.scenes_allowed {
        print_kv("scenes", "not requested this turn");
    }
    Ok(())
}
