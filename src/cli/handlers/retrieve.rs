//! Retrieval handlers: search, context, check.

use anyhow::Result;

use crate::cli::output::{
    output_json, print_hint, print_success, print_table, print_warning, truncate, OutputMode,
};
use crate::cli::resolve::{parse_kind, parse_kinds, resolve_project};
use crate::init::AppContext;

fn warn_if_disabled(ctx: &AppContext) {
    if !ctx.vector_index.is_available() {
        print_hint("Embeddings are not configured; semantic results will be empty.");
    }
}

pub async fn handle_search(
    ctx: &AppContext,
    project: &str,
    query: &str,
    kinds: &[String],
    limit: usize,
    mode: OutputMode,
) -> Result<()> {
    let drama = resolve_project(ctx.repo.as_ref(), project).await?;
    let kinds = parse_kinds(kinds)?;
    let types = if kinds.is_empty() {
        None
    } else {
        Some(kinds.as_slice())
    };

    let matches = ctx
        .vector_index
        .search(query, &drama.project_id(), limit, types)
        .await;

    if mode == OutputMode::Json {
        output_json(&matches);
        return Ok(());
    }

    warn_if_disabled(ctx);
    println!("Search for '{}': {} results\n", query, matches.len());
    let rows: Vec<Vec<String>> = matches
        .iter()
        .map(|m| {
            vec![
                m.entity_type.clone(),
                truncate(&m.content, 80),
                format!("{:.4}", m.distance),
            ]
        })
        .collect();
    print_table(&["Type", "Canon", "Distance"], rows);
    Ok(())
}

pub async fn handle_context(
    ctx: &AppContext,
    project: &str,
    query: &str,
    mode: OutputMode,
) -> Result<()> {
    let drama = resolve_project(ctx.repo.as_ref(), project).await?;
    let context = ctx
        .vector_index
        .build_context(query, &drama.project_id())
        .await;

    if mode == OutputMode::Json {
        output_json(&serde_json::json!({ "context": context }));
        return Ok(());
    }

    if context.is_empty() {
        warn_if_disabled(ctx);
        print_hint("No related canon.");
    } else {
        print!("{}", context);
    }
    Ok(())
}

pub async fn handle_check(
    ctx: &AppContext,
    project: &str,
    kind: &str,
    content: &str,
    mode: OutputMode,
) -> Result<()> {
    let drama = resolve_project(ctx.repo.as_ref(), project).await?;
    let kind = parse_kind(kind).ok_or_else(|| anyhow::anyhow!("Unknown type '{}'", kind))?;

    let report = ctx
        .vector_index
        .detect_contradiction(kind, content, &drama.project_id())
        .await;

    if mode == OutputMode::Json {
        output_json(&report);
        return Ok(());
    }

    match &report.warning {
        Some(warning) => print_warning(warning),
        None => {
            warn_if_disabled(ctx);
            print_success("No conflicting canon found.");
        }
    }
    Ok(())
}
