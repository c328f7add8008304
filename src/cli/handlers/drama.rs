//! Drama handlers: init, list, show.

use anyhow::Result;
use serde::Serialize;

use crate::cli::output::{
    output_json, print_header, print_hint, print_kv, print_success, print_table, truncate,
    OutputMode,
};
use crate::cli::resolve::{parse_kind, resolve_project};
use crate::embedding::render::render_entity;
use crate::init::AppContext;
use crate::models::{CanonEntity, DramaCreate, EntityKind};
use crate::services::CanonSnapshot;

pub struct InitArgs {
    pub title: String,
    pub genre: Option<String>,
    pub tone: Option<String>,
    pub setting: Option<String>,
    pub logline: Option<String>,
    pub total_episodes: Option<i64>,
}

pub async fn handle_init(ctx: &AppContext, args: InitArgs, mode: OutputMode) -> Result<()> {
    let title = args.title.trim();
    if title.is_empty() {
        anyhow::bail!("Title must not be empty");
    }
    if let Some(n) = args.total_episodes {
        if n <= 0 {
            anyhow::bail!("--episodes must be positive, got {}", n);
        }
    }

    let drama = ctx
        .repo
        .create_drama(DramaCreate {
            title: title.to_string(),
            genre: args.genre,
            tone: args.tone,
            setting: args.setting,
            logline: args.logline,
            total_episodes: args.total_episodes,
        })
        .await?;
    ctx.index_queue.upsert(CanonEntity::Drama(drama.clone()));

    if mode == OutputMode::Json {
        output_json(&serde_json::json!({
            "project_id": drama.project_id(),
            "title": drama.title,
        }));
    } else {
        print_success(&format!("Created '{}'", drama.title));
        print_kv("project id", &drama.project_id());
    }
    Ok(())
}

pub async fn handle_list(ctx: &AppContext, mode: OutputMode) -> Result<()> {
    let dramas = ctx.repo.list_dramas().await?;

    if mode == OutputMode::Json {
        #[derive(Serialize)]
        struct Row {
            project_id: String,
            title: String,
            genre: Option<String>,
            total_episodes: Option<i64>,
        }
        let rows: Vec<Row> = dramas
            .iter()
            .map(|d| Row {
                project_id: d.project_id(),
                title: d.title.clone(),
                genre: d.genre.clone(),
                total_episodes: d.total_episodes,
            })
            .collect();
        output_json(&rows);
        return Ok(());
    }

    let rows: Vec<Vec<String>> = dramas
        .iter()
        .map(|d| {
            vec![
                d.project_id(),
                d.title.clone(),
                d.genre.clone().unwrap_or_default(),
                d.total_episodes.map(|n| n.to_string()).unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["Project", "Title", "Genre", "Episodes"], rows);
    Ok(())
}

pub async fn handle_show(
    ctx: &AppContext,
    project: &str,
    kind: Option<&str>,
    mode: OutputMode,
) -> Result<()> {
    let drama = resolve_project(ctx.repo.as_ref(), project).await?;
    let filter = match kind {
        Some(k) => Some(parse_kind(k).ok_or_else(|| anyhow::anyhow!("Unknown type '{}'", k))?),
        None => None,
    };

    let entities: Vec<CanonEntity> = ctx
        .repo
        .list_all(&drama.project_id())
        .await?
        .into_iter()
        .filter(|e| filter.is_none_or(|k| e.kind() == k))
        .collect();

    if mode == OutputMode::Json {
        #[derive(Serialize)]
        struct Row {
            entity_id: String,
            entity_type: EntityKind,
            content: String,
        }
        let rows: Vec<Row> = entities
            .iter()
            .map(|e| Row {
                entity_id: e.entity_id(),
                entity_type: e.kind(),
                content: render_entity(e),
            })
            .collect();
        output_json(&rows);
        return Ok(());
    }

    let snapshot = ctx.repo.snapshot(&drama.id).await?;
    print_header(&drama.title);
    print_kv("project id", &drama.project_id());
    print_kv(
        "canon",
        &format!(
            "{} characters, {} episodes, {} world entries",
            snapshot.characters, snapshot.episodes, snapshot.world
        ),
    );
    if !snapshot.has_foundation() {
        print_hint(&foundation_hint(&snapshot));
    }
    println!();

    let rows: Vec<Vec<String>> = entities
        .iter()
        .map(|e| {
            vec![
                e.kind().to_string(),
                e.merge_key(),
                truncate(&render_entity(e), 80),
            ]
        })
        .collect();
    print_table(&["Type", "Key", "Canon"], rows);
    Ok(())
}

fn foundation_hint(snapshot: &CanonSnapshot) -> String {
    format!(
        "Scenes are not recorded yet: need 2 characters, 1 episode and 1 world entry (have {}/{}/{}).",
        snapshot.characters, snapshot.episodes, snapshot.world
    )
}
