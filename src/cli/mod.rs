//! Operator CLI for the canon engine.

pub mod handlers;
pub mod output;
pub mod resolve;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use output::OutputMode;

use crate::init::AppContext;

/// Dramaturg - canon engine for AI-assisted screenwriting
#[derive(Parser)]
#[command(name = "dramaturg", version, about, long_about = None)]
pub struct Cli {
    /// Override data directory (default: ~/.dramaturg)
    #[arg(long, env = "DRAMATURG_DATA_PATH", global = true)]
    pub data_path: Option<PathBuf>,

    /// Output as JSON instead of human-readable format
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new drama and print its project id
    Init {
        title: String,
        #[arg(long)]
        genre: Option<String>,
        #[arg(long)]
        tone: Option<String>,
        #[arg(long)]
        setting: Option<String>,
        #[arg(long)]
        logline: Option<String>,
        /// Planned number of episodes
        #[arg(long)]
        episodes: Option<i64>,
    },

    /// List dramas
    List,

    /// Show everything recorded for a drama
    Show {
        project: String,
        /// Only one kind (drama, character, episode, world, plot_point, scene)
        #[arg(long = "type")]
        kind: Option<String>,
    },

    /// Learn canon from a conversational turn
    Learn {
        project: String,
        /// File holding the turn text ("-" for stdin)
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
        /// Turn text inline
        text: Option<String>,
        /// The user's own message, used to detect scene intent (defaults to the turn text)
        #[arg(long)]
        user: Option<String>,
    },

    /// Semantic search within a drama
    Search {
        project: String,
        query: String,
        /// Restrict to one or more kinds (repeatable)
        #[arg(long = "type")]
        kinds: Vec<String>,
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Print the related-canon block that would be injected into a prompt
    Context { project: String, query: String },

    /// Check new content against same-kind canon for possible contradictions
    Check {
        project: String,
        /// Entity kind of the content
        #[arg(long = "type")]
        kind: String,
        content: String,
    },

    /// Re-embed every entity of a drama
    Reindex { project: String },

    /// Decide whether a saved conversation needs compaction, and summarize it if so
    Compact {
        /// JSON file: array of {"role": "user"|"assistant", "content": "..."}
        file: PathBuf,
        /// Compactions already applied to this conversation
        #[arg(long, default_value = "0")]
        summary_count: usize,
        /// Existing context block to carry into the summary
        #[arg(long, default_value = "")]
        context: String,
    },

    /// Print the JSON Schema for structured drafts
    Schema,
}

impl Commands {
    /// Commands that never touch the database.
    pub fn is_offline(&self) -> bool {
        matches!(self, Commands::Schema)
    }
}

pub async fn execute(cmd: &Commands, ctx: &AppContext, mode: OutputMode) -> anyhow::Result<()> {
    use handlers::*;

    match cmd {
        Commands::Init {
            title,
            genre,
            tone,
            setting,
            logline,
            episodes,
        } => {
            drama::handle_init(
                ctx,
                drama::InitArgs {
                    title: title.clone(),
                    genre: genre.clone(),
                    tone: tone.clone(),
                    setting: setting.clone(),
                    logline: logline.clone(),
                    total_episodes: *episodes,
                },
                mode,
            )
            .await
        }
        Commands::List => drama::handle_list(ctx, mode).await,
        Commands::Show { project, kind } => {
            drama::handle_show(ctx, project, kind.as_deref(), mode).await
        }
        Commands::Learn {
            project,
            file,
            text,
            user,
        } => {
            learn::handle_learn(
                ctx,
                project,
                file.as_deref(),
                text.as_deref(),
                user.as_deref(),
                mode,
            )
            .await
        }
        Commands::Search {
            project,
            query,
            kinds,
            limit,
        } => retrieve::handle_search(ctx, project, query, kinds, *limit, mode).await,
        Commands::Context { project, query } => {
            retrieve::handle_context(ctx, project, query, mode).await
        }
        Commands::Check {
            project,
            kind,
            content,
        } => retrieve::handle_check(ctx, project, kind, content, mode).await,
        Commands::Reindex { project } => maintenance::handle_reindex(ctx, project, mode).await,
        Commands::Compact {
            file,
            summary_count,
            context,
        } => maintenance::handle_compact(ctx, file, *summary_count, context, mode).await,
        Commands::Schema => {
            maintenance::handle_schema();
            Ok(())
        }
    }
}
