//! Dramaturg - canon engine for AI-assisted screenwriting
//!
//! Usage:
//!   dramaturg init "야간 법정" --genre 법정극     Create a drama
//!   dramaturg learn <project> --file turn.md      Learn canon from a turn
//!   dramaturg search <project> "검사"              Semantic search
//!   dramaturg check <project> --type character "..."
//!   dramaturg --help                              Show all commands

use anyhow::Result;
use clap::Parser;

use dramaturg::cli::output::{print_error, OutputMode};
use dramaturg::cli::{handlers::maintenance, Cli};
use dramaturg::init::AppContext;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Tracing to stderr so JSON output on stdout stays clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dramaturg=info".parse()?),
        )
        .init();

    let mode = OutputMode::from_json_flag(cli.json);

    if cli.command.is_offline() {
        maintenance::handle_schema();
        return Ok(());
    }

    let ctx = AppContext::new(cli.data_path.clone()).await?;
    let result = dramaturg::cli::execute(&cli.command, &ctx, mode).await;
    ctx.shutdown().await;

    if let Err(e) = result {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}
