//! Thin CLI shell over the `atlas` library (`spec.md` §1 Non-goals:
//! "the command-line front-end ... are thin shells over the core
//! operations"). This binary exists only so `Build`/`Update`/`Tidy`/
//! `Get`/`Compile`/`Execute` are exercisable from a terminal; output
//! formatting, the debug REPL, completions and the HTTP/datagram
//! servers described in `spec.md` §6 are not implemented here.

use anyhow::{Context, Result};
use atlas::cancel::CancellationToken;
use atlas::config::{BuildOptions, QueryOptions};
use atlas::Atlas;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "atlas", about = "Index notes and query them with a boolean query language")]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://atlas.db")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build or update the index, or garbage-collect it.
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },
    /// Compile and run a query against the index.
    Query {
        /// Query text, e.g. `t=rust and d>=2025-01-01`.
        expr: String,
    },
}

#[derive(Subcommand)]
enum IndexAction {
    /// One-shot load of every document under `root`.
    Build { root: PathBuf },
    /// Re-traverse `root`, deleting paths no longer present.
    Update { root: PathBuf },
    /// Garbage-collect unreferenced authors/tags and compact storage.
    Tidy,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let atlas = Atlas::open(&cli.database_url)
        .await
        .with_context(|| format!("opening index at {}", cli.database_url))?;

    match cli.command {
        Command::Index { action } => run_index(&atlas, action).await,
        Command::Query { expr } => run_query(&atlas, &expr).await,
    }
}

async fn run_index(atlas: &Atlas, action: IndexAction) -> Result<()> {
    let opts = BuildOptions::from_env();
    match action {
        IndexAction::Build { root } => {
            let report = atlas.build(&root, &opts, CancellationToken::new()).await?;
            println!(
                "indexed {} documents ({} skipped, {} parse errors)",
                report.documents.len(),
                report.skipped,
                report.parse_errors
            );
        }
        IndexAction::Update { root } => {
            let report = atlas.update(&root, &opts, CancellationToken::new()).await?;
            println!(
                "re-indexed {} documents ({} skipped, {} parse errors)",
                report.documents.len(),
                report.skipped,
                report.parse_errors
            );
        }
        IndexAction::Tidy => {
            atlas.tidy(CancellationToken::new()).await?;
            println!("tidy complete");
        }
    }
    Ok(())
}

async fn run_query(atlas: &Atlas, expr: &str) -> Result<()> {
    let opts = QueryOptions::default();
    let docs = atlas.query(expr, &opts, CancellationToken::new()).await?;
    for doc in &docs {
        println!("{}\t{}", doc.path, doc.title);
    }
    println!("{} document(s)", docs.len());
    Ok(())
}
