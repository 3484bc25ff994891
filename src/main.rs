use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use lexsearch::aggregator::SearchAggregator;
use lexsearch::api::create_router;
use lexsearch::catalog::default_registry;
use lexsearch::config::CONFIG;
use lexsearch::db::Database;
use lexsearch::memory::MemorySource;
use lexsearch::session::{SearchPhase, SearchSession, SearchView};
use lexsearch::source::RecordSource;

#[derive(Parser)]
#[command(name = "lexsearch", about = "Search aggregator for legal-study collections")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP search API
    Serve {
        /// Serve from a directory of `<collection>.json` files instead of MongoDB
        #[arg(long)]
        fixtures: Option<PathBuf>,
        #[arg(long)]
        bind: Option<String>,
    },
    /// Run one search and print the response as JSON
    Search {
        term: String,
        #[arg(long)]
        fixtures: Option<PathBuf>,
    },
    /// Read search terms from stdin, keeping only the latest result
    Interactive {
        #[arg(long)]
        fixtures: Option<PathBuf>,
    },
    /// Load a directory of `<collection>.json` files into MongoDB
    Seed { dir: PathBuf },
}

impl Command {
    fn fixtures(&self) -> Option<&PathBuf> {
        match self {
            Command::Serve { fixtures, .. }
            | Command::Search { fixtures, .. }
            | Command::Interactive { fixtures } => fixtures.as_ref(),
            Command::Seed { .. } => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Command::Seed { dir } = &cli.command {
        return seed(dir).await;
    }

    match cli.command.fixtures().cloned() {
        Some(dir) => run(MemorySource::from_json_dir(&dir)?, cli.command).await,
        None => run(Database::from_config().await?, cli.command).await,
    }
}

async fn run<S: RecordSource>(source: S, command: Command) -> Result<()> {
    let aggregator = Arc::new(SearchAggregator::new(
        source,
        default_registry(),
        CONFIG.search.clone(),
    ));

    match command {
        Command::Serve { bind, .. } => {
            let bind = bind.unwrap_or_else(|| CONFIG.bind_addr.clone());
            let listener = tokio::net::TcpListener::bind(&bind)
                .await
                .with_context(|| format!("Failed to bind {bind}"))?;
            tracing::info!(%bind, "search API listening");
            axum::serve(listener, create_router(aggregator))
                .await
                .context("HTTP server failed")?;
        }
        Command::Search { term, .. } => {
            let response = aggregator.search(&term).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Interactive { .. } => interactive(aggregator).await?,
        Command::Seed { .. } => {}
    }
    Ok(())
}

async fn interactive<S: RecordSource>(aggregator: Arc<SearchAggregator<S>>) -> Result<()> {
    let session = Arc::new(SearchSession::new(aggregator));
    let mut updates = session.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last = None;

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) if line.trim().is_empty() => session.clear(),
                Some(line) => last = Some(session.spawn_search(line)),
                None => break,
            },
            Ok(()) = updates.changed() => print_settled(&updates.borrow_and_update()),
        }
    }

    if let Some(handle) = last {
        handle.await.context("search task failed")?;
    }
    if updates.has_changed().unwrap_or(false) {
        print_settled(&updates.borrow_and_update());
    }
    Ok(())
}

fn print_settled(view: &SearchView) {
    if !matches!(view.phase, SearchPhase::Success | SearchPhase::PartialFailure) {
        return;
    }
    println!("== {} ({} results)", view.term, view.total_count);
    for result in &view.results {
        println!(
            "[{}] {} ({}, {})",
            result.category, result.title, result.category_label, result.area
        );
    }
    if !view.failed_collections.is_empty() {
        println!("!! unavailable: {}", view.failed_collections.join(", "));
    }
}

async fn seed(dir: &Path) -> Result<()> {
    let fixtures = MemorySource::from_json_dir(dir)?;
    let db = Database::from_config().await?;
    for name in fixtures.collection_names() {
        let inserted = db.insert_records(name, fixtures.records(name)).await?;
        tracing::info!(collection = name, inserted, "seeded collection");
    }
    Ok(())
}
