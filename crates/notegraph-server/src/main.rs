//! NoteGraph — wikilink graph indexer and query server for a notes directory.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use notegraph_core::NoteGraphConfig;
use notegraph_ingest::{IndexOutcome, Indexer};
use notegraph_query::GraphQuery;
use notegraph_server::{build_router, indexing, AppState};
use notegraph_store::SnapshotStore;

fn print_help() {
    println!("NoteGraph — wikilink graph indexer for a notes directory");
    println!();
    println!("Usage: notegraph [command]");
    println!();
    println!("Commands:");
    println!("  serve [corpus-dir]                 Index and serve the HTTP API (default)");
    println!("  index [corpus-dir] [--json [file]] Index once; --json writes the graph export");
    println!("  links <id> [corpus-dir]            Targets a document links to");
    println!("  backlinks <id> [corpus-dir]        Documents linking to an id");
    println!("  unresolved [corpus-dir]            Dangling link targets");
    println!("  help                               Show this help message");
    println!();
    println!("Environment: PORT, NOTEGRAPH_CORPUS_DIR, NOTEGRAPH_DATA_DIR, NOTEGRAPH_EXTENSIONS, RUST_LOG");
}

fn index_once(config: &NoteGraphConfig) -> anyhow::Result<IndexOutcome> {
    let outcome = Indexer::from_config(config)
        .run()
        .map_err(|e| anyhow::anyhow!("Indexing {} failed: {}", config.corpus_dir.display(), e))?;
    Ok(outcome)
}

fn index_from_env(corpus: Option<PathBuf>) -> anyhow::Result<IndexOutcome> {
    index_once(&NoteGraphConfig::from_env(corpus)?)
}

/// Exit code 1 with a message for lookups that failed.
fn exit_with(err: notegraph_core::Error) -> ! {
    eprintln!("{}", err);
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("serve");

    match command {
        "serve" => serve(args.get(2).map(PathBuf::from)).await,
        "index" => {
            let mut corpus = None;
            let mut export = false;
            let mut json_out = None;
            let mut rest = args.iter().skip(2).peekable();
            while let Some(arg) = rest.next() {
                if arg == "--json" {
                    export = true;
                    if let Some(path) = rest.next_if(|p| !p.starts_with("--")) {
                        json_out = Some(PathBuf::from(path));
                    }
                } else {
                    corpus = Some(PathBuf::from(arg));
                }
            }

            let config = NoteGraphConfig::from_env(corpus)?;
            let outcome = index_once(&config)?;
            let stats = outcome.graph.stats();
            println!(
                "{} files, {} documents, {} links, {} unresolved targets ({} ms)",
                outcome.files_scanned,
                stats.documents,
                stats.links,
                stats.phantoms,
                outcome.elapsed_ms
            );
            for warning in &outcome.warnings {
                println!("warning: {}", warning);
            }
            if export {
                let path =
                    json_out.unwrap_or_else(|| config.data_paths.exports.join("graph.json"));
                let json = serde_json::to_string_pretty(&outcome.graph.export())?;
                std::fs::write(&path, json)?;
                println!("Wrote {}", path.display());
            }
            Ok(())
        }
        "links" | "backlinks" => {
            let Some(id) = args.get(2) else {
                eprintln!("Usage: notegraph {} <id> [corpus-dir]", command);
                std::process::exit(1);
            };
            let outcome = index_from_env(args.get(3).map(PathBuf::from))?;
            let query = GraphQuery::new(&outcome.graph);
            let ids: Vec<&str> = if command == "links" {
                match query.links_from(id) {
                    Ok(links) => links.collect(),
                    Err(e) => exit_with(e),
                }
            } else {
                match query.backlinks_to(id) {
                    Ok(backlinks) => backlinks,
                    Err(e) => exit_with(e),
                }
            };
            for id in ids {
                println!("{}", id);
            }
            Ok(())
        }
        "unresolved" => {
            let outcome = index_from_env(args.get(2).map(PathBuf::from))?;
            for target in GraphQuery::new(&outcome.graph).unresolved_links() {
                println!("{}", target);
            }
            Ok(())
        }
        "--help" | "-h" | "help" => {
            print_help();
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {}. Use 'notegraph help' for usage.", command);
            std::process::exit(1);
        }
    }
}

async fn serve(corpus: Option<PathBuf>) -> anyhow::Result<()> {
    let config = NoteGraphConfig::from_env(corpus)?;
    let port = config.port;

    info!("Corpus directory: {}", config.corpus_dir.display());
    info!("Data directory: {}", config.data_paths.root.display());

    let store = SnapshotStore::open(&config.data_paths.snapshot_db)
        .map_err(|e| anyhow::anyhow!("Failed to open snapshot store: {}", e))?;

    // Serve the stored snapshot while the first pass runs.
    let state = Arc::new(AppState::new(config, store));
    indexing::start_rebuild_worker(state.clone());
    indexing::request_rebuild(&state, "startup");

    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("NoteGraph server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
