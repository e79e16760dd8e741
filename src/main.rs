//! Factgraph CLI - serve, query and inspect the in-memory entity graph

use clap::{Parser, Subcommand, ValueEnum};
use factgraph::config::{self, GraphConfig};
use factgraph::transport::{LineIngest, LineQueries};
use factgraph::ui::{self, Icons, Spinner};
use factgraph::{GraphService, QueryRequest};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "factgraph")]
#[command(version)]
#[command(about = "In-memory knowledge graph of software entities")]
#[command(long_about = r#"
Factgraph keeps a live graph of software entities built from
subject/predicate/object facts and answers structural queries:
  • entity, related, depends_on, depended_by
  • implements, contains, search

Example usage:
  factgraph serve --replay events.jsonl
  factgraph query --replay events.jsonl depended_by --entity pkg.Store
  factgraph stdio --replay events.jsonl < queries.jsonl
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the graph over HTTP
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// JSON-lines file of entity updates to load first
        #[arg(short, long)]
        replay: Option<PathBuf>,
    },

    /// Answer JSON-lines queries on stdin, one response per line on stdout
    Stdio {
        /// JSON-lines file of entity updates loaded before the first query
        #[arg(short, long)]
        replay: Option<PathBuf>,
    },

    /// Replay an event file and run a single query
    Query {
        /// Query type (entity, related, depends_on, depended_by, implements, contains, search)
        kind: String,

        /// JSON-lines file of entity updates
        #[arg(short, long)]
        replay: Option<PathBuf>,

        /// Target entity ID
        #[arg(short, long)]
        entity: Option<String>,

        /// Relation filter for `related`
        #[arg(long)]
        relation: Option<String>,

        /// Search text
        #[arg(short, long)]
        text: Option<String>,

        /// Result cap (clamped to the configured ceiling)
        #[arg(short = 'n', long, allow_negative_numbers = true)]
        max_results: Option<i64>,

        /// Traversal depth
        #[arg(short, long, allow_negative_numbers = true)]
        depth: Option<i64>,

        /// Include each entity's originating facts
        #[arg(long)]
        facts: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Replay an event file and show graph statistics
    Stats {
        /// JSON-lines file of entity updates
        #[arg(short, long)]
        replay: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // stdout carries query results in stdio mode
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);

    match cli.command {
        Commands::Init { force } => {
            config::write_config(&config_path, &GraphConfig::default(), force)?;
            ui::success(&format!("Wrote {}", config_path.display()));
        }

        Commands::Serve { port, replay } => {
            let mut config = config::load_or_default(Some(&config_path))?;
            if let Some(port) = port {
                config.server.port = port;
            }

            let service = Arc::new(GraphService::from_config(&config));
            if let Some(path) = replay.or_else(|| config.replay.clone()) {
                replay_file(&service, &path, true).await?;
            }

            let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
            ui::header(&format!("Serving {} entities on http://{}", service.entity_count(), addr));
            factgraph::server::start_server(addr, service).await?;
        }

        Commands::Stdio { replay } => {
            let config = config::load_or_default(Some(&config_path))?;
            let service = Arc::new(GraphService::from_config(&config));

            if let Some(path) = replay.or_else(|| config.replay.clone()) {
                replay_file(&service, &path, false).await?;
            }

            // Everything is loaded; the live ingestion source stays empty
            let idle = LineIngest::new(BufReader::new(tokio::io::empty()));
            let queries = LineQueries::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout());
            let totals = service.start(idle, queries).join().await?;
            tracing::info!(events = totals.events, queries = totals.queries, "stdio session finished");
        }

        Commands::Query {
            kind,
            replay,
            entity,
            relation,
            text,
            max_results,
            depth,
            facts,
            format,
        } => {
            let config = config::load_or_default(Some(&config_path))?;
            let service = Arc::new(GraphService::from_config(&config));
            if let Some(path) = replay.or_else(|| config.replay.clone()) {
                replay_file(&service, &path, format == Format::Text).await?;
            }

            let mut req = QueryRequest::new("cli", kind);
            req.entity_id = entity;
            req.relation = relation;
            req.search_text = text;
            req.max_results = max_results;
            req.depth = depth;
            req.include_full_facts = facts;

            let resp = service.query(&req);
            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&resp)?),
                Format::Text => {
                    if let Some(error) = &resp.error {
                        anyhow::bail!("{}", error);
                    }
                    if resp.entities.is_empty() {
                        println!("{} No entities matched.", Icons::EMPTY);
                    } else {
                        println!("{}", ui::entity_table(&resp.entities));
                    }
                    ui::timing(&format!(
                        "{} of {} in {:?}",
                        resp.entities.len(),
                        resp.total_count,
                        resp.query_time
                    ));
                }
            }
        }

        Commands::Stats { replay, format } => {
            let config = config::load_or_default(Some(&config_path))?;
            let service = Arc::new(GraphService::from_config(&config));
            if let Some(path) = replay.or_else(|| config.replay.clone()) {
                replay_file(&service, &path, format == Format::Text).await?;
            }

            let stats = service.stats();
            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
                Format::Text => {
                    ui::header("Graph statistics");
                    let index = &stats.graph.index;
                    println!(
                        "{}",
                        ui::stats_table(&[
                            ("Entities", stats.graph.entities.to_string()),
                            ("Types", index.types.to_string()),
                            ("Packages", index.packages.to_string()),
                            ("Names", index.names.to_string()),
                            ("Paths", index.paths.to_string()),
                            ("Relation edges", index.relation_edges.to_string()),
                            ("Events applied", stats.events_applied.to_string()),
                            ("Events dropped", stats.events_dropped.to_string()),
                        ])
                    );
                }
            }
        }
    }

    Ok(())
}

/// Ingest every line of a JSON-lines event file before serving queries
async fn replay_file(service: &GraphService, path: &Path, show_progress: bool) -> anyhow::Result<()> {
    let file = tokio::fs::File::open(path).await?;
    let source = LineIngest::new(BufReader::new(file));
    let spinner = show_progress.then(|| Spinner::new(&format!("Replaying {}", path.display())));

    let totals = service
        .replay(source, || {
            if let Some(spinner) = &spinner {
                spinner.inc();
            }
        })
        .await;

    if let Some(spinner) = &spinner {
        ui::success(&spinner.finish(&format!("Loaded {} entities", service.entity_count())));
    }
    if totals.dropped > 0 {
        ui::warn(&format!("{} malformed events skipped", totals.dropped));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_accepts_negative_cap() {
        let cli = Cli::try_parse_from(["factgraph", "query", "search", "-t", "x", "-n", "-3", "-d", "-1"])
            .unwrap();

        let Commands::Query { max_results, depth, .. } = cli.command else {
            panic!("expected query command");
        };
        assert_eq!(max_results, Some(-3));
        assert_eq!(depth, Some(-1));
    }

    #[test]
    fn test_stdio_accepts_replay() {
        let cli = Cli::try_parse_from(["factgraph", "stdio", "--replay", "events.jsonl"]).unwrap();
        assert!(matches!(cli.command, Commands::Stdio { replay: Some(_) }));
    }
}
