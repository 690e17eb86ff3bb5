use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use newsdesk_common::{Config, DiscoveredEvent, DiscoveredSource, EventCandidate, ReliabilityEvent};
use newsdesk_pipeline::editorial::EditorialDesk;
use newsdesk_pipeline::pipeline::Pipeline;
use newsdesk_pipeline::reliability::{EventContext, ReliabilityLedger};
use newsdesk_pipeline::store::{PgStore, PipelineStore};
use newsdesk_pipeline::traits::StaticDiscovery;

#[derive(Parser)]
#[command(name = "newsdesk", about = "Editorial event decision pipeline")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply the database schema
    Migrate,
    /// Print the JSON Schema of the ingest and sources files
    Schema,
    /// Dedup, score and verify a batch of discovered events
    Ingest {
        /// JSON array of discovered events
        file: PathBuf,
        /// JSON object mapping topic titles to discovered sources
        #[arg(long)]
        sources: Option<PathBuf>,
    },
    /// Finish stranded candidates and re-run pending or failed verifications
    Retry {
        #[arg(long)]
        sources: Option<PathBuf>,
    },
    /// List under-review articles past their deadline
    Overdue,
    /// Show every queue waiting on a human
    Queues {
        /// Print the queue ids as JSON
        #[arg(long)]
        json: bool,
    },
    /// Apply a reliability event to a source
    Reliability {
        source_key: String,
        /// accuracy_confirmed, minor_correction, correction_issued, retraction,
        /// fact_check_pass or fact_check_fail
        event: ReliabilityEvent,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = EnvFilter::from_default_env().add_directive("newsdesk=info".parse()?);
    if cli.json_logs {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    if matches!(cli.command, Command::Schema) {
        println!("{}", serde_json::to_string_pretty(&newsdesk_common::input_schemas())?);
        return Ok(());
    }

    info!("Newsdesk starting...");

    let config = Config::from_env()?;
    config.log_redacted();

    let store = PgStore::connect(&config.database_url).await?;
    if matches!(cli.command, Command::Migrate) {
        store.migrate().await?;
        info!("Migrations complete");
        return Ok(());
    }
    let store: Arc<dyn PipelineStore> = Arc::new(store);
    let now = Utc::now();

    match cli.command {
        Command::Migrate | Command::Schema => {}
        Command::Ingest { file, sources } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let events: Vec<DiscoveredEvent> = serde_json::from_str(&raw)
                .with_context(|| format!("Invalid event batch in {}", file.display()))?;
            let candidates: Vec<EventCandidate> = events
                .into_iter()
                .map(|e| EventCandidate::from_discovery(e, now))
                .collect();
            let discovery = load_discovery(sources.as_deref())?;

            let pipeline = Pipeline::new(store, &config.pipeline);
            pipeline.warm(now).await?;
            let stats = pipeline.process_batch(candidates, &discovery, now).await;
            info!("Ingest complete. {stats}");
        }
        Command::Retry { sources } => {
            let discovery = load_discovery(sources.as_deref())?;
            let pipeline = Pipeline::new(store, &config.pipeline);
            let stats = pipeline.resume(&discovery, now).await?;
            info!("Retry complete. {stats}");
        }
        Command::Overdue => {
            let desk = EditorialDesk::new(store, &config.pipeline);
            for article in desk.overdue(now).await? {
                println!(
                    "{}\t{}\t{}\t{}",
                    article.id,
                    article
                        .review_deadline
                        .map(|d| d.to_rfc3339())
                        .unwrap_or_default(),
                    article
                        .assigned_editor
                        .map(|e| e.to_string())
                        .unwrap_or_default(),
                    article.title
                );
            }
        }
        Command::Queues { json } => {
            let desk = EditorialDesk::new(store, &config.pipeline);
            let queues = desk.queues(now).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&queues)?);
            } else {
                println!("{queues}");
            }
        }
        Command::Reliability { source_key, event } => {
            let ledger = ReliabilityLedger::new(store, config.pipeline.reliability);
            let score = ledger
                .log_event(&source_key, event, EventContext::default(), now)
                .await?;
            println!("{source_key}: {score:.1}");
        }
    }

    Ok(())
}

fn load_discovery(path: Option<&Path>) -> Result<StaticDiscovery> {
    let Some(path) = path else {
        return Ok(StaticDiscovery::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let entries: HashMap<String, Vec<DiscoveredSource>> = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid sources file {}", path.display()))?;
    Ok(StaticDiscovery::new(entries))
}
