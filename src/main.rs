//! txt2kg CLI - main entry point

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use tracing::{info, warn};
use txt2kg::commands::{self, ExtractOptions};
use txt2kg::metrics;

#[derive(Parser)]
#[command(name = "txt2kg")]
#[command(about = "Extract knowledge-graph triples from text with an LLM", long_about = None)]
#[command(version)]
struct Cli {
    /// Address to expose Prometheus metrics (e.g., 0.0.0.0:9898)
    #[arg(long, env = "METRICS_ADDR")]
    metrics_addr: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract triples from text files and save the knowledge graph
    Extract {
        /// Text file or directory (repeatable)
        #[arg(short, long = "input")]
        inputs: Vec<PathBuf>,

        /// JSONL file with {"text", "question"?, "answer"?} records
        #[arg(long)]
        jsonl: Option<PathBuf>,

        /// Where to save the knowledge graph (JSON)
        #[arg(short, long, default_value = "kg.json")]
        output: PathBuf,

        /// Use the local Ollama server instead of the hosted endpoint
        #[arg(long, default_value_t = false)]
        local: bool,

        /// Characters per chunk (overrides config)
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Continue from an existing output file
        #[arg(long, default_value_t = false)]
        resume: bool,
    },

    /// Print documents and triples of a saved knowledge graph
    Show {
        /// Knowledge graph file
        #[arg(long, default_value = "kg.json")]
        kg: PathBuf,

        /// Maximum number of documents to print
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Print the graph shape and most frequent relations
    Graph {
        /// Knowledge graph file
        #[arg(long, default_value = "kg.json")]
        kg: PathBuf,

        /// Also list outgoing edges of this entity
        #[arg(short, long)]
        entity: Option<String>,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Extract { .. } => "extract",
            Commands::Show { .. } => "show",
            Commands::Graph { .. } => "graph",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for local development
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("txt2kg=info".parse()?))
        .init();

    let cli = Cli::parse();

    if let Some(addr) = cli.metrics_addr.as_deref() {
        match addr.parse::<SocketAddr>() {
            Ok(socket) => metrics::spawn_metrics_server(socket),
            Err(err) => warn!(%addr, "Invalid metrics address: {}", err),
        }
    }

    let command_name = cli.command.name();
    metrics::record_command_start(command_name);
    let start = Instant::now();

    let result = execute_command(cli.command).await;

    metrics::record_command_result(command_name, start.elapsed(), result.is_ok());

    result
}

async fn execute_command(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Extract {
            inputs,
            jsonl,
            output,
            local,
            chunk_size,
            resume,
        } => {
            if inputs.is_empty() && jsonl.is_none() {
                anyhow::bail!("nothing to extract: pass --input and/or --jsonl");
            }
            let summary = commands::extract_run(ExtractOptions {
                inputs,
                jsonl,
                output: output.clone(),
                local,
                chunk_size,
                resume,
            })
            .await?;
            info!(
                "Saved {} triples from {} documents to {}",
                summary.triples,
                summary.documents,
                output.display()
            );
        }
        Commands::Show { kg, limit } => {
            commands::show::run(&kg, limit)?;
        }
        Commands::Graph { kg, entity } => {
            commands::graph::run(&kg, entity.as_deref())?;
        }
    }

    Ok(())
}
