use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sbi_matrix::batch::solve_all;
use sbi_matrix::formats::ChGraphFile;
use sbi_matrix::request::RequestDocument;
use sbi_matrix::{MatrixConfig, SentinelEncoding};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sbi-matrix")]
#[command(about = "Many-to-many distance matrices on Contraction Hierarchies", long_about = None)]
struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute distance/time matrices for one request or a batch
    Compute {
        /// Leveled graph file (JSON)
        #[arg(long)]
        graph: PathBuf,
        /// Request file: one request object or an array of requests
        #[arg(long)]
        request: PathBuf,
        /// Encoding of cells without a path
        #[arg(long, value_enum, default_value_t = SentinelEncoding::Null, env = "SBI_SENTINEL")]
        sentinel: SentinelEncoding,
        /// Abort a matrix after this many dequeued nodes
        #[arg(long, env = "SBI_MAX_VISITED_NODES")]
        max_visited_nodes: Option<usize>,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Print graph statistics
    Inspect {
        /// Leveled graph file (JSON)
        #[arg(long)]
        graph: PathBuf,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Commands::Compute {
            graph,
            request,
            sentinel,
            max_visited_nodes,
            pretty,
        } => {
            let start = Instant::now();
            let ch_graph = ChGraphFile::read(&graph)
                .with_context(|| format!("failed to load graph {}", graph.display()))?;

            let file = File::open(&request)
                .with_context(|| format!("failed to open request {}", request.display()))?;
            let document: RequestDocument = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("failed to parse request {}", request.display()))?;
            let is_batch = matches!(document, RequestDocument::Batch(_));
            let requests = document.into_requests();

            let config = MatrixConfig {
                max_visited_nodes,
                sentinel,
            };
            let results = solve_all(&ch_graph, &requests, &config);

            let mut responses = Vec::with_capacity(results.len());
            for (idx, result) in results.into_iter().enumerate() {
                responses.push(result.with_context(|| format!("request {idx} failed"))?);
            }

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            let value = match responses.as_slice() {
                [single] if !is_batch => serde_json::to_value(single)?,
                _ => serde_json::to_value(&responses)?,
            };
            if pretty {
                serde_json::to_writer_pretty(&mut out, &value)?;
            } else {
                serde_json::to_writer(&mut out, &value)?;
            }
            writeln!(out)?;

            tracing::info!(
                requests = requests.len(),
                seconds = start.elapsed().as_secs_f64(),
                "done"
            );
        }
        Commands::Inspect { graph } => {
            let ch_graph = ChGraphFile::read(&graph)
                .with_context(|| format!("failed to load graph {}", graph.display()))?;
            let max_level = ch_graph.levels().iter().copied().max().unwrap_or(0);

            println!("Graph: {}", graph.display());
            println!("  Nodes:          {}", ch_graph.n_nodes());
            println!("  Original edges: {}", ch_graph.n_original_edges());
            println!("  Shortcuts:      {}", ch_graph.n_shortcuts());
            println!("  Max level:      {}", max_level);
        }
    }

    Ok(())
}
