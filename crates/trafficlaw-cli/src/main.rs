mod display;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use trafficlaw_ai::{DEFAULT_MIN_SCORE, DEFAULT_TOP_K, EncoderLoader};
use trafficlaw_engine::{Engine, RetrievalConfig, RetrievalResult};

#[derive(Parser)]
#[command(name = "trafficlaw", version, about = "Look up Vietnamese traffic-violation penalties")]
struct Cli {
    /// Clause corpus (JSON array, or JSON lines with a .jsonl extension)
    #[arg(long, env = "TRAFFICLAW_CORPUS", global = true, default_value = "data/corpus.json")]
    corpus: PathBuf,

    /// Precomputed semantic index directory
    #[arg(long, env = "SEMANTIC_INDEX_DIR", global = true)]
    semantic_index: Option<PathBuf>,

    /// ONNX model directory (model.onnx + tokenizer.json)
    #[cfg(feature = "onnx")]
    #[arg(long, env = "SEMANTIC_MODEL_DIR", global = true)]
    model_dir: Option<PathBuf>,

    /// Semantic hits kept per query
    #[arg(long, env = "SEMANTIC_TOP_K", global = true, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,

    /// Minimum cosine similarity for a semantic hit
    #[arg(long, env = "SEMANTIC_MIN_SCORE", global = true, default_value_t = DEFAULT_MIN_SCORE)]
    min_score: f32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer any question: definitions, obligations, or penalties
    Ask {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// Look up the penalty clause for a violation
    Query {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        /// Retry with synonym rewrites when nothing matches
        #[arg(long)]
        variations: bool,
        #[arg(long)]
        json: bool,
    },
    /// Look up a definition or rule in the statutes
    Concept {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// Answer every line of a file
    Batch {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Corpus and index statistics
    Stats {
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("trafficlaw v{}", env!("CARGO_PKG_VERSION"));
    let engine = build_engine(&cli)?;

    match cli.command {
        Command::Ask { query, json } => {
            let result = engine.lookup(&query.join(" "));
            emit(&result, json)?;
        }
        Command::Query {
            query,
            variations,
            json,
        } => {
            let query = query.join(" ");
            let result = if variations {
                engine.retrieve_with_variations(&query)
            } else {
                engine.retrieve(&query)
            };
            emit(&result, json)?;
        }
        Command::Concept { query, json } => {
            let result = engine.retrieve_concept(&query.join(" "));
            emit(&result, json)?;
        }
        Command::Batch { file, json } => {
            run_batch(Arc::new(engine), &file, json).await?;
        }
        Command::Stats { json } => {
            let stats = engine.stats();
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                display::print_stats(&stats);
            }
        }
    }

    Ok(())
}

fn build_engine(cli: &Cli) -> anyhow::Result<Engine> {
    let config = RetrievalConfig {
        semantic_top_k: cli.top_k,
        semantic_min_score: cli.min_score,
    };
    let engine = Engine::open(&cli.corpus, config)
        .with_context(|| format!("loading corpus {}", cli.corpus.display()))?;

    let Some(index_dir) = &cli.semantic_index else {
        return Ok(engine);
    };
    match encoder_loader(cli) {
        Some(loader) => Ok(engine.with_semantic_dir(index_dir, loader)),
        None => {
            warn!(
                index = %index_dir.display(),
                "semantic index given without an encoder; using tag matching only"
            );
            Ok(engine)
        }
    }
}

#[cfg(feature = "onnx")]
fn encoder_loader(cli: &Cli) -> Option<EncoderLoader> {
    use trafficlaw_ai::{Encoder, OnnxEncoder};

    let dir = cli.model_dir.clone()?;
    Some(Box::new(move || -> anyhow::Result<Box<dyn Encoder>> {
        Ok(Box::new(OnnxEncoder::load(&dir)?))
    }))
}

#[cfg(not(feature = "onnx"))]
fn encoder_loader(_cli: &Cli) -> Option<EncoderLoader> {
    None
}

fn emit(result: &RetrievalResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        display::print_result(result);
    }
    Ok(())
}

/// Queries run on the blocking pool; results print in input order.
async fn run_batch(engine: Arc<Engine>, file: &Path, json: bool) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("reading queries from {}", file.display()))?;
    let queries: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    info!(count = queries.len(), "running batch");

    let handles: Vec<_> = queries
        .iter()
        .cloned()
        .map(|query| {
            let engine = Arc::clone(&engine);
            tokio::task::spawn_blocking(move || engine.lookup(&query))
        })
        .collect();

    for (query, handle) in queries.iter().zip(handles) {
        let result = handle.await.context("batch worker panicked")?;
        if json {
            let line = serde_json::json!({ "query": query, "result": result });
            println!("{line}");
        } else {
            println!("> {query}");
            display::print_result(&result);
        }
    }
    Ok(())
}
