use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sparsedex_core::persist::{load_meta, IndexPaths};
use sparsedex_core::{Document, IndexService, ServiceConfig};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Documents handed to the service per call.
const BATCH_SIZE: usize = 512;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query a sparse-vector TF-IDF index workspace", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index JSON/JSONL documents ({"id", "text", "tags"?}) from a file or directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: PathBuf,
        /// Workspace directory
        #[arg(long)]
        workspace: PathBuf,
        /// Optional JSON service config
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Run a query against a persisted workspace and print the matches as JSON
    Query {
        #[arg(long)]
        workspace: PathBuf,
        #[arg(long)]
        q: String,
        /// Number of matches; 0 returns every candidate
        #[arg(long)]
        top_k: Option<usize>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print workspace metadata
    Stats {
        #[arg(long)]
        workspace: PathBuf,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, workspace, config } => {
            let config = ServiceConfig::load_or_default(config.as_deref())?;
            build_index(&input, &workspace, config)
        }
        Commands::Query { workspace, q, top_k, config } => {
            let config = ServiceConfig::load_or_default(config.as_deref())?;
            let service = IndexService::open(&workspace, config)?;
            let results = service.search_texts(&[q], top_k)?;
            println!("{}", serde_json::to_string_pretty(&results)?);
            Ok(())
        }
        Commands::Stats { workspace } => {
            let meta = load_meta(&IndexPaths::new(&workspace))
                .with_context(|| format!("no index metadata in {}", workspace.display()))?;
            println!("{}", serde_json::to_string_pretty(&meta)?);
            Ok(())
        }
    }
}

fn input_files(input: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    }
    files
}

fn build_index(input: &Path, workspace: &Path, config: ServiceConfig) -> Result<()> {
    let mut service = IndexService::open(workspace, config)?;
    let files = input_files(input);
    if files.is_empty() {
        tracing::warn!(input = %input.display(), "no json/jsonl input found");
    }

    let mut total = 0;
    for file in files {
        let docs = if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file)?
        } else {
            read_json(&file)?
        };
        for batch in docs.chunks(BATCH_SIZE) {
            total += service.index_documents(batch)?;
        }
        tracing::info!(file = %file.display(), docs = docs.len(), "ingested file");
    }

    let meta = service.close()?;
    tracing::info!(total, num_docs = meta.num_docs, workspace = %workspace.display(), "index build complete");
    Ok(())
}

fn read_jsonl(file: &Path) -> Result<Vec<Document>> {
    let reader = BufReader::new(File::open(file)?);
    let mut docs = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: Document = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", file.display(), lineno + 1))?;
        docs.push(doc);
    }
    Ok(docs)
}

fn read_json(file: &Path) -> Result<Vec<Document>> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)
        .with_context(|| format!("parsing {}", file.display()))?;
    let docs = match json {
        serde_json::Value::Array(arr) => arr
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Document>, _>>()?,
        serde_json::Value::Object(_) => vec![serde_json::from_value(json)?],
        _ => Vec::new(),
    };
    Ok(docs)
}
