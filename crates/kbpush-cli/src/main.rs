//! kbpush CLI: push a knowledge base into a Pinecone index

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use kbpush_core::ingest::ProgressEvent;
use kbpush_core::{
    Config, DryRunIndex, Embedder, IngestStats, Ingester, KbError, PineconeIndex, TextEmbedder,
    VectorIndex,
};

#[derive(Parser)]
#[command(name = "kbpush")]
#[command(about = "Chunk, embed and upload a directory tree to a Pinecone index", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (JSON); missing file means defaults
    #[arg(short, long, default_value = "kbpush.json")]
    config: PathBuf,

    /// Directory to ingest (default: knowledgebase)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Lines per chunk (default: 200)
    #[arg(short = 'n', long)]
    chunk_size: Option<usize>,

    /// Embedding model (default: all-MiniLM-L6-v2)
    #[arg(short, long)]
    model: Option<String>,

    /// Directory for downloaded model files
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Pinecone API key
    #[arg(long, env = "PINECONE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Pinecone environment (accepted, not used for host lookup)
    #[arg(long, env = "PINECONE_ENV")]
    environment: Option<String>,

    /// Pinecone index name
    #[arg(long, env = "PINECONE_INDEX")]
    index: Option<String>,

    /// Index host, skips the host lookup
    #[arg(long, env = "PINECONE_HOST")]
    host: Option<String>,

    /// Namespace to write into
    #[arg(long, env = "PINECONE_NAMESPACE")]
    namespace: Option<String>,

    /// Chunk and embed everything but do not upload
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    /// Config file values, overridden by flags and environment.
    fn resolve_config(&self) -> Result<Config> {
        let mut config = Config::load(&self.config)
            .with_context(|| format!("Failed to read config {}", self.config.display()))?;

        if let Some(root) = &self.root {
            config.root_dir = root.clone();
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if self.cache_dir.is_some() {
            config.cache_dir = self.cache_dir.clone();
        }

        let pinecone = &mut config.pinecone;
        override_with(&mut pinecone.api_key, &self.api_key);
        override_with(&mut pinecone.environment, &self.environment);
        override_with(&mut pinecone.index, &self.index);
        override_with(&mut pinecone.host, &self.host);
        override_with(&mut pinecone.namespace, &self.namespace);

        config.validate()?;
        Ok(config)
    }
}

fn override_with(target: &mut Option<String>, value: &Option<String>) {
    if value.is_some() {
        target.clone_from(value);
    }
}

fn main() -> Result<()> {
    // Environment from .env, if present, before clap reads env fallbacks
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    let embedder = Embedder::new(&config).context("Failed to load embedding model")?;

    let stats = if cli.dry_run {
        let stats = ingest(&config, embedder, DryRunIndex, true)?;
        println!("Dry run complete, nothing uploaded.");
        stats
    } else {
        let index =
            PineconeIndex::connect(&config.pinecone).context("Failed to connect to Pinecone")?;
        let stats = ingest(&config, embedder, index, false)?;
        println!("Done uploading all code chunks to Pinecone.");
        stats
    };

    print_stats(&stats);

    Ok(())
}

fn ingest<E: TextEmbedder, I: VectorIndex>(
    config: &Config,
    embedder: E,
    index: I,
    dry_run: bool,
) -> Result<IngestStats> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Scanning files...");

    let mut ingester = Ingester::new(config, embedder, index)?;

    // Console lines go through suspend so they survive a hidden spinner
    ingester.set_progress_callback(Box::new({
        let pb = pb.clone();
        move |event| match event {
            ProgressEvent::File { path } => {
                pb.set_message(path.to_string());
                pb.tick();
            }
            ProgressEvent::Uploaded {
                id,
                file,
                start_line,
                end_line,
            } => pb.suspend(|| {
                println!("{}", format_uploaded(id, file, start_line, end_line, dry_run))
            }),
            ProgressEvent::Failed {
                file,
                start_line,
                end_line,
                error,
            } => pb.suspend(|| println!("{}", format_failed(file, start_line, end_line, error))),
        }
    }));

    let result = ingester
        .run()
        .with_context(|| format!("Ingestion of {} aborted", config.root_dir.display()));

    pb.finish_and_clear();

    result
}

/// Console line for a stored chunk. Dry runs only embed.
fn format_uploaded(
    id: &str,
    file: &str,
    start_line: usize,
    end_line: usize,
    dry_run: bool,
) -> String {
    let verb = if dry_run { "Embedded" } else { "Uploaded" };
    format!("{} chunk {} from {}:{}-{}", verb, id, file, start_line, end_line)
}

fn format_failed(file: &str, start_line: usize, end_line: usize, error: &KbError) -> String {
    format!("Error processing {}:{}-{}: {}", file, start_line, end_line, error)
}

fn print_stats(stats: &IngestStats) {
    println!("  Files processed: {}", stats.files);
    println!("  Chunks found:    {}", stats.chunks);
    println!("  Blank skipped:   {}", stats.blank_chunks);
    println!("  Uploaded:        {}", stats.uploaded);
    println!("  Failed:          {}", stats.failed);
}
