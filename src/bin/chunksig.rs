//! Command-line front end: hash a file chunk by chunk into a signature file.
//!
//! Usage:
//!     chunksig SOURCE HASHFILE [CHUNK_MB] [ALGORITHM]

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command, value_parser};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chunksig::{
    DEFAULT_MAX_TASK_COUNT, DEFAULT_MAX_TASK_MEMORY, FileSource, HashAlgorithm, Pipeline,
    PipelineConfig, default_worker_count,
};

const MIB: u64 = 1024 * 1024;

fn main() {
    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn cli() -> Command {
    Command::new("chunksig")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Computes a per-chunk digest signature of a file.")
        .arg(
            Arg::new("source")
                .value_name("SOURCE")
                .help("File to hash.")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("hashfile")
                .value_name("HASHFILE")
                .help("Signature output file, created or truncated.")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("chunk-mb")
                .value_name("CHUNK_MB")
                .help("Chunk size in MiB.")
                .default_value("1")
                .value_parser(value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("algorithm")
                .value_name("ALGORITHM")
                .help("Digest algorithm: md5, crc32 or blake3.")
                .default_value("md5"),
        )
        .arg(
            Arg::new("workers")
                .long("workers")
                .short('j')
                .value_name("N")
                .help("Number of worker threads [default: available parallelism]")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("max-tasks")
                .long("max-tasks")
                .value_name("N")
                .help("Maximum number of chunk buffers in flight.")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("max-task-memory")
                .long("max-task-memory")
                .value_name("MB")
                .help("Memory budget for chunk buffers, in MiB.")
                .value_parser(value_parser!(u64).range(1..)),
        )
}

fn pipeline_config(matches: &ArgMatches) -> Result<PipelineConfig> {
    let chunk_mb = matches.get_one::<u64>("chunk-mb").copied().unwrap_or(1);
    let chunk_size = chunk_mb
        .checked_mul(MIB)
        .and_then(|bytes| usize::try_from(bytes).ok())
        .with_context(|| format!("chunk size of {chunk_mb} MB is too large"))?;

    let worker_count = matches
        .get_one::<usize>("workers")
        .copied()
        .unwrap_or_else(default_worker_count);
    let max_task_count = matches
        .get_one::<usize>("max-tasks")
        .copied()
        .unwrap_or(DEFAULT_MAX_TASK_COUNT);
    let max_task_memory = match matches.get_one::<u64>("max-task-memory") {
        Some(mb) => mb.saturating_mul(MIB),
        None => DEFAULT_MAX_TASK_MEMORY,
    };

    PipelineConfig::new(chunk_size, worker_count, max_task_count, max_task_memory)
        .context("invalid pipeline configuration")
}

fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let matches = cli().get_matches();

    let source_path = matches
        .get_one::<PathBuf>("source")
        .context("missing SOURCE")?;
    let hash_path = matches
        .get_one::<PathBuf>("hashfile")
        .context("missing HASHFILE")?;
    let algorithm: HashAlgorithm = matches
        .get_one::<String>("algorithm")
        .map_or("md5", String::as_str)
        .parse()?;
    let config = pipeline_config(&matches)?;

    info!("Source file: {}", source_path.display());
    info!("Hash file: {}", hash_path.display());
    info!("Chunk size: {} bytes", config.chunk_size());
    info!("Algorithm: {}", algorithm);
    info!("Workers: {}", config.worker_count());
    info!(
        "Task budget: {} tasks, {} MB",
        config.max_task_count(),
        config.max_task_memory() / MIB
    );

    let source = FileSource::open(source_path)
        .with_context(|| format!("failed to open source {:?}", source_path))?;
    let file = File::create(hash_path)
        .with_context(|| format!("failed to create hash file {:?}", hash_path))?;
    let mut sink = BufWriter::new(file);

    let pipeline = Pipeline::new(config, algorithm)?;
    let started = Instant::now();
    let signature = pipeline
        .run_to(source, &mut sink)
        .with_context(|| format!("failed to hash {:?}", source_path))?;
    let elapsed = started.elapsed().as_secs_f64();

    let size = std::fs::metadata(source_path)
        .map(|metadata| metadata.len())
        .unwrap_or(0);
    let throughput = if elapsed > 0.0 {
        size as f64 / MIB as f64 / elapsed
    } else {
        0.0
    };

    info!("Chunks: {}", signature.len());
    info!("Done in {:.3} sec, {:.1} MB/s", elapsed, throughput);

    Ok(())
}
