//! File signature example.
//!
//! Run with:
//!     cargo run --example hash_file -- /path/to/file [md5|crc32|blake3]

use std::env;

use chunksig::{FileSource, HashAlgorithm, Pipeline, PipelineConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| "Cargo.toml".to_string());
    let algorithm: HashAlgorithm = env::args()
        .nth(2)
        .unwrap_or_else(|| "md5".to_string())
        .parse()?;

    println!("Hashing file: {}\n", path);

    // Small chunks so even tiny files show several records
    let config = PipelineConfig::default().with_chunk_size(4 * 1024);
    let pipeline = Pipeline::new(config, algorithm)?;

    let source = FileSource::open(&path)?;
    let signature = pipeline.run(source)?;

    for (index, record) in signature.iter().enumerate() {
        println!(
            "Chunk {:>6}: offset={:>10}, {}={}",
            index,
            index * config.chunk_size(),
            signature.algorithm(),
            signature.to_hex(index).unwrap_or_default()
        );
        debug_assert_eq!(record.len(), signature.digest_size());
    }

    println!(
        "\nTotal: {} chunks, {} signature bytes",
        signature.len(),
        signature.as_bytes().len()
    );

    Ok(())
}
