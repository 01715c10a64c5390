#![no_main]

use std::io::Cursor;

use chunksig::{HashAlgorithm, Pipeline, PipelineConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (u16, u8, u8, Vec<u8>)| {
    let (chunk_size, workers, tasks, data) = input;
    if data.is_empty() {
        return;
    }

    let config = PipelineConfig::default()
        .with_chunk_size(usize::from(chunk_size).max(1))
        .with_worker_count(usize::from(workers % 8) + 1)
        .with_max_task_count(usize::from(tasks % 8) + 1)
        .with_reserve_memory(0);

    for algorithm in HashAlgorithm::ALL {
        let pipeline = Pipeline::new(config, *algorithm).unwrap();
        let signature = pipeline.run(Cursor::new(&data)).unwrap();

        // Verify: one record per chunk
        assert_eq!(signature.len(), data.len().div_ceil(config.chunk_size()));

        // Verify: records match a sequential digest, in chunk order
        for (record, chunk) in signature.iter().zip(data.chunks(config.chunk_size())) {
            assert_eq!(record, &pipeline.hasher().digest(chunk).unwrap()[..]);
        }
    }
});
