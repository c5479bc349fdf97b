//! Independent operations running at the same time must not interfere

use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use cauchyrs::{CauchyCoder, RunConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

fn random_object(len: usize, seed: u64) -> Bytes {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; len];
    rng.fill(&mut data[..]);
    Bytes::from(data)
}

#[test]
fn test_shared_coder_across_threads() {
    let coder = Arc::new(CauchyCoder::new(6, 3, 8).unwrap());
    let handles: Vec<_> = (0..8u64)
        .map(|seed| {
            let coder = Arc::clone(&coder);
            thread::spawn(move || {
                let object = random_object(5000 + seed as usize * 113, seed);
                let fragments = coder.encode(&object).unwrap();
                let survivors: Vec<_> = fragments[3..].to_vec();
                let decoded = coder.decode(&survivors, object.len()).unwrap();
                assert_eq!(decoded, object);
                let repaired = coder.repair(&survivors, &[0, 1, 2]).unwrap();
                assert_eq!(repaired, fragments[..3].to_vec());
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_parallel_encode_matches_sequential() {
    let objects: Vec<Bytes> = (0..16u64).map(|seed| random_object(3000, seed)).collect();
    // Different word sizes exercise the lazily built field tables concurrently
    let coders: Vec<CauchyCoder> = [4usize, 8, 12, 16]
        .iter()
        .map(|&w| CauchyCoder::new(4, 2, w).unwrap())
        .collect();

    let sequential: Vec<_> = objects
        .iter()
        .enumerate()
        .map(|(i, object)| coders[i % 4].encode(object).unwrap())
        .collect();

    let pool = RunConfig::new(4, true).thread_pool().unwrap();
    let parallel: Vec<_> = pool.install(|| {
        objects
            .par_iter()
            .enumerate()
            .map(|(i, object)| coders[i % 4].encode(object).unwrap())
            .collect()
    });

    assert_eq!(parallel, sequential);
}
