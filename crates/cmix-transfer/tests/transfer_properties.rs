//! Property-based tests for file transfer
//!
//! 1. **Delivery**: any file sent over a lossy, reordering channel is
//!    reassembled byte for byte once every part is acknowledged
//! 2. **Order independence**: the receiver's result does not depend on part
//!    arrival order
//! 3. **Split**: concatenating the parts yields the original file

use std::time::{Duration, Instant};

use cmix_transfer::{
    Received, ReceivedTransfer, SendAction, SentState, SentTransfer, TransferConfig, split_file,
};
use proptest::prelude::*;
use rand::{SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;

fn config(part_size: usize) -> TransferConfig {
    TransferConfig {
        part_size,
        retransmit_timeout: Duration::from_secs(1),
        max_retries: 64,
        max_in_flight: 8,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_split_concatenates(file in prop::collection::vec(any::<u8>(), 0..2048), part_size in 1usize..300) {
        let parts = split_file(&file, part_size).unwrap();
        prop_assert!(parts.iter().all(|p| !p.is_empty() && p.len() <= part_size));
        prop_assert_eq!(parts.concat(), file);
    }

    #[test]
    fn prop_lossy_channel_delivers(
        file in prop::collection::vec(any::<u8>(), 1..2048),
        part_size in 16usize..256,
        seed in any::<u64>(),
        drop_percent in 0u32..50,
    ) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut net = ChaCha8Rng::seed_from_u64(seed ^ 0xfeed);
        let t0 = Instant::now();

        let mut tx = SentTransfer::new(&mut rng, &file, config(part_size)).unwrap();
        let mut rx = ReceivedTransfer::new(tx.info()).unwrap();
        tx.arm().unwrap();

        let mut delivered = None;
        for round in 0..2000u32 {
            let now = t0 + Duration::from_secs(u64::from(round));
            let mut parts: Vec<_> = tx
                .tick(&mut rng, now)
                .unwrap()
                .into_iter()
                .filter_map(|a| match a {
                    SendAction::SendPart(p) => Some(p),
                    _ => None,
                })
                .collect();
            parts.shuffle(&mut net);

            for p in parts {
                if rand::Rng::gen_range(&mut net, 0..100) < drop_percent {
                    continue;
                }
                match rx.receive(&p.fingerprint, &p.part.ciphertext, &p.part.nonce, p.part.mac.as_bytes()).unwrap() {
                    Received::Complete { file } => delivered = Some(file),
                    Received::Part { .. } | Received::Duplicate { .. } => {},
                }
                tx.ack(p.index).unwrap();
            }
            if tx.state() == SentState::Completed {
                break;
            }
        }

        prop_assert_eq!(tx.state(), SentState::Completed);
        prop_assert_eq!(delivered, Some(file));
    }
}
