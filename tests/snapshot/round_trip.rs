//! Write a run, replay it, compare.

use crate::common::*;
use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use stratacache::{BytesCodec, FnPipeline};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Record {
    id: u64,
    label: String,
    weights: Vec<f32>,
}

fn records(n: u64) -> Vec<Record> {
    (0..n)
        .map(|id| Record {
            id,
            label: format!("record-{}", id),
            weights: vec![id as f32 * 0.5; (id % 7) as usize],
        })
        .collect()
}

fn write_then_read(compression: Compression) {
    let t = TestSnapshot::new();
    let snapshot = t.open(t.config().with_compression(compression).with_shard_size_bytes(512));
    let pipeline = IterPipeline::new("records(250)", || records(250));

    let stage = snapshot.apply(&pipeline, MsgpackCodec::<Record>::new()).unwrap();
    assert_eq!(stage.mode(), Mode::Write);
    let written = drain(stage);

    let stage = snapshot.apply(&pipeline, MsgpackCodec::<Record>::new()).unwrap();
    assert_eq!(stage.mode(), Mode::Read);
    assert_eq!(drain(stage), written);
    assert_eq!(written, records(250));
}

#[test]
fn test_uncompressed_round_trip() {
    write_then_read(Compression::None);
}

#[test]
fn test_gzip_round_trip() {
    write_then_read(Compression::Gzip);
}

#[test]
fn test_zstd_round_trip() {
    write_then_read(Compression::Zstd);
}

#[test]
fn test_compressed_shards_are_smaller_on_disk() {
    let t = TestSnapshot::new();
    let snapshot = t.open(t.config().with_compression(Compression::Zstd));
    let pipeline = IterPipeline::new("zeros", || (0..500).map(|_| vec![0u8; 256]));
    drain(snapshot.apply(&pipeline, BytesCodec).unwrap());

    let fp = snapshot.fingerprint(&pipeline, &BytesCodec);
    let RunStatus::Done { metadata } = snapshot.store().probe(&fp).unwrap() else {
        panic!("run should be done");
    };
    for shard in metadata.shards() {
        assert!(shard.stored_size < shard.byte_size);
    }
}

#[test]
fn test_read_mode_survives_a_new_snapshot_instance() {
    let t = TestSnapshot::new();
    let pipeline = IterPipeline::new("range(100)", || 0..100i64);
    drain(t.open(t.config()).apply(&pipeline, FixedI64Codec).unwrap());

    // Fresh handle on the same directory, as another process would have
    let stage = Snapshot::new(t.config())
        .unwrap()
        .apply(&pipeline, FixedI64Codec)
        .unwrap();
    assert_eq!(stage.mode(), Mode::Read);
    assert_eq!(drain(stage), (0..100).collect::<Vec<_>>());
}

#[test]
fn test_fallible_pipeline_round_trip() {
    let t = TestSnapshot::new();
    let snapshot = t.open(t.config());
    let pipeline = FnPipeline::new("parse", || {
        ["1", "2", "3"]
            .into_iter()
            .map(|s| s.parse::<i64>())
            .collect::<Vec<_>>()
    });

    assert_eq!(drain(snapshot.apply(&pipeline, FixedI64Codec).unwrap()), vec![1, 2, 3]);
    let stage = snapshot.apply(&pipeline, FixedI64Codec).unwrap();
    assert_eq!(stage.mode(), Mode::Read);
    assert_eq!(drain(stage), vec![1, 2, 3]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_replay_matches_source(
        elements in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 0..120),
        shard_size in 16u64..512,
        compression in prop_oneof![
            Just(Compression::None),
            Just(Compression::Gzip),
            Just(Compression::Zstd),
        ],
    ) {
        let t = TestSnapshot::new();
        let snapshot = t.open(
            t.config().with_compression(compression).with_shard_size_bytes(shard_size),
        );
        let source = elements.clone();
        let pipeline = IterPipeline::new("generated", move || source.clone());

        let written = drain(snapshot.apply(&pipeline, BytesCodec).unwrap());
        prop_assert_eq!(&written, &elements);

        let stage = snapshot.apply(&pipeline, BytesCodec).unwrap();
        prop_assert_eq!(stage.mode(), Mode::Read);
        prop_assert_eq!(drain(stage), elements);
    }
}
