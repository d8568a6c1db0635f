//! Shard boundaries and inventory.

use crate::common::*;

#[test]
fn test_thousand_elements_make_five_shards() {
    // 8-byte elements frame to 12 bytes; 200 frames fill a 2400-byte shard
    let t = TestSnapshot::new();
    let snapshot = t.open(t.config().with_shard_size_bytes(2400));
    let pipeline = range_pipeline("range(1000)", 1000);

    let stage = snapshot.apply(&pipeline, FixedI64Codec).unwrap();
    assert_eq!(stage.mode(), Mode::Write);
    assert_eq!(drain(stage), (0..1000).collect::<Vec<_>>());

    let fp = snapshot.fingerprint(&pipeline, &FixedI64Codec);
    let RunStatus::Done { metadata } = snapshot.store().probe(&fp).unwrap() else {
        panic!("run should be done");
    };
    assert_eq!(metadata.shards().len(), 5);
    assert_eq!(metadata.element_count(), Some(1000));
    for (i, shard) in metadata.shards().iter().enumerate() {
        assert_eq!(shard.index, i as u64);
        assert_eq!(shard.element_count, 200);
        assert_eq!(shard.byte_size, 2400);
    }
    assert_eq!(files_with_extension(&t.root(), "snapshot").len(), 5);

    let stage = snapshot.apply(&pipeline, FixedI64Codec).unwrap();
    assert_eq!(stage.mode(), Mode::Read);
    assert_eq!(drain(stage), (0..1000).collect::<Vec<_>>());
}

#[test]
fn test_trailing_partial_shard_is_kept() {
    let t = TestSnapshot::new();
    let snapshot = t.open(t.config().with_shard_size_bytes(2400));
    let pipeline = range_pipeline("range(1050)", 1050);
    drain(snapshot.apply(&pipeline, FixedI64Codec).unwrap());

    let fp = snapshot.fingerprint(&pipeline, &FixedI64Codec);
    let RunStatus::Done { metadata } = snapshot.store().probe(&fp).unwrap() else {
        panic!("run should be done");
    };
    let counts: Vec<u64> = metadata.shards().iter().map(|s| s.element_count).collect();
    assert_eq!(counts, vec![200, 200, 200, 200, 200, 50]);
}

#[test]
fn test_oversized_element_gets_its_own_shard() {
    let t = TestSnapshot::new();
    let snapshot = t.open(t.config().with_shard_size_bytes(64));
    let pipeline = IterPipeline::new("mixed", || vec![vec![1u8; 4], vec![2u8; 1000], vec![3u8; 4]]);
    drain(snapshot.apply(&pipeline, stratacache::BytesCodec).unwrap());

    let fp = snapshot.fingerprint(&pipeline, &stratacache::BytesCodec);
    let RunStatus::Done { metadata } = snapshot.store().probe(&fp).unwrap() else {
        panic!("run should be done");
    };
    let counts: Vec<u64> = metadata.shards().iter().map(|s| s.element_count).collect();
    assert_eq!(counts, vec![2, 1]);

    let replay = drain(snapshot.apply(&pipeline, stratacache::BytesCodec).unwrap());
    assert_eq!(replay[1].len(), 1000);
}

#[test]
fn test_unlisted_shard_files_are_ignored() {
    let t = TestSnapshot::new();
    let snapshot = t.open(t.config().with_shard_size_bytes(2400));
    let pipeline = range_pipeline("range(10)", 10);
    drain(snapshot.apply(&pipeline, FixedI64Codec).unwrap());

    // A stray shard left behind by some abandoned writer
    let shard = files_with_extension(&t.root(), "snapshot").remove(0);
    std::fs::write(shard.with_file_name("00000007.snapshot"), b"junk").unwrap();

    let stage = snapshot.apply(&pipeline, FixedI64Codec).unwrap();
    assert_eq!(drain(stage), (0..10).collect::<Vec<_>>());
}

#[test]
fn test_damaged_shard_surfaces_a_checksum_error() {
    let t = TestSnapshot::new();
    let snapshot = t.open(t.config().with_shard_size_bytes(240));
    let pipeline = range_pipeline("range(100)", 100);
    drain(snapshot.apply(&pipeline, FixedI64Codec).unwrap());

    let shards = files_with_extension(&t.root(), "snapshot");
    let mut bytes = std::fs::read(&shards[2]).unwrap();
    bytes[5] ^= 0xff;
    std::fs::write(&shards[2], bytes).unwrap();

    let results: Vec<_> = snapshot.apply(&pipeline, FixedI64Codec).unwrap().collect();
    // Two intact shards of 20 elements, then the error, then nothing
    assert_eq!(results.len(), 41);
    assert!(results[..40].iter().all(|r| r.is_ok()));
    assert!(matches!(
        results[40],
        Err(Error::ChecksumMismatch { shard: 2, .. })
    ));
}
