//! Runs that differ in anything fingerprinted never share data.

use crate::common::*;

fn run_count(t: &TestSnapshot) -> usize {
    stratacache::MetadataStore::new(t.root()).list_runs().unwrap().len()
}

#[test]
fn test_changed_definition_starts_a_new_run() {
    let t = TestSnapshot::new();
    let snapshot = t.open(t.config());
    let first = range_pipeline("range(10)", 10);
    let second = IterPipeline::new("range(10).map(double)", || (0..10i64).map(|x| x * 2));

    drain(snapshot.apply(&first, FixedI64Codec).unwrap());
    let stage = snapshot.apply(&second, FixedI64Codec).unwrap();
    assert_eq!(stage.mode(), Mode::Write);
    assert_eq!(drain(stage), (0..10).map(|x| x * 2).collect::<Vec<_>>());

    // Both runs replay their own data
    assert_eq!(drain(snapshot.apply(&first, FixedI64Codec).unwrap()), (0..10).collect::<Vec<_>>());
    assert_eq!(run_count(&t), 2);
}

#[test]
fn test_changed_compression_starts_a_new_run() {
    let t = TestSnapshot::new();
    let pipeline = range_pipeline("range(10)", 10);
    drain(t.open(t.config()).apply(&pipeline, FixedI64Codec).unwrap());

    let gzip = t.open(t.config().with_compression(Compression::Gzip));
    assert_eq!(gzip.apply(&pipeline, FixedI64Codec).unwrap().mode(), Mode::Write);
}

#[test]
fn test_changed_shard_size_starts_a_new_run() {
    let t = TestSnapshot::new();
    let pipeline = range_pipeline("range(10)", 10);
    drain(t.open(t.config()).apply(&pipeline, FixedI64Codec).unwrap());

    let small = t.open(t.config().with_shard_size_bytes(24));
    assert_eq!(small.apply(&pipeline, FixedI64Codec).unwrap().mode(), Mode::Write);
}

#[test]
fn test_changed_path_starts_a_new_run() {
    let t = TestSnapshot::new();
    let pipeline = range_pipeline("range(10)", 10);
    let a = t.open(SnapshotConfig::new(t.dir.path().join("a")));
    let b = t.open(SnapshotConfig::new(t.dir.path().join("b")));

    assert_ne!(
        a.fingerprint(&pipeline, &FixedI64Codec),
        b.fingerprint(&pipeline, &FixedI64Codec)
    );
    drain(a.apply(&pipeline, FixedI64Codec).unwrap());
    assert_eq!(b.apply(&pipeline, FixedI64Codec).unwrap().mode(), Mode::Write);
}

#[test]
fn test_element_codec_is_part_of_the_fingerprint() {
    let t = TestSnapshot::new();
    let snapshot = t.open(t.config());
    let pipeline = range_pipeline("range(10)", 10);
    assert_ne!(
        snapshot.fingerprint(&pipeline, &FixedI64Codec),
        snapshot.fingerprint(&pipeline, &MsgpackCodec::<i64>::new())
    );
}

#[test]
fn test_expiry_and_prefixes_do_not_change_the_fingerprint() {
    let t = TestSnapshot::new();
    let pipeline = range_pipeline("range(10)", 10);
    let base = t.open(t.config()).fingerprint(&pipeline, &FixedI64Codec);
    let tweaked = t
        .open(
            t.config()
                .with_pending_snapshot_expiry_seconds(5)
                .with_reader_path_prefix(t.dir.path().join("r")),
        )
        .fingerprint(&pipeline, &FixedI64Codec);
    assert_eq!(base, tweaked);

    let slash = format!("{}/", t.root().display());
    let trailing = t
        .open(SnapshotConfig::new(slash))
        .fingerprint(&pipeline, &FixedI64Codec);
    assert_eq!(base, trailing);
}
