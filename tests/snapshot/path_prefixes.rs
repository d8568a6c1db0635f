//! Reader and writer path prefixes.

use crate::common::*;

#[test]
fn test_shards_follow_the_writer_prefix() {
    let t = TestSnapshot::new();
    let prefix = t.dir.path().join("staging");
    let config = t
        .config()
        .with_writer_path_prefix(&prefix)
        .with_reader_path_prefix(&prefix)
        .with_shard_size_bytes(120);
    let snapshot = t.open(config);
    let pipeline = range_pipeline("range(50)", 50);

    drain(snapshot.apply(&pipeline, FixedI64Codec).unwrap());

    // Metadata stays under the unprefixed path, shards move under the prefix
    let fp = snapshot.fingerprint(&pipeline, &FixedI64Codec);
    assert!(t.root().join(fp.as_str()).join("snapshot.metadata").exists());
    assert!(files_with_extension(&t.root(), "snapshot").is_empty());
    assert_eq!(files_with_extension(&prefix, "snapshot").len(), 5);

    let stage = snapshot.apply(&pipeline, FixedI64Codec).unwrap();
    assert_eq!(stage.mode(), Mode::Read);
    assert_eq!(drain(stage), (0..50).collect::<Vec<_>>());
}

#[test]
fn test_reader_prefix_points_at_a_mirror() {
    let t = TestSnapshot::new();
    let written_to = t.dir.path().join("local");
    let mirror = t.dir.path().join("mirror");
    let pipeline = range_pipeline("range(30)", 30);

    let writer = t.open(t.config().with_writer_path_prefix(&written_to));
    drain(writer.apply(&pipeline, FixedI64Codec).unwrap());

    // Copy the shard tree to the mirror, then delete the original
    for shard in files_with_extension(&written_to, "snapshot") {
        let relative = shard.strip_prefix(&written_to).unwrap();
        let target = mirror.join(relative);
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::copy(&shard, &target).unwrap();
    }
    std::fs::remove_dir_all(&written_to).unwrap();

    let reader = t.open(t.config().with_reader_path_prefix(&mirror));
    let stage = reader.apply(&pipeline, FixedI64Codec).unwrap();
    assert_eq!(stage.mode(), Mode::Read);
    assert_eq!(drain(stage), (0..30).collect::<Vec<_>>());
}
