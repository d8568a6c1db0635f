//! End-to-end tests for the snapshot cache.
//!
//! Unit tests in crates/*/src cover frames, codecs, the metadata store and
//! mode selection in isolation. These tests drive whole runs through the
//! public facade: write, replay, and the on-disk results in between.

#[path = "../common/mod.rs"]
mod common;

mod fingerprint_isolation;
mod path_prefixes;
mod round_trip;
mod sharding;
