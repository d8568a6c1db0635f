//! Command results → human/json string formatting.
//!
//! Two modes:
//! - **Human** (default): aligned tables and `key: value` lines
//! - **JSON** (`--json`): `serde_json::to_string_pretty`

use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use stratacache_core::{Fingerprint, RunMetadata, RunStatus};
use stratacache_durability::VerifyReport;

/// Output formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Format a list of runs.
pub fn format_runs(runs: &[(Fingerprint, RunStatus)], mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => pretty(&Value::Array(
            runs.iter().map(|(fp, status)| run_json(fp, status)).collect(),
        )),
        OutputMode::Human => {
            if runs.is_empty() {
                return "(no runs)".to_string();
            }
            let mut out = format!(
                "{:<32}  {:<11}  {:>6}  {:>10}  {}",
                "FINGERPRINT", "STATE", "SHARDS", "ELEMENTS", "OWNER / AGE"
            );
            for (fp, status) in runs {
                out.push('\n');
                out.push_str(&run_line(fp, status));
            }
            out
        }
    }
}

fn run_line(fp: &Fingerprint, status: &RunStatus) -> String {
    match status {
        RunStatus::Absent => format!("{:<32}  {:<11}", fp, status.as_str()),
        RunStatus::Writing {
            owner, age_seconds, ..
        } => format!(
            "{:<32}  {:<11}  {:>6}  {:>10}  {} ({}s)",
            fp,
            status.as_str(),
            "-",
            "-",
            owner,
            age_seconds
        ),
        RunStatus::Done { metadata } => format!(
            "{:<32}  {:<11}  {:>6}  {:>10}  {}",
            fp,
            status.as_str(),
            metadata.shards().len(),
            metadata.element_count().unwrap_or(0),
            metadata.owner
        ),
    }
}

fn run_json(fp: &Fingerprint, status: &RunStatus) -> Value {
    match status {
        RunStatus::Absent => json!({ "fingerprint": fp, "state": status.as_str() }),
        RunStatus::Writing {
            owner,
            age_seconds,
            expired,
        } => json!({
            "fingerprint": fp,
            "state": status.as_str(),
            "owner": owner,
            "age_seconds": age_seconds,
            "expired": expired,
        }),
        RunStatus::Done { metadata } => json!({
            "fingerprint": fp,
            "state": status.as_str(),
            "owner": metadata.owner,
            "shards": metadata.shards().len(),
            "elements": metadata.element_count(),
        }),
    }
}

/// Format a metadata record.
pub fn format_record(metadata: &RunMetadata, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => serde_json::to_string_pretty(metadata)
            .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e)),
        OutputMode::Human => {
            let mut lines = vec![
                format!("fingerprint:  {}", metadata.fingerprint),
                format!("state:        {}", metadata.state_str()),
                format!("owner:        {}", metadata.owner),
                format!("created:      {}", format_timestamp(metadata.created_at)),
                format!("compression:  {}", metadata.compression),
                format!("shard size:   {} bytes", metadata.shard_size_bytes),
            ];
            if let stratacache_core::RunState::Done {
                shards,
                element_count,
                finalized_at,
            } = &metadata.state
            {
                lines.push(format!("finalized:    {}", format_timestamp(*finalized_at)));
                lines.push(format!("elements:     {}", element_count));
                lines.push(format!("shards:       {}", shards.len()));
                for shard in shards {
                    lines.push(format!(
                        "  {:08}  {:>10} elements  {:>12} bytes  {:>12} stored  crc {:08x}",
                        shard.index,
                        shard.element_count,
                        shard.byte_size,
                        shard.stored_size,
                        shard.checksum
                    ));
                }
            }
            lines.join("\n")
        }
    }
}

/// Format a successful verification.
pub fn format_verify(fp: &Fingerprint, report: &VerifyReport, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => pretty(&json!({
            "fingerprint": fp,
            "ok": true,
            "shards": report.shards,
            "elements": report.elements,
            "byte_size": report.byte_size,
            "stored_size": report.stored_size,
        })),
        OutputMode::Human => format!(
            "OK {}: {} shards, {} elements, {} bytes ({} stored)",
            fp, report.shards, report.elements, report.byte_size, report.stored_size
        ),
    }
}

/// Format an error.
pub fn format_error(err: &anyhow::Error, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => pretty(&json!({ "error": format!("{:#}", err) })),
        OutputMode::Human => format!("(error) {:#}", err),
    }
}

/// Render epoch seconds as RFC 3339 (UTC).
pub fn format_timestamp(secs: u64) -> String {
    match Utc.timestamp_opt(secs as i64, 0).single() {
        Some(dt) => dt.to_rfc3339(),
        None => secs.to_string(),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratacache_core::{Compression, OwnerId, ShardDescriptor};

    fn done_record() -> RunMetadata {
        RunMetadata::writing(
            Fingerprint::from_u128(0xabc),
            OwnerId::from_bytes([7; 16]),
            0,
            Compression::Gzip,
            1024,
        )
        .into_done(
            vec![ShardDescriptor {
                index: 0,
                element_count: 3,
                byte_size: 30,
                stored_size: 20,
                compression: Compression::Gzip,
                checksum: 0xdeadbeef,
            }],
            60,
        )
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_format_record_human() {
        let out = format_record(&done_record(), OutputMode::Human);
        assert!(out.contains("state:        done"));
        assert!(out.contains("compression:  gzip"));
        assert!(out.contains("crc deadbeef"));
        assert!(out.contains("1970-01-01T00:01:00+00:00"));
    }

    #[test]
    fn test_format_runs_json() {
        let fp = Fingerprint::from_u128(1);
        let runs = vec![
            (
                fp.clone(),
                RunStatus::Writing {
                    owner: OwnerId::from_bytes([1; 16]),
                    age_seconds: 90,
                    expired: true,
                },
            ),
            (
                done_record().fingerprint,
                RunStatus::Done {
                    metadata: done_record(),
                },
            ),
        ];
        let value: Value = serde_json::from_str(&format_runs(&runs, OutputMode::Json)).unwrap();
        assert_eq!(value[0]["state"], "expired");
        assert_eq!(value[0]["fingerprint"], fp.as_str());
        assert_eq!(value[1]["elements"], 3);
    }

    #[test]
    fn test_format_runs_empty() {
        assert_eq!(format_runs(&[], OutputMode::Human), "(no runs)");
    }

    #[test]
    fn test_format_error_json() {
        let err = anyhow::anyhow!("bad thing");
        let value: Value =
            serde_json::from_str(&format_error(&err, OutputMode::Json)).unwrap();
        assert_eq!(value["error"], "bad thing");
    }
}
