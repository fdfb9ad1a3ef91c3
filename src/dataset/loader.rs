//! Line-delimited dataset loading.
//!
//! Reads the input file (one JSON record per line) into a `Dataset`,
//! validating every line as it goes. Loading is all-or-nothing: the first
//! bad line aborts the load and no partial dataset is ever returned.

use crate::models::{Dataset, RawRecord, Record, Status};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Why a dataset could not be loaded. Every variant is fatal.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The input path does not exist.
    #[error("dataset file not found: {path}")]
    NotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("failed to read dataset file: {path}")]
    Io {
        /// Path being read when the failure happened.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line is not one well-formed record.
    #[error("malformed record on line {line}: {reason}")]
    Malformed {
        /// 1-based line number in the input file.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },

    /// The file parsed cleanly but holds no records, so no percentage can
    /// be computed over it.
    #[error("dataset contains no records: {path}")]
    Empty {
        /// Path of the empty input.
        path: PathBuf,
    },
}

/// Load the dataset at `path`, deriving each record's status on the way in.
///
/// The input file handle lives only for the duration of this call. With
/// `show_progress`, a byte-level progress bar tracks the read.
pub fn load_dataset(path: &Path, show_progress: bool) -> Result<Dataset, DatasetError> {
    if !path.exists() {
        return Err(DatasetError::NotFound {
            path: path.to_path_buf(),
        });
    }

    debug!("Reading dataset from {}", path.display());

    let file = File::open(path).map_err(|e| DatasetError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let total_bytes = file.metadata().map(|m| m.len()).unwrap_or(0);
    let progress = if show_progress && total_bytes > 0 {
        let pb = ProgressBar::new(total_bytes);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes}")
                .unwrap()
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let reader = BufReader::new(file);
    let mut records = Vec::new();

    for (number, line) in reader.lines().enumerate() {
        let line_no = number + 1;
        // lines() yields invalid UTF-8 as an InvalidData error; that is
        // bad line content, not a failed read.
        let line = line.map_err(|e| match e.kind() {
            ErrorKind::InvalidData => DatasetError::Malformed {
                line: line_no,
                reason: e.to_string(),
            },
            _ => DatasetError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        if let Some(ref pb) = progress {
            pb.inc(line.len() as u64 + 1);
        }

        // Tolerate blank lines (trailing newline) without losing numbering.
        if line.trim().is_empty() {
            continue;
        }

        let raw: RawRecord =
            serde_json::from_str(&line).map_err(|e| DatasetError::Malformed {
                line: line_no,
                reason: e.to_string(),
            })?;

        records.push(validate(raw, line_no)?);
    }

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    if records.is_empty() {
        return Err(DatasetError::Empty {
            path: path.to_path_buf(),
        });
    }

    info!("Loaded {} records from {}", records.len(), path.display());
    Ok(Dataset { records })
}

/// Promote a raw line to a validated record, deriving its status.
fn validate(raw: RawRecord, line: usize) -> Result<Record, DatasetError> {
    let status = Status::from_label(raw.label).ok_or_else(|| DatasetError::Malformed {
        line,
        reason: format!("label must be 0 or 1, got {}", raw.label),
    })?;

    Ok(Record {
        label: raw.label,
        status,
        attack_cat: raw.attack_cat,
        proto: raw.proto,
        service: raw.service,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_input(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("conn.json");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.json");

        let err = load_dataset(&path, false).unwrap_err();
        assert!(matches!(err, DatasetError::NotFound { .. }));
    }

    #[test]
    fn test_valid_file_loads_with_derived_status() {
        let dir = TempDir::new().unwrap();
        let path = write_input(
            &dir,
            concat!(
                "{\"label\":0,\"attack_cat\":\"\",\"proto\":\"tcp\",\"service\":\"-\"}\n",
                "{\"label\":1,\"attack_cat\":\"dos\",\"proto\":\"tcp\",\"service\":\"http\"}\n",
            ),
        );

        let dataset = load_dataset(&path, false).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records[0].status, Status::Normal);
        assert_eq!(dataset.records[1].status, Status::Attack);
        assert_eq!(dataset.records[1].attack_cat.as_deref(), Some("dos"));
    }

    #[test]
    fn test_missing_attack_cat_is_allowed() {
        let dir = TempDir::new().unwrap();
        let path = write_input(
            &dir,
            "{\"label\":1,\"proto\":\"udp\",\"service\":\"dns\"}\n",
        );

        let dataset = load_dataset(&path, false).unwrap();
        assert_eq!(dataset.records[0].attack_cat, None);
    }

    #[test]
    fn test_bad_json_reports_line_number() {
        let dir = TempDir::new().unwrap();
        let path = write_input(
            &dir,
            concat!(
                "{\"label\":0,\"attack_cat\":\"\",\"proto\":\"tcp\",\"service\":\"-\"}\n",
                "not json at all\n",
            ),
        );

        let err = load_dataset(&path, false).unwrap_err();
        match err {
            DatasetError::Malformed { line, .. } => assert_eq!(line, 2),
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_utf8_line_is_malformed_with_line_number() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conn.json");
        let mut bytes =
            b"{\"label\":0,\"attack_cat\":\"\",\"proto\":\"tcp\",\"service\":\"-\"}\n".to_vec();
        bytes.extend_from_slice(&[0xFF, 0xFE, 0xFD, b'\n']);
        fs::write(&path, bytes).unwrap();

        let err = load_dataset(&path, false).unwrap_err();
        match err {
            DatasetError::Malformed { line, .. } => assert_eq!(line, 2),
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_required_field_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = write_input(&dir, "{\"label\":0,\"service\":\"-\"}\n");

        let err = load_dataset(&path, false).unwrap_err();
        match err {
            DatasetError::Malformed { line, reason } => {
                assert_eq!(line, 1);
                assert!(reason.contains("proto"), "reason was: {reason}");
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn test_out_of_range_label_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = write_input(
            &dir,
            "{\"label\":3,\"attack_cat\":\"dos\",\"proto\":\"tcp\",\"service\":\"-\"}\n",
        );

        let err = load_dataset(&path, false).unwrap_err();
        match err {
            DatasetError::Malformed { line, reason } => {
                assert_eq!(line, 1);
                assert!(reason.contains("label"), "reason was: {reason}");
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_input(&dir, "");

        let err = load_dataset(&path, false).unwrap_err();
        assert!(matches!(err, DatasetError::Empty { .. }));
    }

    #[test]
    fn test_blank_lines_only_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_input(&dir, "\n   \n\n");

        let err = load_dataset(&path, false).unwrap_err();
        assert!(matches!(err, DatasetError::Empty { .. }));
    }

    #[test]
    fn test_blank_lines_between_records_keep_numbering() {
        let dir = TempDir::new().unwrap();
        let path = write_input(
            &dir,
            concat!(
                "{\"label\":0,\"attack_cat\":\"\",\"proto\":\"tcp\",\"service\":\"-\"}\n",
                "\n",
                "{\"label\":9,\"attack_cat\":\"\",\"proto\":\"tcp\",\"service\":\"-\"}\n",
            ),
        );

        let err = load_dataset(&path, false).unwrap_err();
        match err {
            DatasetError::Malformed { line, .. } => assert_eq!(line, 3),
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn test_sample_fixture_loads() {
        let dataset =
            load_dataset(Path::new("fixtures/sample.jsonl"), false).unwrap();
        assert!(dataset.len() >= 10);
        assert!(dataset.records.iter().any(|r| r.status == Status::Attack));
        assert!(dataset.records.iter().any(|r| r.status == Status::Normal));
    }
}
