//! Data models for the traffic analyzer.
//!
//! This module contains the core structures shared across the pipeline:
//! the raw input record, the validated record with its derived status,
//! and the dataset snapshot all six reports read.

use serde::Deserialize;
use std::fmt;

/// Service value meaning "unknown/unspecified" in the input data.
pub const SERVICE_UNKNOWN: &str = "-";

/// Category bucket used when an attack record carries no `attack_cat`.
pub const MISSING_CATEGORY: &str = "(sem categoria)";

/// Traffic status derived from the binary `label` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Benign connection (label 0).
    Normal,
    /// Malicious connection (label 1).
    Attack,
}

impl Status {
    /// Maps a raw label to a status: 0 is Normal, 1 is Attack, anything
    /// else is invalid and rejected by the loader.
    pub fn from_label(label: u8) -> Option<Status> {
        match label {
            0 => Some(Status::Normal),
            1 => Some(Status::Attack),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Presentation strings match the dataset's labeling convention.
        match self {
            Status::Normal => write!(f, "Normal"),
            Status::Attack => write!(f, "Ataque"),
        }
    }
}

/// One input line as it appears in the dataset file.
///
/// `attack_cat` may be absent or null; every other field is required, and
/// a line missing one is rejected at load time.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    /// Binary outcome label: 0 = benign, 1 = attack.
    pub label: u8,
    /// Attack category; only meaningful when `label` is 1.
    #[serde(default)]
    pub attack_cat: Option<String>,
    /// Transport/application protocol name.
    pub proto: String,
    /// Service name; `"-"` means unknown.
    pub service: String,
}

/// One validated connection event.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Binary outcome label, guaranteed to be 0 or 1.
    pub label: u8,
    /// Status derived from `label` once at load time.
    pub status: Status,
    /// Attack category; `None` when the input had none.
    pub attack_cat: Option<String>,
    /// Protocol name.
    pub proto: String,
    /// Service name; `"-"` means unknown.
    pub service: String,
}

impl Record {
    /// The category bucket this record falls into in the attack
    /// distribution report.
    pub fn category_bucket(&self) -> &str {
        self.attack_cat.as_deref().unwrap_or(MISSING_CATEGORY)
    }
}

/// The immutable dataset snapshot read by all six reports.
///
/// Records keep their input order; a record's position doubles as its
/// index for the positional temporal binning.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Records in input order.
    pub records: Vec<Record>,
}

impl Dataset {
    /// Total number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true when the dataset holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
