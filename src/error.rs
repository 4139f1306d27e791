//! Error types for race comparisons

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which of the two selected races a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    A,
    B,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => write!(f, "Race A"),
            Side::B => write!(f, "Race B"),
        }
    }
}

/// Result type for comparison operations
pub type CompareResult<T> = Result<T, CompareError>;

/// Errors that abort a single comparison
#[derive(Debug, Error)]
pub enum CompareError {
    /// File missing, unreadable, or not parsable as CSV
    #[error("{side}: failed to load {}: {reason}", .path.display())]
    DataLoad {
        side: Side,
        path: PathBuf,
        reason: String,
    },

    /// Required column absent after header normalization
    #[error("{side}: {} is missing required column '{column}'", .path.display())]
    Schema {
        side: Side,
        path: PathBuf,
        column: String,
    },

    /// Bin label appears more than once in one file
    #[error("{side}: {} lists bin '{bin}' more than once", .path.display())]
    DuplicateBin {
        side: Side,
        path: PathBuf,
        bin: String,
    },

    /// Event/variant pair that cannot name a file under the data root
    #[error("{side}: invalid selection: {reason}")]
    InvalidSelection { side: Side, reason: String },
}

impl CompareError {
    pub fn data_load(side: Side, path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        CompareError::DataLoad {
            side,
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn schema(side: Side, path: impl Into<PathBuf>, column: impl Into<String>) -> Self {
        CompareError::Schema {
            side,
            path: path.into(),
            column: column.into(),
        }
    }

    pub fn side(&self) -> Side {
        match self {
            CompareError::DataLoad { side, .. }
            | CompareError::Schema { side, .. }
            | CompareError::DuplicateBin { side, .. }
            | CompareError::InvalidSelection { side, .. } => *side,
        }
    }

    /// True when the selected file simply isn't on disk (e.g. removed after a scan)
    pub fn is_missing_file(&self) -> bool {
        matches!(self, CompareError::DataLoad { path, .. } if !path.exists())
    }

    /// Message suitable for showing next to the chart
    pub fn user_message(&self) -> String {
        match self {
            CompareError::DataLoad { side, path, .. } if !path.exists() => {
                format!("{}: no data file at {}", side, path.display())
            }
            other => other.to_string(),
        }
    }
}

/// Soft conditions: nothing failed, but there is nothing useful to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    /// Data root missing or holds no event with a data file
    CatalogEmpty,
    /// The two races share no bins
    JoinMismatch,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::CatalogEmpty => {
                "No race data found. Organize the data folder as <event>/<variant>.csv."
            }
            Notice::JoinMismatch => {
                "The selected races share no bins, so there is nothing to compare."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_side() {
        let err = CompareError::schema(Side::B, "race_data/utmb/2023.csv", "sort");
        assert_eq!(err.side(), Side::B);
        let msg = err.user_message();
        assert!(msg.starts_with("Race B:"));
        assert!(msg.contains("sort"));
    }

    #[test]
    fn test_missing_file_message() {
        let err = CompareError::data_load(Side::A, "/definitely/not/here.csv", "No such file");
        assert!(err.is_missing_file());
        assert_eq!(err.user_message(), "Race A: no data file at /definitely/not/here.csv");
    }
}
