//! Error types for CADDY

use std::fmt;
use thiserror::Error;

/// What is wrong with a single entry of a point cloud
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointIssue {
    /// The entry does not have exactly three components
    WrongArity { found: usize },
    /// A component is NaN or infinite
    NonFinite { component: usize },
    /// A component is finite but overflows a 32-bit float
    OutOfRange { component: usize },
}

impl fmt::Display for PointIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointIssue::WrongArity { found } => {
                write!(f, "expected 3 components, found {}", found)
            }
            PointIssue::NonFinite { component } => {
                write!(f, "component {} is not a finite number", component)
            }
            PointIssue::OutOfRange { component } => {
                write!(f, "component {} does not fit in a 32-bit float", component)
            }
        }
    }
}

/// Main error type for CADDY operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid point cloud data at point {index}: {issue}")]
    InvalidPointCloudData { index: usize, issue: PointIssue },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("Visualization error: {0}")]
    Visualization(String),
}

impl Error {
    /// The offending point index and issue, if this is a point cloud data error
    pub fn point_issue(&self) -> Option<(usize, PointIssue)> {
        match self {
            Error::InvalidPointCloudData { index, issue } => Some((*index, *issue)),
            _ => None,
        }
    }
}

/// Result type alias for CADDY operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_point_message_names_index_and_issue() {
        let err = Error::InvalidPointCloudData {
            index: 4,
            issue: PointIssue::WrongArity { found: 2 },
        };
        assert_eq!(
            err.to_string(),
            "Invalid point cloud data at point 4: expected 3 components, found 2"
        );
        assert_eq!(err.point_issue(), Some((4, PointIssue::WrongArity { found: 2 })));
    }

    #[test]
    fn test_other_errors_have_no_point_issue() {
        assert!(Error::Gpu("lost device".into()).point_issue().is_none());
    }
}
