use thiserror::Error;

/// Error type for kind conversion failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KindParseError {
    #[error("Invalid node kind: {0}")]
    UnknownNodeKind(String),
    #[error("Invalid tree entry kind: {0}")]
    UnknownEntryKind(String),
}
