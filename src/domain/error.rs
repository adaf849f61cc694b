//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent structural violations of the export.
/// Everything recoverable is recorded as an [`Issue`](crate::domain::Issue) instead.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("root file is not a navigation index (no bullet list of pages): {0}")]
    RootNotIndex(String),

    #[error("cannot read root file {identifier}")]
    RootUnreadable {
        identifier: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
