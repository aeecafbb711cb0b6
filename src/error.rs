//! Common error wrapper.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EchopingError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Handy alias.
pub type Result<T> = std::result::Result<T, EchopingError>;
