use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced at the edges of the solver: reading model files and
/// validating configuration. Problems inside a model are reported as
/// [`Diagnostic`](crate::mdp::Diagnostic)s instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read model file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid solver configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
