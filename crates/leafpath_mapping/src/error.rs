use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed XML: {0}")]
    Parse(#[from] roxmltree::Error),

    #[error("XML output failed: {0}")]
    Xml(#[source] std::io::Error),

    #[error("sync option `{0}` must not be empty")]
    MissingField(&'static str),
}

pub type Result<T> = std::result::Result<T, MappingError>;
