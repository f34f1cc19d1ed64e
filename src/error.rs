use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, editing or processing a document.
#[derive(Debug, Error)]
pub enum PathOpsError {
    #[error("XML error: {0}")]
    Xml(String),
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid length: {0}")]
    InvalidLength(String),
    #[error("unknown path operation verb: {0}")]
    UnknownVerb(String),
    #[error("invalid boolean value: {0}")]
    InvalidBool(String),
    #[error("{0}")]
    Process(String),
}

impl PathOpsError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PathOpsError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<quick_xml::Error> for PathOpsError {
    fn from(e: quick_xml::Error) -> Self {
        PathOpsError::Xml(e.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for PathOpsError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        PathOpsError::Xml(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PathOpsError>;
