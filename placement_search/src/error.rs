use diff_score::ScoreError;
use std::path::PathBuf;

/// Errors produced while running a placement search.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot use image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("no .png objects found in {0}")]
    NoObjects(PathBuf),

    #[error("invalid search configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Scoring(#[from] ScoreError),

    #[error("cannot write ledger {path}: {source}")]
    Ledger {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl SearchError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| SearchError::Io { path, source }
    }

    pub(crate) fn image(path: impl Into<PathBuf>) -> impl FnOnce(image::ImageError) -> Self {
        let path = path.into();
        move |source| SearchError::Image { path, source }
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
