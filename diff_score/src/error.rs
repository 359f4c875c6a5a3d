// THEORY:
// Every failure the scoring engine can report is a recoverable, typed value. The
// caller (an attempt loop) decides whether to skip the attempt or abort the batch;
// the engine never panics on bad input and never leaves a partial colormap behind.

use std::path::PathBuf;

/// Errors produced by the difference-scoring engine.
#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    /// An input image is absent, unreadable, or could not be decoded.
    #[error("cannot read input image {path}: {source}")]
    MissingInput {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The two decoded images do not share pixel dimensions.
    #[error("images must be the same size: {left:?} vs {right:?}")]
    DimensionMismatch { left: (u32, u32), right: (u32, u32) },

    /// `score_max` is not strictly greater than `score_min`.
    #[error("score range is degenerate: min {min} must be below max {max}")]
    DegenerateRange { min: f64, max: f64 },

    /// The colormap artifact could not be encoded or written.
    #[error("failed to write colormap to {path}: {source}")]
    ColormapWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A band worker did not run to completion.
    #[error("score aggregation failed: {0}")]
    Aggregation(String),
}

pub type Result<T> = std::result::Result<T, ScoreError>;
