// THEORY:
// This file is the main entry point for the `diff_score` library crate. It
// exports the `ScoringPipeline` and its data structures (`ScoringConfig`,
// `ScoreReport`, `DistanceMetric`) as the high-level interface of the scoring
// engine: compare two equally sized images, get back one fitness score plus a
// false-color difference map on disk.
//
// The internal layers stay reachable for callers that need them:
// - `core_modules`: pixels, distance metrics, fields, bands, palettes, and the
//   `DifferenceMapper` that builds a difference map from an image pair.
// - `parallel_aggregator`: the banded, parallel reduction to a scalar score.
// - `error`: the typed failures every layer reports.

pub mod core_modules;
pub mod error;
pub mod parallel_aggregator;
pub mod pipeline;

pub use error::{Result, ScoreError};
pub use pipeline::{
    image_color_difference, DistanceMetric, ScoreReport, ScoringConfig, ScoringPipeline,
};
