// THEORY:
// The `pipeline` module is the top-level API of the scoring engine. It wires the
// `DifferenceMapper` and the `ScoreAggregator` together behind one call:
//
//     (image_a, image_b, config) -> ScoreReport
//
// Stage 1 (synchronous): decode, build the distance and normalized fields, render
// and write the colormap. Stage 2 (parallel): reduce the normalized field to the
// scalar score on the band workers. Every call is self-contained; the pipeline
// keeps only its configuration between calls.

use crate::core_modules::difference_mapper::{DifferenceMap, DifferenceMapper};
use crate::error::{Result, ScoreError};
use crate::parallel_aggregator::ScoreAggregator;
use image::RgbImage;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// Re-export key data structures for the public API.
pub use crate::core_modules::colormap::colormap::Palette;
pub use crate::core_modules::field::field::{DistanceField, Field, NormalizedField};
pub use crate::core_modules::smart_pixel::smart_pixel::DistanceMetric;

pub const DEFAULT_SCORE_MIN: f64 = 0.0;
pub const DEFAULT_SCORE_MAX: f64 = 300.0;
pub const DEFAULT_COLORMAP_PATH: &str = "difference_colormap.png";

/// Configuration for the ScoringPipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Distance that maps to 0.0 in the normalized field.
    pub score_min: f64,
    /// Distance that maps to 1.0 in the normalized field. Must exceed `score_min`.
    pub score_max: f64,
    /// Where the colormap PNG is written. Overwritten on every call.
    pub colormap_path: PathBuf,
    pub metric: DistanceMetric,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            score_min: DEFAULT_SCORE_MIN,
            score_max: DEFAULT_SCORE_MAX,
            colormap_path: PathBuf::from(DEFAULT_COLORMAP_PATH),
            metric: DistanceMetric::default(),
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<()> {
        let finite = self.score_min.is_finite() && self.score_max.is_finite();
        if !finite || self.score_max <= self.score_min {
            return Err(ScoreError::DegenerateRange {
                min: self.score_min,
                max: self.score_max,
            });
        }
        Ok(())
    }

    pub fn with_colormap_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.colormap_path = path.into();
        self
    }
}

/// The result of scoring one image pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub score: f64,
    pub mean_distance: f64,
    pub width: u32,
    pub height: u32,
    pub colormap_path: PathBuf,
}

/// The main, top-level struct for the scoring engine.
#[derive(Debug, Clone, Default)]
pub struct ScoringPipeline {
    config: ScoringConfig,
    aggregator: ScoreAggregator,
}

impl ScoringPipeline {
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            config,
            aggregator: ScoreAggregator::new(),
        }
    }

    /// Scores two images on disk.
    pub async fn score_paths(&self, image_a: &Path, image_b: &Path) -> Result<ScoreReport> {
        self.config.validate()?;
        let map = DifferenceMapper::new(&self.config).compute_difference(image_a, image_b)?;
        self.finish(map).await
    }

    /// Scores two in-memory images.
    pub async fn score_images(
        &self,
        image_a: &RgbImage,
        image_b: &RgbImage,
    ) -> Result<ScoreReport> {
        self.config.validate()?;
        let map = DifferenceMapper::new(&self.config).compute_difference_images(image_a, image_b)?;
        self.finish(map).await
    }

    async fn finish(&self, map: DifferenceMap) -> Result<ScoreReport> {
        let (width, height) = map.dimensions();
        let mean_distance = map.mean_distance;
        info!("Average {:?} distance: {mean_distance}", self.config.metric);

        let normalized = Arc::new(map.normalized);
        let score = self
            .aggregator
            .aggregate_score(normalized, self.config.score_min, self.config.score_max)
            .await?;

        Ok(ScoreReport {
            score,
            mean_distance,
            width,
            height,
            colormap_path: self.config.colormap_path.clone(),
        })
    }
}

/// One-shot helper: score `image_a` against `image_b` with `config`.
pub async fn image_color_difference(
    image_a: &Path,
    image_b: &Path,
    config: ScoringConfig,
) -> Result<f64> {
    let report = ScoringPipeline::new(config).score_paths(image_a, image_b).await?;
    Ok(report.score)
}
