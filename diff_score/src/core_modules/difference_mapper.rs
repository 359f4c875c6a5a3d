// THEORY:
// The `DifferenceMapper` is the first half of the scoring engine. It takes two
// equally sized images and produces everything the rest of the system needs to
// know about how they differ:
//
// 1.  **Decoding**: both inputs are flattened to 8-bit RGB (alpha is dropped) and
//     every channel is handled as f32 from then on, so subtraction cannot wrap.
// 2.  **Distance Field**: each pixel pair is reduced to one non-negative distance
//     through the configured `DistanceMetric`.
// 3.  **Normalization**: distances are rescaled against the (score_min, score_max)
//     window and clipped to [0,1].
// 4.  **Rendering**: the normalized field is painted through the palette that
//     belongs to the metric and written to the configured colormap path.
//
// All validation (readable inputs, equal sizes, a sane score window) happens
// before anything is written, so a failed call leaves no artifact behind. The
// mapper is stateless between calls; nothing it builds is cached.

use crate::core_modules::colormap::colormap::Palette;
use crate::core_modules::field::field::{DistanceField, Field, NormalizedField};
use crate::core_modules::pixel::pixel::Pixel;
use crate::core_modules::smart_pixel::smart_pixel::DistanceMetric;
use crate::core_modules::utils::image_helper::image_helper;
use crate::error::{Result, ScoreError};
use crate::pipeline::ScoringConfig;
use image::RgbImage;
use log::{debug, info};
use std::path::Path;

/// Everything derived from one image pair. Transient: built per call.
#[derive(Debug, Clone)]
pub struct DifferenceMap {
    pub distance: DistanceField,
    pub normalized: NormalizedField,
    pub colormap: RgbImage,
    /// Mean of the distance field. Diagnostic only; not part of the score.
    pub mean_distance: f64,
}

impl DifferenceMap {
    pub fn dimensions(&self) -> (u32, u32) {
        self.distance.dimensions()
    }
}

pub fn palette_for(metric: DistanceMetric) -> Palette {
    match metric {
        DistanceMetric::EuclideanRgb => Palette::Jet,
        DistanceMetric::ThresholdBanded => Palette::Banded,
    }
}

/// Builds distance, normalized and colormap grids for image pairs.
pub struct DifferenceMapper<'a> {
    config: &'a ScoringConfig,
}

impl<'a> DifferenceMapper<'a> {
    pub fn new(config: &'a ScoringConfig) -> Self {
        Self { config }
    }

    /// Loads both images from disk, maps them, and writes the colormap.
    pub fn compute_difference(&self, image_a: &Path, image_b: &Path) -> Result<DifferenceMap> {
        let left = Self::load(image_a)?;
        let right = Self::load(image_b)?;
        self.compute_difference_images(&left, &right)
    }

    /// Same as `compute_difference` for images already in memory.
    pub fn compute_difference_images(
        &self,
        left: &RgbImage,
        right: &RgbImage,
    ) -> Result<DifferenceMap> {
        let map = self.map_images(left, right)?;
        self.write_colormap(&map.colormap)?;
        Ok(map)
    }

    /// Pure mapping step: no I/O.
    pub fn map_images(&self, left: &RgbImage, right: &RgbImage) -> Result<DifferenceMap> {
        self.config.validate()?;
        if left.dimensions() != right.dimensions() {
            return Err(ScoreError::DimensionMismatch {
                left: left.dimensions(),
                right: right.dimensions(),
            });
        }

        let distance = self.distance_field(left, right);
        let normalized = distance.normalized(self.config.score_min, self.config.score_max);
        let colormap = palette_for(self.config.metric).render(&normalized, &distance)?;
        let mean_distance = distance.mean();

        debug!(
            "mapped {}x{} pair with {:?}, mean distance {:.3}",
            distance.width, distance.height, self.config.metric, mean_distance
        );

        Ok(DifferenceMap {
            distance,
            normalized,
            colormap,
            mean_distance,
        })
    }

    fn distance_field(&self, left: &RgbImage, right: &RgbImage) -> DistanceField {
        let metric = self.config.metric;
        let values = left
            .pixels()
            .zip(right.pixels())
            .map(|(a, b)| metric.distance(&Pixel::from(a), &Pixel::from(b)))
            .collect();
        Field::new(left.width(), left.height(), values)
    }

    fn write_colormap(&self, colormap: &RgbImage) -> Result<()> {
        let path = self.config.colormap_path.as_path();
        image_helper::save_png(path, colormap).map_err(|source| ScoreError::ColormapWrite {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Difference colormap saved to {}", path.display());
        Ok(())
    }

    fn load(path: &Path) -> Result<RgbImage> {
        image_helper::load_rgb(path).map_err(|source| ScoreError::MissingInput {
            path: path.to_path_buf(),
            source,
        })
    }
}
