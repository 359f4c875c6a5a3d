// THEORY:
// The `ScoreAggregator` is the second half of the scoring engine. It reduces a
// normalized field to one scalar:
//
//     score = sum over sampled (x, y) of  score_min + n(x, y) * (score_max - score_min)
//
// where the sampled positions are every second row and every second column of
// the field. The score is a sum, not a mean: it grows with image size and is
// only comparable between attempts scored against the same target.
//
// Work is split into `WORKER_POOL_SIZE` horizontal bands. Each band is reduced on
// its own blocking worker over a shared, read-only `Arc` of the field; workers
// never write shared state, so nothing is locked. Partial sums are collected in
// band order and added left to right, which makes the result bit-identical no
// matter which worker finishes first.

use crate::core_modules::band::band::{self, Band};
use crate::core_modules::field::field::NormalizedField;
use crate::error::{Result, ScoreError};
use futures::future::join_all;
use log::debug;
use std::sync::Arc;

pub const WORKER_POOL_SIZE: usize = 4;

#[derive(Debug, Clone)]
pub struct ScoreAggregator {
    band_count: usize,
}

impl Default for ScoreAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreAggregator {
    pub fn new() -> Self {
        Self::with_bands(WORKER_POOL_SIZE)
    }

    pub fn with_bands(band_count: usize) -> Self {
        Self {
            band_count: band_count.max(1),
        }
    }

    /// Reduces the field on parallel band workers and waits for all of them.
    pub async fn aggregate_score(
        &self,
        field: Arc<NormalizedField>,
        score_min: f64,
        score_max: f64,
    ) -> Result<f64> {
        if field.width == 0 || field.height == 0 {
            return Ok(0.0);
        }

        let workers = band::partition(field.height, self.band_count)
            .into_iter()
            .map(|band| {
                let field = Arc::clone(&field);
                tokio::task::spawn_blocking(move || band.sampled_sum(&field, score_min, score_max))
            });

        let mut score = 0.0f64;
        for (index, partial) in join_all(workers).await.into_iter().enumerate() {
            let partial =
                partial.map_err(|e| ScoreError::Aggregation(format!("band {index}: {e}")))?;
            score += partial;
        }

        debug!("aggregated {} bands into score {score}", self.band_count);
        Ok(score)
    }

    /// Single-threaded reduction over the same sample grid.
    pub fn aggregate_score_sequential(
        field: &NormalizedField,
        score_min: f64,
        score_max: f64,
    ) -> f64 {
        Band::new(0, field.height).sampled_sum(field, score_min, score_max)
    }
}
