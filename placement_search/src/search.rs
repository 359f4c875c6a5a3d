// THEORY:
// The `search` module is the generate-and-test loop around the scoring engine.
// It is a flat random search: every attempt is an independent random placement,
// nothing is learned between attempts or between generations.
//
// One batch runs like this:
// 1.  **Generate**: pick a random object sprite, place it on the background with
//     random scale, rotation, tint and position.
// 2.  **Score**: compare the composite with the target through `ScoringPipeline`,
//     writing the composite and its colormap into a private pending directory.
// 3.  **Record**: collect an `AttemptRecord { attempt_id, score, artifact_paths }`
//     in memory. Attempts whose scoring fails are logged and skipped.
// 4.  **Materialize**: rank the records, copy the kept attempts' artifacts into
//     `<batch>/<attempt id>_<score>/`, drop the pending directory, and write the
//     batch ledger.
//
// Scoring never renames files; placing artifacts is a separate, repeatable step.

use crate::error::{Result, SearchError};
use crate::ledger::{self, ScoreEntry, SORTED_SCORES_FILE};
use crate::placement::{place_object_random, PlacementConfig, PlacementParams};
use diff_score::{ScoreError, ScoringConfig, ScoringPipeline};
use image::{DynamicImage, RgbImage, RgbaImage};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

const PENDING_DIR: &str = "pending";
const COLORMAP_FILE: &str = "difference_colormap.png";

/// Which end of the score scale counts as "best".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ranking {
    /// Highest score first.
    #[default]
    HighestFirst,
    /// Lowest score (closest match) first.
    LowestFirst,
}

impl Ranking {
    /// Orders `a` before `b` when `a` ranks better.
    pub fn compare(&self, a: f64, b: f64) -> Ordering {
        match self {
            Ranking::HighestFirst => b.total_cmp(&a),
            Ranking::LowestFirst => a.total_cmp(&b),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub background_path: PathBuf,
    pub object_dir: PathBuf,
    pub target_path: PathBuf,
    pub output_dir: PathBuf,
    pub max_attempts: u32,
    pub generations: u32,
    /// Attempts kept per generation.
    pub survivors: usize,
    pub ranking: Ranking,
    pub seed: Option<u64>,
    pub placement: PlacementConfig,
    /// `colormap_path` is replaced per attempt.
    pub scoring: ScoringConfig,
}

impl SearchConfig {
    pub fn new(
        background_path: impl Into<PathBuf>,
        object_dir: impl Into<PathBuf>,
        target_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            background_path: background_path.into(),
            object_dir: object_dir.into(),
            target_path: target_path.into(),
            output_dir: output_dir.into(),
            max_attempts: 100,
            generations: 10,
            survivors: 5,
            ranking: Ranking::default(),
            seed: None,
            placement: PlacementConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub composite: PathBuf,
    pub colormap: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// `<attempt>` or `<generation>_<attempt>`, 1-based.
    pub attempt_id: String,
    pub generation: Option<u32>,
    pub attempt: u32,
    pub score: f64,
    pub artifact_paths: ArtifactPaths,
    pub placement: PlacementParams,
}

impl AttemptRecord {
    /// Directory name used when the attempt is materialized.
    pub fn label(&self) -> String {
        format!("{}_{}", self.attempt_id, self.score)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Kept attempts, best first, with materialized artifact paths.
    pub kept: Vec<AttemptRecord>,
    /// Every scored attempt, best first.
    pub scores: Vec<ScoreEntry>,
    pub failed: u32,
}

impl BatchOutcome {
    pub fn best(&self) -> Option<&AttemptRecord> {
        self.kept.first()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub batches: Vec<BatchOutcome>,
}

impl SearchOutcome {
    pub fn best(&self, ranking: Ranking) -> Option<&AttemptRecord> {
        self.batches
            .iter()
            .filter_map(BatchOutcome::best)
            .min_by(|a, b| ranking.compare(a.score, b.score))
    }

    pub fn failed(&self) -> u32 {
        self.batches.iter().map(|b| b.failed).sum()
    }
}

/// Copies an attempt's artifacts into `<root>/<label>/`. Running it again with
/// the same record rewrites the same files.
pub fn materialize(record: &AttemptRecord, root: &Path) -> Result<AttemptRecord> {
    let dir = root.join(record.label());
    std::fs::create_dir_all(&dir).map_err(SearchError::io(&dir))?;

    let composite = dir.join(format!("modified_{}.png", record.attempt));
    let colormap = dir.join(COLORMAP_FILE);
    copy_artifact(&record.artifact_paths.composite, &composite)?;
    copy_artifact(&record.artifact_paths.colormap, &colormap)?;

    Ok(AttemptRecord {
        artifact_paths: ArtifactPaths { composite, colormap },
        ..record.clone()
    })
}

fn copy_artifact(from: &Path, to: &Path) -> Result<()> {
    if from == to {
        return Ok(());
    }
    std::fs::copy(from, to).map_err(SearchError::io(from))?;
    Ok(())
}

/// `.png` files directly inside `dir`, sorted by name.
pub fn list_objects(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut objects: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(SearchError::io(dir))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "png"))
        .collect();
    if objects.is_empty() {
        return Err(SearchError::NoObjects(dir.to_path_buf()));
    }
    objects.sort();
    Ok(objects)
}

struct ObjectSprite {
    name: String,
    image: RgbaImage,
}

/// Owns the loaded inputs and the random source for a whole search.
pub struct SearchRunner {
    config: SearchConfig,
    background: RgbaImage,
    target: RgbImage,
    objects: Vec<ObjectSprite>,
    rng: StdRng,
}

impl SearchRunner {
    pub fn new(config: SearchConfig) -> Result<Self> {
        config.placement.validate()?;
        config.scoring.validate()?;
        if config.max_attempts == 0 {
            return Err(SearchError::InvalidConfig("max_attempts must be at least 1".into()));
        }

        let background = image::open(&config.background_path)
            .map_err(SearchError::image(&config.background_path))?
            .to_rgba8();
        let target = image::open(&config.target_path)
            .map_err(SearchError::image(&config.target_path))?
            .to_rgb8();
        if background.dimensions() != target.dimensions() {
            return Err(ScoreError::DimensionMismatch {
                left: background.dimensions(),
                right: target.dimensions(),
            }
            .into());
        }

        let objects = list_objects(&config.object_dir)?
            .into_iter()
            .map(|path| {
                let image = image::open(&path).map_err(SearchError::image(&path))?.to_rgba8();
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Ok(ObjectSprite { name, image })
            })
            .collect::<Result<Vec<_>>>()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            config,
            background,
            target,
            objects,
            rng,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// One batch of `max_attempts` into the output directory; every scored
    /// attempt is kept.
    pub async fn run_attempts(&mut self) -> Result<SearchOutcome> {
        let output = self.config.output_dir.clone();
        let batch = self.run_batch(&output, None, None).await?;
        Ok(SearchOutcome { batches: vec![batch] })
    }

    /// `generations` independent batches into `generation_<n>/`, keeping the
    /// best `survivors` attempts of each.
    pub async fn run_generations(&mut self) -> Result<SearchOutcome> {
        let mut outcome = SearchOutcome::default();
        for generation in 1..=self.config.generations {
            let dir = self.config.output_dir.join(format!("generation_{generation}"));
            let survivors = Some(self.config.survivors);
            let batch = self.run_batch(&dir, Some(generation), survivors).await?;
            outcome.batches.push(batch);
        }
        Ok(outcome)
    }

    async fn run_batch(
        &mut self,
        dir: &Path,
        generation: Option<u32>,
        keep: Option<usize>,
    ) -> Result<BatchOutcome> {
        let pending = dir.join(PENDING_DIR);
        std::fs::create_dir_all(&pending).map_err(SearchError::io(&pending))?;

        let mut records = Vec::new();
        let mut failed = 0u32;
        for attempt in 1..=self.config.max_attempts {
            match self.run_attempt(&pending, generation, attempt).await {
                Ok(record) => {
                    info!("Attempt {}: Score = {}", record.attempt_id, record.score);
                    records.push(record);
                }
                Err(e @ (SearchError::Scoring(_) | SearchError::Image { .. })) => {
                    warn!("Attempt {attempt} skipped: {e}");
                    failed += 1;
                }
                Err(e) => return Err(e),
            }
        }

        let ranking = self.config.ranking;
        records.sort_by(|a, b| ranking.compare(a.score, b.score));
        let scores: Vec<ScoreEntry> = records.iter().map(ScoreEntry::from).collect();
        let keep = keep.unwrap_or(records.len()).min(records.len());

        let mut kept = Vec::with_capacity(keep);
        for record in &records[..keep] {
            let placed = materialize(record, dir)?;
            info!(
                "Attempt {}: saved in {}",
                placed.attempt_id,
                dir.join(placed.label()).display()
            );
            kept.push(placed);
        }
        std::fs::remove_dir_all(&pending).map_err(SearchError::io(&pending))?;

        ledger::write_sorted_scores(&dir.join(SORTED_SCORES_FILE), &scores, ranking)?;
        if let Some(best) = kept.first() {
            let path = ledger::write_highest_score(dir, best)?;
            info!("Highest score: {}, saved in {}", best.label(), path.display());
        }

        Ok(BatchOutcome { kept, scores, failed })
    }

    async fn run_attempt(
        &mut self,
        pending: &Path,
        generation: Option<u32>,
        attempt: u32,
    ) -> Result<AttemptRecord> {
        let attempt_id = match generation {
            Some(g) => format!("{g}_{attempt}"),
            None => attempt.to_string(),
        };
        let work = pending.join(&attempt_id);
        std::fs::create_dir_all(&work).map_err(SearchError::io(&work))?;

        let index = self.rng.gen_range(0..self.objects.len());
        let object = &self.objects[index];
        let (composite, placement) = place_object_random(
            &self.background,
            &object.image,
            &object.name,
            &self.config.placement,
            &mut self.rng,
        );

        let composite_path = work.join(format!("modified_{attempt}.png"));
        composite.save(&composite_path).map_err(SearchError::image(&composite_path))?;

        let colormap_path = work.join(COLORMAP_FILE);
        let scoring = self.config.scoring.clone().with_colormap_path(&colormap_path);
        let candidate = DynamicImage::ImageRgba8(composite).to_rgb8();
        let report = ScoringPipeline::new(scoring).score_images(&candidate, &self.target).await?;

        Ok(AttemptRecord {
            attempt_id,
            generation,
            attempt,
            score: report.score,
            artifact_paths: ArtifactPaths {
                composite: composite_path,
                colormap: colormap_path,
            },
            placement,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, score: f64) -> AttemptRecord {
        AttemptRecord {
            attempt_id: id.to_string(),
            generation: None,
            attempt: id.parse().unwrap_or(1),
            score,
            artifact_paths: ArtifactPaths {
                composite: PathBuf::from("c.png"),
                colormap: PathBuf::from("m.png"),
            },
            placement: PlacementParams {
                object_name: "o.png".into(),
                scale_factor: 1.0,
                rotation_degrees: 0.0,
                tint: [0, 0, 0],
                position: (0, 0),
            },
        }
    }

    #[test]
    fn ranking_orders_both_ways() {
        let mut scores = vec![3.0, 1.0, 2.0];
        scores.sort_by(|a, b| Ranking::HighestFirst.compare(*a, *b));
        assert_eq!(scores, vec![3.0, 2.0, 1.0]);
        scores.sort_by(|a, b| Ranking::LowestFirst.compare(*a, *b));
        assert_eq!(scores, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn label_joins_id_and_score() {
        assert_eq!(record("7", 1200.0).label(), "7_1200");
        assert_eq!(record("7", 12.5).label(), "7_12.5");
    }

    #[test]
    fn materialize_is_repeatable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let composite = dir.path().join("src_composite.png");
        let colormap = dir.path().join("src_colormap.png");
        std::fs::write(&composite, b"composite").expect("write");
        std::fs::write(&colormap, b"colormap").expect("write");

        let mut original = record("3", 42.0);
        original.artifact_paths = ArtifactPaths { composite, colormap };

        let placed = materialize(&original, dir.path()).expect("first");
        let again = materialize(&original, dir.path()).expect("second");
        let self_copy = materialize(&placed, dir.path()).expect("in place");

        assert_eq!(placed, again);
        assert_eq!(placed, self_copy);
        assert_eq!(placed.artifact_paths.composite, dir.path().join("3_42").join("modified_3.png"));
        assert_eq!(std::fs::read(&placed.artifact_paths.colormap).expect("read"), b"colormap");
    }

    #[test]
    fn best_across_batches_follows_ranking() {
        let outcome = SearchOutcome {
            batches: vec![
                BatchOutcome { kept: vec![record("1", 5.0)], ..BatchOutcome::default() },
                BatchOutcome { kept: vec![record("2", 9.0)], ..BatchOutcome::default() },
                BatchOutcome::default(),
            ],
        };
        assert_eq!(outcome.best(Ranking::HighestFirst).map(|r| r.score), Some(9.0));
        assert_eq!(outcome.best(Ranking::LowestFirst).map(|r| r.score), Some(5.0));
    }

    #[test]
    fn object_listing_filters_pngs() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(list_objects(dir.path()), Err(SearchError::NoObjects(_))));

        std::fs::write(dir.path().join("b.png"), b"").expect("write");
        std::fs::write(dir.path().join("a.png"), b"").expect("write");
        std::fs::write(dir.path().join("notes.txt"), b"").expect("write");
        let listed = list_objects(dir.path()).expect("list");
        assert_eq!(listed, vec![dir.path().join("a.png"), dir.path().join("b.png")]);
    }
}
