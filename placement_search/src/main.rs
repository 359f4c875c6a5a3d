use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use diff_score::{DistanceMetric, ScoringConfig, ScoringPipeline};
use log::{error, info};
use placement_search::ledger::{self, SORTED_SCORES_FILE};
use placement_search::{PlacementConfig, Ranking, SearchConfig, SearchRunner};
use std::path::PathBuf;
use std::process::ExitCode;

/// Random object placement scored against a target image.
#[derive(Parser, Debug)]
#[command(name = "placement_search")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score one image against a target and write its difference colormap
    Score {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        #[arg(value_name = "TARGET")]
        target: PathBuf,

        #[command(flatten)]
        scoring: ScoringArgs,

        /// Where the difference colormap is written
        #[arg(
            long,
            value_name = "FILE",
            default_value = diff_score::pipeline::DEFAULT_COLORMAP_PATH
        )]
        colormap: PathBuf,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the random placement search
    Search {
        /// Background image the objects are placed on
        #[arg(long, value_name = "FILE")]
        background: PathBuf,

        /// Directory of .png object sprites
        #[arg(long, value_name = "DIR")]
        objects: PathBuf,

        /// Filled reference image
        #[arg(long, value_name = "FILE")]
        target: PathBuf,

        #[arg(long, value_name = "DIR", default_value = "output")]
        output: PathBuf,

        /// Attempts per batch
        #[arg(long, default_value_t = 100)]
        attempts: u32,

        /// Run this many generations instead of a single batch
        #[arg(long)]
        generations: Option<u32>,

        /// Attempts kept per generation
        #[arg(long, default_value_t = 5)]
        survivors: usize,

        #[arg(long, default_value_t = placement_search::placement::DEFAULT_SIZE_MIN)]
        size_min: f64,

        #[arg(long, default_value_t = placement_search::placement::DEFAULT_SIZE_MAX)]
        size_max: f64,

        /// Seed for a reproducible search
        #[arg(long)]
        seed: Option<u64>,

        /// Rank the lowest score first
        #[arg(long)]
        lowest_first: bool,

        #[command(flatten)]
        scoring: ScoringArgs,
    },

    /// Rebuild sorted_scores.json from a materialized output directory
    Rank {
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        #[arg(long)]
        lowest_first: bool,
    },
}

#[derive(clap::Args, Debug)]
struct ScoringArgs {
    #[arg(long, default_value_t = diff_score::pipeline::DEFAULT_SCORE_MIN)]
    score_min: f64,

    #[arg(long, default_value_t = diff_score::pipeline::DEFAULT_SCORE_MAX)]
    score_max: f64,

    #[arg(long, value_enum, default_value = "euclidean")]
    metric: MetricArg,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MetricArg {
    Euclidean,
    Banded,
}

impl ScoringArgs {
    fn into_config(self) -> ScoringConfig {
        let metric = match self.metric {
            MetricArg::Euclidean => DistanceMetric::EuclideanRgb,
            MetricArg::Banded => DistanceMetric::ThresholdBanded,
        };
        ScoringConfig {
            score_min: self.score_min,
            score_max: self.score_max,
            metric,
            ..ScoringConfig::default()
        }
    }
}

fn ranking(lowest_first: bool) -> Ranking {
    if lowest_first { Ranking::LowestFirst } else { Ranking::HighestFirst }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli.command)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Score {
            image,
            target,
            scoring,
            colormap,
            json,
        } => {
            let config = scoring.into_config().with_colormap_path(colormap);
            let report = ScoringPipeline::new(config)
                .score_paths(&image, &target)
                .await
                .with_context(|| {
                    format!("scoring {} against {}", image.display(), target.display())
                })?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.score);
            }
        }

        Command::Search {
            background,
            objects,
            target,
            output,
            attempts,
            generations,
            survivors,
            size_min,
            size_max,
            seed,
            lowest_first,
            scoring,
        } => {
            let mut config = SearchConfig::new(background, objects, target, output);
            config.max_attempts = attempts;
            config.survivors = survivors;
            config.seed = seed;
            config.ranking = ranking(lowest_first);
            config.placement = PlacementConfig { size_min, size_max };
            config.scoring = scoring.into_config();
            if let Some(generations) = generations {
                config.generations = generations;
            }

            let mut runner = SearchRunner::new(config).context("preparing search")?;
            let outcome = if generations.is_some() {
                runner.run_generations().await
            } else {
                runner.run_attempts().await
            }
            .context("running search")?;

            let Some(best) = outcome.best(runner.config().ranking) else {
                bail!("every attempt failed ({} skipped)", outcome.failed());
            };
            info!("Best attempt overall: {}", best.label());
            println!("{}", serde_json::to_string_pretty(best)?);
        }

        Command::Rank { dir, lowest_first } => {
            let entries = ledger::scan_materialized(&dir)
                .with_context(|| format!("scanning {}", dir.display()))?;
            let path = dir.join(SORTED_SCORES_FILE);
            ledger::write_sorted_scores(&path, &entries, ranking(lowest_first))?;
            info!("Sorted scores saved to {}", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_accepts_a_colormap_path() {
        let args = ["placement_search", "score", "a.png", "b.png", "--colormap", "map.png"];
        let cli = Cli::try_parse_from(args).expect("parse");
        match cli.command {
            Command::Score { colormap, scoring, .. } => {
                assert_eq!(colormap, PathBuf::from("map.png"));
                let config = scoring.into_config();
                assert_eq!(config.colormap_path, PathBuf::from("difference_colormap.png"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn search_has_no_colormap_flag() {
        let args = [
            "placement_search",
            "search",
            "--background",
            "bg.png",
            "--objects",
            "objects",
            "--target",
            "target.png",
            "--colormap",
            "map.png",
        ];
        assert!(Cli::try_parse_from(args).is_err());
        assert!(Cli::try_parse_from(args[..args.len() - 2].iter().copied()).is_ok());
    }
}
