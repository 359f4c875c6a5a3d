// THEORY:
// The `ledger` is the persisted memory of a search. It writes two JSON files per
// batch and can rebuild the ranking from a materialized output directory:
//
// - `highest_score.json`: `{ "highest_score": "<attempt id>_<score>" }`, the
//   label of the best attempt of the batch.
// - `sorted_scores.json`: every scored attempt as `{ attempt, score }`, best
//   first according to the batch's ranking.
//
// Materialized attempts live in directories named `<attempt id>_<score>`, so the
// directory listing alone is enough to recover the scores (`scan_materialized`).

use crate::error::{Result, SearchError};
use crate::search::{AttemptRecord, Ranking};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const HIGHEST_SCORE_FILE: &str = "highest_score.json";
pub const SORTED_SCORES_FILE: &str = "sorted_scores.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighestScore {
    pub highest_score: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<u32>,
    pub attempt: u32,
    pub score: f64,
}

impl From<&AttemptRecord> for ScoreEntry {
    fn from(record: &AttemptRecord) -> Self {
        Self {
            generation: record.generation,
            attempt: record.attempt,
            score: record.score,
        }
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|source| SearchError::Ledger {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, json).map_err(SearchError::io(path))
}

pub fn write_highest_score(dir: &Path, best: &AttemptRecord) -> Result<PathBuf> {
    let path = dir.join(HIGHEST_SCORE_FILE);
    write_json(&path, &HighestScore { highest_score: best.label() })?;
    Ok(path)
}

pub fn write_sorted_scores(path: &Path, entries: &[ScoreEntry], ranking: Ranking) -> Result<()> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| ranking.compare(a.score, b.score));
    write_json(path, &sorted)
}

pub fn read_sorted_scores(path: &Path) -> Result<Vec<ScoreEntry>> {
    let json = std::fs::read_to_string(path).map_err(SearchError::io(path))?;
    serde_json::from_str(&json).map_err(|source| SearchError::Ledger {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses `<attempt>_<score>` or `<generation>_<attempt>_<score>`.
pub fn parse_label(label: &str) -> Option<ScoreEntry> {
    let parts: Vec<&str> = label.split('_').collect();
    let (generation, attempt, score) = match parts.as_slice() {
        [attempt, score] => (None, *attempt, *score),
        [generation, attempt, score] => (Some(generation.parse().ok()?), *attempt, *score),
        _ => return None,
    };
    let score: f64 = score.parse().ok()?;
    if !score.is_finite() {
        return None;
    }
    Some(ScoreEntry {
        generation,
        attempt: attempt.parse().ok()?,
        score,
    })
}

/// Rebuilds score entries from the attempt directories under `dir`.
pub fn scan_materialized(dir: &Path) -> Result<Vec<ScoreEntry>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(SearchError::io(dir))? {
        let entry = entry.map_err(SearchError::io(dir))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.contains('_') || !entry.path().is_dir() {
            continue;
        }
        match parse_label(&name) {
            Some(score) => entries.push(score),
            None => warn!("Skipping {name} due to unexpected format."),
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_parse_with_and_without_generation() {
        assert_eq!(
            parse_label("12_345.5"),
            Some(ScoreEntry { generation: None, attempt: 12, score: 345.5 })
        );
        assert_eq!(
            parse_label("3_7_0"),
            Some(ScoreEntry { generation: Some(3), attempt: 7, score: 0.0 })
        );
        assert_eq!(parse_label("generation_1"), None);
        assert_eq!(parse_label("a_b_c_d"), None);
        assert_eq!(parse_label("1_NaN"), None);
    }

    #[test]
    fn sorted_scores_round_trip_in_rank_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SORTED_SCORES_FILE);
        let entries = vec![
            ScoreEntry { generation: None, attempt: 1, score: 10.0 },
            ScoreEntry { generation: None, attempt: 2, score: 30.0 },
            ScoreEntry { generation: None, attempt: 3, score: 20.0 },
        ];

        write_sorted_scores(&path, &entries, Ranking::HighestFirst).expect("write");
        let read = read_sorted_scores(&path).expect("read");
        let attempts: Vec<u32> = read.iter().map(|e| e.attempt).collect();
        assert_eq!(attempts, vec![2, 3, 1]);

        write_sorted_scores(&path, &entries, Ranking::LowestFirst).expect("write");
        let read = read_sorted_scores(&path).expect("read");
        let attempts: Vec<u32> = read.iter().map(|e| e.attempt).collect();
        assert_eq!(attempts, vec![1, 3, 2]);
    }

    #[test]
    fn scan_skips_files_and_foreign_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("4_120.25")).expect("mkdir");
        std::fs::create_dir(dir.path().join("2_1_99")).expect("mkdir");
        std::fs::create_dir(dir.path().join("not_a_score")).expect("mkdir");
        std::fs::write(dir.path().join("5_1.png"), b"").expect("touch");

        let mut scanned = scan_materialized(dir.path()).expect("scan");
        scanned.sort_by_key(|e| e.attempt);
        assert_eq!(
            scanned,
            vec![
                ScoreEntry { generation: Some(2), attempt: 1, score: 99.0 },
                ScoreEntry { generation: None, attempt: 4, score: 120.25 },
            ]
        );
    }
}
