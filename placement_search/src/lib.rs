// THEORY:
// `placement_search` is the generate-and-test harness around `diff_score`.
// `placement` builds one random composite, `search` runs batches of them through
// the scoring pipeline, and `ledger` persists the ranking of each batch as JSON.
// The binary in `main.rs` is a thin CLI over these three.

pub mod error;
pub mod ledger;
pub mod placement;
pub mod search;

pub use error::{Result, SearchError};
pub use placement::{
    place_object_from_params, place_object_random, PlacementConfig, PlacementParams,
};
pub use search::{materialize, AttemptRecord, Ranking, SearchConfig, SearchOutcome, SearchRunner};
