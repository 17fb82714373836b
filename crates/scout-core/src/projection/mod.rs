pub mod expected;
pub mod forecast;
pub mod leaderboard;
pub mod rates;

use thiserror::Error;

use crate::scoring::ScoringError;
use crate::stats::SplitType;

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("no stat line for {team} ({split}, {season})")]
    MissingData {
        team: String,
        split: SplitType,
        season: i32,
    },

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
