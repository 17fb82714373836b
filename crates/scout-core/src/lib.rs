// Matchup Scout core library.
//
// Team stat ingestion, rate derivation, expected-game projection, league
// scoring and leaderboards for streaming starting pitchers.

pub mod config;
pub mod db;
pub mod ingest;
pub mod projection;
pub mod scoring;
pub mod stats;
pub mod store;
