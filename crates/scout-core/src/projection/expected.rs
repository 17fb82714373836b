// Expected-game projection: scale a team's rates to one hypothetical start,
// plus the per-game "whole game" formula and the hit-type fallback split.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rates::{PerGameLine, RateLine};
use crate::scoring::{self, PitchingLine, ScoringSettings};
use crate::stats::SplitType;

// ---------------------------------------------------------------------------
// Expected game
// ---------------------------------------------------------------------------

/// Projected opposing-lineup line for one start against one team/split.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpectedGame {
    pub team: String,
    pub split: SplitType,
    pub season: i32,
    /// Name of the scoring settings used for `fantasy_points`; empty if unscored.
    #[serde(default)]
    pub settings_name: String,
    pub expected_innings: f64,
    pub expected_plate_appearances: f64,
    pub expected_runs: f64,
    pub expected_hits: f64,
    pub expected_singles: f64,
    pub expected_doubles: f64,
    pub expected_triples: f64,
    pub expected_home_runs: f64,
    pub expected_walks: f64,
    pub expected_intentional_walks: f64,
    pub expected_hit_by_pitch: f64,
    pub expected_strikeouts: f64,
    pub expected_total_bases: f64,
    pub fantasy_points: f64,
}

impl ExpectedGame {
    /// Attach the point total under `settings`. A game with no expected plate
    /// appearances has no data behind it and scores exactly 0.
    pub fn scored(mut self, settings: &ScoringSettings) -> Self {
        self.fantasy_points = if self.expected_plate_appearances == 0.0 {
            0.0
        } else {
            scoring::score(&self, settings)
        };
        self.settings_name = settings.name.clone();
        self
    }
}

/// Scale `rates` to an outing of `expected_innings`. Expected hits are
/// always the sum of the four hit types. Fantasy points are left at 0.
pub fn project(rates: &RateLine, expected_innings: f64) -> ExpectedGame {
    let pa = expected_innings * rates.pa_per_inning;

    let mut game = ExpectedGame {
        team: rates.team.clone(),
        split: rates.split,
        season: rates.season,
        expected_innings,
        ..ExpectedGame::default()
    };

    if pa == 0.0 || !pa.is_finite() {
        return game;
    }

    game.expected_plate_appearances = pa;
    game.expected_runs = pa * rates.runs_per_pa;
    game.expected_singles = pa * rates.singles_per_pa;
    game.expected_doubles = pa * rates.doubles_per_pa;
    game.expected_triples = pa * rates.triples_per_pa;
    game.expected_home_runs = pa * rates.home_runs_per_pa;
    game.expected_hits = game.expected_singles
        + game.expected_doubles
        + game.expected_triples
        + game.expected_home_runs;
    game.expected_walks = pa * rates.walks_per_pa;
    game.expected_intentional_walks = pa * rates.intentional_walks_per_pa;
    game.expected_hit_by_pitch = pa * rates.hit_by_pitch_per_pa;
    game.expected_strikeouts = pa * rates.strikeouts_per_pa;
    game.expected_total_bases = pa * rates.total_bases_per_pa;

    debug!(
        "projected {} {} over {:.1} IP: {:.2} PA, {:.2} H, {:.2} K",
        game.team, game.split, expected_innings, pa, game.expected_hits, game.expected_strikeouts
    );
    game
}

/// `project` followed by scoring.
pub fn project_scored(
    rates: &RateLine,
    expected_innings: f64,
    settings: &ScoringSettings,
) -> ExpectedGame {
    project(rates, expected_innings).scored(settings)
}

// ---------------------------------------------------------------------------
// Whole-game formula
// ---------------------------------------------------------------------------

/// Game-level inputs to the whole-game formula, as averages per game.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GameOutcome {
    pub win_avg: f64,
    pub loss_avg: f64,
    pub quality_start_avg: f64,
}

/// Points for a start scored straight from per-game counts rather than per-PA
/// rates. A starter records no save. A line with no games behind it scores 0.
pub fn project_generic(
    per_game: &PerGameLine,
    outcome: GameOutcome,
    innings: f64,
    settings: &ScoringSettings,
) -> f64 {
    if per_game.games == 0 {
        return 0.0;
    }
    let line = PitchingLine {
        innings,
        earned_runs: per_game.runs,
        walks: per_game.walks,
        hits: per_game.hits,
        home_runs: per_game.home_runs,
        strikeouts: per_game.strikeouts,
        saves: 0.0,
        wins: outcome.win_avg,
        losses: outcome.loss_avg,
        quality_starts: outcome.quality_start_avg,
        ..PitchingLine::default()
    };
    scoring::score_pitching_line(&line, settings)
}

// ---------------------------------------------------------------------------
// Hit distribution fallback
// ---------------------------------------------------------------------------

/// Fixed split of total hits into hit types, used only when a data source
/// provides hits without the breakdown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitDistribution {
    pub singles: f64,
    pub doubles: f64,
    pub triples: f64,
    pub home_runs: f64,
}

impl Default for HitDistribution {
    fn default() -> Self {
        Self {
            singles: 0.75,
            doubles: 0.20,
            triples: 0.03,
            home_runs: 0.02,
        }
    }
}

impl HitDistribution {
    /// Whole-number hit-type counts summing exactly to `hits`. Singles absorb
    /// the rounding remainder.
    pub fn split(&self, hits: i64) -> (i64, i64, i64, i64) {
        let h = hits as f64;
        let doubles = (h * self.doubles).round() as i64;
        let triples = (h * self.triples).round() as i64;
        let home_runs = (h * self.home_runs).round() as i64;
        let singles = (hits - doubles - triples - home_runs).max(0);
        (singles, doubles, triples, home_runs)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
