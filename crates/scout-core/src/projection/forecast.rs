// Season-long forecasts: batters from per-PA rates and projected PA,
// starting pitchers from last season's line and projected starts.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::rates::RateLine;
use crate::scoring::{self, BattingLine, PitchingLine, ScoringSettings};

// ---------------------------------------------------------------------------
// Batters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatterForecast {
    pub projected_pa: f64,
    pub line: BattingLine,
    pub fantasy_points: f64,
}

impl BatterForecast {
    /// Average this forecast's points with a previous season total.
    pub fn hedged(&self, previous_total: f64) -> f64 {
        scoring::round2((self.fantasy_points + previous_total) / 2.0)
    }
}

/// Every batting event rate times `projected_pa`, scored with the batting
/// table.
pub fn forecast_batter_season(
    rates: &RateLine,
    projected_pa: f64,
    settings: &ScoringSettings,
) -> BatterForecast {
    let pa = if projected_pa.is_finite() && projected_pa > 0.0 {
        projected_pa
    } else {
        0.0
    };
    let line = BattingLine {
        singles: pa * rates.singles_per_pa,
        doubles: pa * rates.doubles_per_pa,
        triples: pa * rates.triples_per_pa,
        home_runs: pa * rates.home_runs_per_pa,
        walks: pa * rates.walks_per_pa,
        intentional_walks: pa * rates.intentional_walks_per_pa,
        hit_by_pitch: pa * rates.hit_by_pitch_per_pa,
        runs: pa * rates.runs_per_pa,
        rbis: pa * rates.rbis_per_pa,
        stolen_bases: pa * rates.stolen_bases_per_pa,
        caught_stealing: pa * rates.caught_stealing_per_pa,
        strikeouts: pa * rates.strikeouts_per_pa,
        total_bases: pa * rates.total_bases_per_pa,
    };
    let fantasy_points = scoring::score_batting_line(&line, settings);
    debug!("{}: {:.0} PA -> {:.2} pts", rates.team, pa, fantasy_points);
    BatterForecast {
        projected_pa: pa,
        line,
        fantasy_points,
    }
}

// ---------------------------------------------------------------------------
// Starting pitchers
// ---------------------------------------------------------------------------

/// A starter's previous season totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PitcherSeasonLine {
    pub name: String,
    pub games_started: u32,
    pub innings_pitched: f64,
    pub hits: u32,
    pub home_runs: u32,
    pub walks: u32,
    pub strikeouts: u32,
    pub wins: u32,
    pub losses: u32,
    pub era: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitcherForecast {
    pub name: String,
    pub projected_starts: f64,
    pub line: PitchingLine,
    pub fantasy_points: f64,
}

/// Project a starter's season: innings = starts x (IP / GS), counting stats
/// from last season's per-inning rates, earned runs from ERA (or the supplied
/// FIP), wins and losses per start.
pub fn forecast_pitcher_season(
    season: &PitcherSeasonLine,
    projected_starts: f64,
    projected_fip: Option<f64>,
    settings: &ScoringSettings,
) -> PitcherForecast {
    let zero = PitcherForecast {
        name: season.name.clone(),
        projected_starts,
        line: PitchingLine::default(),
        fantasy_points: 0.0,
    };
    if season.games_started == 0 || season.innings_pitched <= 0.0 || projected_starts <= 0.0 {
        warn!(
            "{}: no starts or innings to extrapolate from, forecasting zero",
            season.name
        );
        return zero;
    }

    let gs = f64::from(season.games_started);
    let ip = season.innings_pitched;
    let innings = projected_starts * (ip / gs);
    let per_inning = |count: u32| f64::from(count) / ip * innings;
    let run_average = projected_fip.unwrap_or(season.era);

    let line = PitchingLine {
        innings,
        earned_runs: run_average / 9.0 * innings,
        hits: per_inning(season.hits),
        home_runs: per_inning(season.home_runs),
        walks: per_inning(season.walks),
        strikeouts: per_inning(season.strikeouts),
        wins: f64::from(season.wins) / gs * projected_starts,
        losses: f64::from(season.losses) / gs * projected_starts,
        ..PitchingLine::default()
    };
    let fantasy_points = scoring::score_pitching_line(&line, settings);
    debug!(
        "{}: {:.0} GS, {:.1} IP -> {:.2} pts",
        season.name, projected_starts, innings, fantasy_points
    );
    PitcherForecast {
        line,
        fantasy_points,
        ..zero
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::rates::compute_rates;
    use crate::scoring::LeagueType;
    use crate::stats::RawStatLine;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn batter_rates() -> RateLine {
        compute_rates(&RawStatLine {
            team_abbreviation: "judge".into(),
            season: 2024,
            games: 150,
            plate_appearances: 700,
            singles: 70,
            doubles: 35,
            triples: 0,
            home_runs: 35,
            walks: 105,
            runs: 105,
            rbis: 105,
            strikeouts: 175,
            ..RawStatLine::default()
        })
    }

    fn ace() -> PitcherSeasonLine {
        PitcherSeasonLine {
            name: "Ace".into(),
            games_started: 30,
            innings_pitched: 180.0,
            hits: 150,
            home_runs: 18,
            walks: 45,
            strikeouts: 210,
            wins: 15,
            losses: 6,
            era: 3.00,
        }
    }

    #[test]
    fn batter_forecast_scales_rates() {
        let espn = ScoringSettings::preset(LeagueType::Espn);
        let f = forecast_batter_season(&batter_rates(), 350.0, &espn);
        assert!(approx_eq(f.line.home_runs, 17.5, 1e-9));
        assert!(approx_eq(f.line.walks, 52.5, 1e-9));
        // 35 + 35 + 0 + 70 + 52.5 + 52.5 + 52.5 - 43.75
        assert!(approx_eq(f.fantasy_points, 253.75, 1e-9));
    }

    #[test]
    fn hedge_averages_with_previous_total() {
        let espn = ScoringSettings::preset(LeagueType::Espn);
        let f = forecast_batter_season(&batter_rates(), 350.0, &espn);
        assert!(approx_eq(f.hedged(300.0), (253.75 + 300.0) / 2.0, 1e-2));
    }

    #[test]
    fn non_positive_pa_forecasts_zero() {
        let espn = ScoringSettings::preset(LeagueType::Espn);
        let f = forecast_batter_season(&batter_rates(), -5.0, &espn);
        assert_eq!(f.projected_pa, 0.0);
        assert_eq!(f.fantasy_points, 0.0);
    }

    #[test]
    fn pitcher_forecast_extrapolates_per_start_and_inning() {
        let default = ScoringSettings::preset(LeagueType::Default);
        let f = forecast_pitcher_season(&ace(), 20.0, None, &default);
        assert!(approx_eq(f.line.innings, 120.0, 1e-9));
        assert!(approx_eq(f.line.earned_runs, 40.0, 1e-9));
        assert!(approx_eq(f.line.strikeouts, 140.0, 1e-9));
        assert!(approx_eq(f.line.wins, 10.0, 1e-9));
        assert!(approx_eq(f.line.losses, 4.0, 1e-9));
        // 360 - 40 - 30 - 100 - 36 + 140 + 50 - 12
        assert!(approx_eq(f.fantasy_points, 332.0, 1e-9));
    }

    #[test]
    fn fip_replaces_era_for_earned_runs() {
        let default = ScoringSettings::preset(LeagueType::Default);
        let f = forecast_pitcher_season(&ace(), 20.0, Some(4.5), &default);
        assert!(approx_eq(f.line.earned_runs, 60.0, 1e-9));
    }

    #[test]
    fn pitcher_without_starts_forecasts_zero() {
        let default = ScoringSettings::preset(LeagueType::Default);
        let season = PitcherSeasonLine {
            games_started: 0,
            ..ace()
        };
        let f = forecast_pitcher_season(&season, 30.0, None, &default);
        assert_eq!(f.fantasy_points, 0.0);
        assert_eq!(f.line, PitchingLine::default());
    }
}
