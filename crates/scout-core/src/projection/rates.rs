// Raw counting stats -> per-PA and per-game rates, plus advisory validation
// of incoming stat records.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::stats::{RawStatLine, RawStatRecord, SplitType};

// ---------------------------------------------------------------------------
// Rate line
// ---------------------------------------------------------------------------

/// Per-plate-appearance and per-game rates for one team, split and season.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateLine {
    pub team: String,
    pub split: SplitType,
    pub season: i32,
    pub strikeouts_per_pa: f64,
    pub runs_per_pa: f64,
    pub walks_per_pa: f64,
    pub singles_per_pa: f64,
    pub doubles_per_pa: f64,
    pub triples_per_pa: f64,
    pub home_runs_per_pa: f64,
    pub total_bases_per_pa: f64,
    pub intentional_walks_per_pa: f64,
    pub hit_by_pitch_per_pa: f64,
    pub rbis_per_pa: f64,
    pub stolen_bases_per_pa: f64,
    pub caught_stealing_per_pa: f64,
    /// Plate appearances per inning: `(PA / games) / 9`.
    pub pa_per_inning: f64,
    pub wins_per_game: f64,
    pub losses_per_game: f64,
}

fn ratio(count: u32, denom: u32) -> f64 {
    if denom == 0 {
        0.0
    } else {
        f64::from(count) / f64::from(denom)
    }
}

/// Derive rates from a raw line. Zero PA or zero games yields 0.0 for every
/// rate with that denominator.
pub fn compute_rates(raw: &RawStatLine) -> RateLine {
    let pa = raw.plate_appearances;
    let games = raw.games;

    if pa == 0 {
        warn!(
            "{} {} {}: zero plate appearances, per-PA rates set to 0",
            raw.team_abbreviation, raw.split_type, raw.season
        );
    }
    if games == 0 {
        warn!(
            "{} {} {}: zero games, per-game rates set to 0",
            raw.team_abbreviation, raw.split_type, raw.season
        );
    }

    RateLine {
        team: raw.team_abbreviation.clone(),
        split: raw.split_type,
        season: raw.season,
        strikeouts_per_pa: ratio(raw.strikeouts, pa),
        runs_per_pa: ratio(raw.runs, pa),
        walks_per_pa: ratio(raw.walks, pa),
        singles_per_pa: ratio(raw.singles, pa),
        doubles_per_pa: ratio(raw.doubles, pa),
        triples_per_pa: ratio(raw.triples, pa),
        home_runs_per_pa: ratio(raw.home_runs, pa),
        total_bases_per_pa: ratio(raw.total_bases, pa),
        intentional_walks_per_pa: ratio(raw.intentional_walks, pa),
        hit_by_pitch_per_pa: ratio(raw.hit_by_pitch, pa),
        rbis_per_pa: ratio(raw.rbis, pa),
        stolen_bases_per_pa: ratio(raw.stolen_bases, pa),
        caught_stealing_per_pa: ratio(raw.caught_stealing, pa),
        pa_per_inning: ratio(pa, games) / 9.0,
        wins_per_game: ratio(raw.wins, games),
        losses_per_game: ratio(raw.losses, games),
    }
}

// ---------------------------------------------------------------------------
// Per-game line
// ---------------------------------------------------------------------------

/// Per-game counts feeding the whole-game scoring formula.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerGameLine {
    pub team: String,
    pub season: i32,
    pub games: u32,
    pub runs: f64,
    pub hits: f64,
    pub home_runs: f64,
    pub walks: f64,
    pub strikeouts: f64,
    pub wins: f64,
    pub losses: f64,
}

pub fn per_game_line(raw: &RawStatLine) -> PerGameLine {
    let g = raw.games;
    PerGameLine {
        team: raw.team_abbreviation.clone(),
        season: raw.season,
        games: g,
        runs: ratio(raw.runs, g),
        hits: ratio(raw.hits, g),
        home_runs: ratio(raw.home_runs, g),
        walks: ratio(raw.walks, g),
        strikeouts: ratio(raw.strikeouts, g),
        wins: ratio(raw.wins, g),
        losses: ratio(raw.losses, g),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

const REQUIRED_FIELDS: [&str; 7] = [
    "games",
    "plate_appearances",
    "hits",
    "singles",
    "doubles",
    "triples",
    "home_runs",
];

/// PA may differ from AB + BB + HBP by this fraction of PA (sacrifices and
/// catcher interference are not tracked).
const PA_TOLERANCE: f64 = 0.10;
const HIGH_STRIKEOUT_RATE: f64 = 0.5;
const HIGH_WALK_RATE: f64 = 0.25;

/// Findings from checking one stat record. Errors are consistency or presence
/// failures; warnings are range flags that do not invalidate the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Advisory consistency check of a stat record. Never blocks computation.
pub fn validate(record: &RawStatRecord) -> ValidationReport {
    let mut report = ValidationReport::default();

    if record
        .team_abbreviation
        .as_deref()
        .map_or(true, |t| t.trim().is_empty())
    {
        report.errors.push("missing required field: team_abbreviation".into());
    }

    let counts = record.counts();
    let get = |name: &str| {
        counts
            .iter()
            .find(|(field, _)| *field == name)
            .and_then(|(_, v)| *v)
    };

    for field in REQUIRED_FIELDS {
        if get(field).is_none() {
            report.errors.push(format!("missing required field: {field}"));
        }
    }

    for (field, value) in counts.iter() {
        if let Some(v) = value {
            if *v < 0 {
                report.errors.push(format!("{field} cannot be negative: {v}"));
            }
        }
    }

    let pa = get("plate_appearances").unwrap_or(0);
    if let (Some(ab), Some(bb), Some(hbp)) = (get("at_bats"), get("walks"), get("hit_by_pitch")) {
        let derived = ab.saturating_add(bb).saturating_add(hbp);
        if pa > 0 && (pa.abs_diff(derived) as f64) > pa as f64 * PA_TOLERANCE {
            report.errors.push(format!(
                "plate_appearances ({pa}) inconsistent with at_bats + walks + hit_by_pitch ({derived})"
            ));
        }
    }

    if let (Some(h), Some(s), Some(d), Some(t), Some(hr)) = (
        get("hits"),
        get("singles"),
        get("doubles"),
        get("triples"),
        get("home_runs"),
    ) {
        match [s, d, t, hr].into_iter().try_fold(0i64, i64::checked_add) {
            Some(sum) if sum != h => report.errors.push(format!(
                "hits ({h}) does not equal singles + doubles + triples + home_runs ({sum})"
            )),
            Some(_) => {}
            None => report.errors.push("hit types overflow when summed".into()),
        }
        if let Some(tb) = get("total_bases") {
            let expected_tb = [(s, 1), (d, 2), (t, 3), (hr, 4)]
                .into_iter()
                .try_fold(0i64, |acc, (n, bases)| n.checked_mul(bases)?.checked_add(acc));
            match expected_tb {
                Some(expected) if expected != tb => report.errors.push(format!(
                    "total_bases ({tb}) does not match hit types ({expected})"
                )),
                Some(_) => {}
                None => report.errors.push("total bases overflow when derived from hit types".into()),
            }
        }
    }

    if pa > 0 {
        let k_rate = get("strikeouts").unwrap_or(0) as f64 / pa as f64;
        if k_rate > HIGH_STRIKEOUT_RATE {
            report
                .warnings
                .push(format!("strikeout rate unusually high: {k_rate:.3}"));
        }
        let bb_rate = get("walks").unwrap_or(0) as f64 / pa as f64;
        if bb_rate > HIGH_WALK_RATE {
            report
                .warnings
                .push(format!("walk rate unusually high: {bb_rate:.3}"));
        }
    }

    report
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn sample_line() -> RawStatLine {
        RawStatLine {
            team_abbreviation: "NYY".into(),
            split_type: SplitType::Lefty,
            season: 2024,
            games: 138,
            plate_appearances: 1741,
            home_runs: 66,
            walks: 151,
            strikeouts: 345,
            wins: 17,
            losses: 26,
            ..RawStatLine::default()
        }
    }

    fn clean_record() -> RawStatRecord {
        RawStatRecord {
            team_abbreviation: Some("BOS".into()),
            split_type: Some("overall".into()),
            season: Some(2024),
            games: Some(162),
            plate_appearances: Some(6200),
            at_bats: Some(5550),
            walks: Some(560),
            hit_by_pitch: Some(70),
            hits: Some(1400),
            singles: Some(900),
            doubles: Some(300),
            triples: Some(20),
            home_runs: Some(180),
            total_bases: Some(900 + 600 + 60 + 720),
            strikeouts: Some(1400),
            ..RawStatRecord::default()
        }
    }

    #[test]
    fn rates_match_worked_example() {
        let rates = compute_rates(&sample_line());
        assert!(approx_eq(rates.home_runs_per_pa, 0.03790, 1e-5));
        assert!(approx_eq(rates.pa_per_inning, 1.4021, 1e-3));
        assert!(approx_eq(rates.wins_per_game, 0.1232, 1e-4));
        assert!(approx_eq(rates.losses_per_game, 26.0 / 138.0, 1e-12));
        assert!(approx_eq(rates.walks_per_pa, 151.0 / 1741.0, 1e-12));
    }

    #[test]
    fn losses_per_game_uses_losses() {
        let rates = compute_rates(&sample_line());
        assert!(rates.losses_per_game > rates.wins_per_game);
    }

    #[test]
    fn zero_pa_gives_zero_rates() {
        let line = RawStatLine {
            plate_appearances: 0,
            games: 0,
            ..sample_line()
        };
        let rates = compute_rates(&line);
        assert_eq!(rates.home_runs_per_pa, 0.0);
        assert_eq!(rates.strikeouts_per_pa, 0.0);
        assert_eq!(rates.pa_per_inning, 0.0);
        assert_eq!(rates.wins_per_game, 0.0);
        assert_eq!(rates.losses_per_game, 0.0);
    }

    #[test]
    fn zero_games_keeps_per_pa_rates() {
        let line = RawStatLine {
            games: 0,
            ..sample_line()
        };
        let rates = compute_rates(&line);
        assert_eq!(rates.pa_per_inning, 0.0);
        assert!(rates.home_runs_per_pa > 0.0);
    }

    #[test]
    fn per_game_line_divides_by_games() {
        let line = RawStatLine {
            runs: 276,
            hits: 276 * 2,
            ..sample_line()
        };
        let pg = per_game_line(&line);
        assert!(approx_eq(pg.runs, 2.0, 1e-12));
        assert!(approx_eq(pg.hits, 4.0, 1e-12));
        assert!(approx_eq(pg.strikeouts, 2.5, 1e-12));
        assert_eq!(pg.games, 138);
        assert!(approx_eq(pg.wins, 17.0 / 138.0, 1e-12));
    }

    #[test]
    fn clean_record_is_valid() {
        let report = validate(&clean_record());
        assert!(report.is_valid(), "unexpected errors: {:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn hits_identity_violation_is_reported() {
        let rec = RawStatRecord {
            hits: Some(1401),
            ..clean_record()
        };
        let report = validate(&rec);
        assert!(!report.is_valid());
        assert!(report.errors.iter().any(|e| e.starts_with("hits")));
    }

    #[test]
    fn missing_required_fields_are_reported() {
        let rec = RawStatRecord {
            team_abbreviation: None,
            singles: None,
            ..clean_record()
        };
        let report = validate(&rec);
        assert_eq!(
            report.errors,
            vec![
                "missing required field: team_abbreviation".to_string(),
                "missing required field: singles".to_string(),
            ]
        );
    }

    #[test]
    fn pa_mismatch_beyond_tolerance_is_reported() {
        let rec = RawStatRecord {
            at_bats: Some(4000),
            ..clean_record()
        };
        let report = validate(&rec);
        assert!(report.errors.iter().any(|e| e.contains("plate_appearances")));
    }

    #[test]
    fn negative_count_is_reported() {
        let rec = RawStatRecord {
            stolen_bases: Some(-1),
            ..clean_record()
        };
        let report = validate(&rec);
        assert!(report.errors.contains(&"stolen_bases cannot be negative: -1".to_string()));
    }

    #[test]
    fn high_rates_are_warnings_not_errors() {
        let rec = RawStatRecord {
            strikeouts: Some(3200),
            ..clean_record()
        };
        let report = validate(&rec);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("strikeout rate"));
    }

    #[test]
    fn absurd_counts_are_reported_not_overflowed() {
        let rec = RawStatRecord {
            at_bats: Some(i64::MAX),
            home_runs: Some(i64::MAX),
            ..clean_record()
        };
        let report = validate(&rec);
        assert!(!report.is_valid());
        assert!(report.errors.iter().any(|e| e.contains("plate_appearances")));
        assert!(report.errors.contains(&"hit types overflow when summed".to_string()));
        assert!(report
            .errors
            .contains(&"total bases overflow when derived from hit types".to_string()));
    }
}
