// League scoring: event vocabularies, weight tables, built-in presets, and the
// weighted point sums applied to expected and actual stat lines.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

use crate::projection::expected::ExpectedGame;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    #[error("non-finite weight for {table} event `{code}`: {value}")]
    NonFiniteWeight {
        table: &'static str,
        code: String,
        value: f64,
    },

    #[error("league type Custom requires a custom scoring table")]
    MissingCustomTable,

    #[error("failed to parse scoring table: {0}")]
    Parse(String),
}

// ---------------------------------------------------------------------------
// Event vocabularies
// ---------------------------------------------------------------------------

/// An event that carries a weight in a scoring table.
pub trait ScoringEvent: Copy + Ord + fmt::Debug {
    /// Human-readable table name used in log and error messages.
    const TABLE: &'static str;

    /// Parse either the short code (`HR`) or the long token (`homeRuns`).
    fn parse(s: &str) -> Option<Self>;

    /// The short code, e.g. `HR`.
    fn code(&self) -> &'static str;
}

/// Batting events scored for (or against) a hitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BattingEvent {
    Singles,
    Doubles,
    Triples,
    HomeRuns,
    Walks,
    IntentionalWalks,
    HitByPitch,
    Runs,
    Rbis,
    StolenBases,
    CaughtStealing,
    Strikeouts,
    TotalBases,
}

impl BattingEvent {
    pub const ALL: [BattingEvent; 13] = [
        BattingEvent::Singles,
        BattingEvent::Doubles,
        BattingEvent::Triples,
        BattingEvent::HomeRuns,
        BattingEvent::Walks,
        BattingEvent::IntentionalWalks,
        BattingEvent::HitByPitch,
        BattingEvent::Runs,
        BattingEvent::Rbis,
        BattingEvent::StolenBases,
        BattingEvent::CaughtStealing,
        BattingEvent::Strikeouts,
        BattingEvent::TotalBases,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            BattingEvent::Singles => "singles",
            BattingEvent::Doubles => "doubles",
            BattingEvent::Triples => "triples",
            BattingEvent::HomeRuns => "homeRuns",
            BattingEvent::Walks => "walks",
            BattingEvent::IntentionalWalks => "intentionalWalks",
            BattingEvent::HitByPitch => "hitByPitch",
            BattingEvent::Runs => "runs",
            BattingEvent::Rbis => "rbis",
            BattingEvent::StolenBases => "stolenBases",
            BattingEvent::CaughtStealing => "caughtStealing",
            BattingEvent::Strikeouts => "strikeouts",
            BattingEvent::TotalBases => "totalBases",
        }
    }
}

impl ScoringEvent for BattingEvent {
    const TABLE: &'static str = "batting";

    fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        BattingEvent::ALL.into_iter().find(|e| {
            e.code().eq_ignore_ascii_case(s) || e.token().eq_ignore_ascii_case(s)
        })
    }

    fn code(&self) -> &'static str {
        match self {
            BattingEvent::Singles => "S",
            BattingEvent::Doubles => "D",
            BattingEvent::Triples => "T",
            BattingEvent::HomeRuns => "HR",
            BattingEvent::Walks => "BB",
            BattingEvent::IntentionalWalks => "IBB",
            BattingEvent::HitByPitch => "HBP",
            BattingEvent::Runs => "R",
            BattingEvent::Rbis => "RBI",
            BattingEvent::StolenBases => "SB",
            BattingEvent::CaughtStealing => "CS",
            BattingEvent::Strikeouts => "SO",
            BattingEvent::TotalBases => "TB",
        }
    }
}

/// Pitching events scored for a pitcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PitchingEvent {
    Innings,
    Wins,
    Losses,
    Saves,
    BlownSaves,
    QualityStarts,
    EarnedRuns,
    HitsAllowed,
    WalksIssued,
    IntentionalWalks,
    HomeRunsAllowed,
    HitBatters,
    Strikeouts,
    TotalBases,
    Holds,
}

impl PitchingEvent {
    pub const ALL: [PitchingEvent; 15] = [
        PitchingEvent::Innings,
        PitchingEvent::Wins,
        PitchingEvent::Losses,
        PitchingEvent::Saves,
        PitchingEvent::BlownSaves,
        PitchingEvent::QualityStarts,
        PitchingEvent::EarnedRuns,
        PitchingEvent::HitsAllowed,
        PitchingEvent::WalksIssued,
        PitchingEvent::IntentionalWalks,
        PitchingEvent::HomeRunsAllowed,
        PitchingEvent::HitBatters,
        PitchingEvent::Strikeouts,
        PitchingEvent::TotalBases,
        PitchingEvent::Holds,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            PitchingEvent::Innings => "innings",
            PitchingEvent::Wins => "wins",
            PitchingEvent::Losses => "losses",
            PitchingEvent::Saves => "saves",
            PitchingEvent::BlownSaves => "blownSaves",
            PitchingEvent::QualityStarts => "qualityStarts",
            PitchingEvent::EarnedRuns => "earnedRuns",
            PitchingEvent::HitsAllowed => "hitsAllowed",
            PitchingEvent::WalksIssued => "walksIssued",
            PitchingEvent::IntentionalWalks => "intentionalWalks",
            PitchingEvent::HomeRunsAllowed => "homeRunsAllowed",
            PitchingEvent::HitBatters => "hitBatters",
            PitchingEvent::Strikeouts => "strikeouts",
            PitchingEvent::TotalBases => "totalBases",
            PitchingEvent::Holds => "holds",
        }
    }
}

impl ScoringEvent for PitchingEvent {
    const TABLE: &'static str = "pitching";

    fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        // Older tables spell holds as "Hold" or "HD".
        if ["hold", "hd"].iter().any(|alias| alias.eq_ignore_ascii_case(s)) {
            return Some(PitchingEvent::Holds);
        }
        PitchingEvent::ALL.into_iter().find(|e| {
            e.code().eq_ignore_ascii_case(s) || e.token().eq_ignore_ascii_case(s)
        })
    }

    fn code(&self) -> &'static str {
        match self {
            PitchingEvent::Innings => "INN",
            PitchingEvent::Wins => "W",
            PitchingEvent::Losses => "L",
            PitchingEvent::Saves => "S",
            PitchingEvent::BlownSaves => "BS",
            PitchingEvent::QualityStarts => "QS",
            PitchingEvent::EarnedRuns => "ER",
            PitchingEvent::HitsAllowed => "HA",
            PitchingEvent::WalksIssued => "BB",
            PitchingEvent::IntentionalWalks => "IBB",
            PitchingEvent::HomeRunsAllowed => "HRA",
            PitchingEvent::HitBatters => "HB",
            PitchingEvent::Strikeouts => "K",
            PitchingEvent::TotalBases => "TB",
            PitchingEvent::Holds => "HLD",
        }
    }
}

// ---------------------------------------------------------------------------
// Weight tables
// ---------------------------------------------------------------------------

/// Event -> weight map. Events absent from the table weigh exactly 0.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable<E: ScoringEvent> {
    weights: BTreeMap<E, f64>,
}

impl<E: ScoringEvent> Default for WeightTable<E> {
    fn default() -> Self {
        Self {
            weights: BTreeMap::new(),
        }
    }
}

impl<E: ScoringEvent> WeightTable<E> {
    pub fn from_pairs(pairs: &[(E, f64)]) -> Self {
        Self {
            weights: pairs.iter().copied().collect(),
        }
    }

    /// Build a table from code/token keys. Unknown keys are logged and
    /// dropped; non-finite weights are rejected.
    pub fn from_codes(codes: &BTreeMap<String, f64>) -> Result<Self, ScoringError> {
        let mut weights = BTreeMap::new();
        for (code, &value) in codes {
            let Some(event) = E::parse(code) else {
                warn!("ignoring unknown {} scoring key `{}`", E::TABLE, code);
                continue;
            };
            if !value.is_finite() {
                return Err(ScoringError::NonFiniteWeight {
                    table: E::TABLE,
                    code: code.clone(),
                    value,
                });
            }
            weights.insert(event, value);
        }
        Ok(Self { weights })
    }

    /// Weight for `event`, or 0.0 when the table does not mention it.
    pub fn weight(&self, event: E) -> f64 {
        self.weights.get(&event).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (E, f64)> + '_ {
        self.weights.iter().map(|(e, w)| (*e, *w))
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Code-keyed view, the inverse of `from_codes`.
    pub fn to_codes(&self) -> BTreeMap<String, f64> {
        self.iter().map(|(e, w)| (e.code().to_string(), w)).collect()
    }
}

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

use BattingEvent as B;
use PitchingEvent as P;

const DEFAULT_BATTING: &[(BattingEvent, f64)] = &[
    (B::Singles, 1.0),
    (B::Doubles, 2.0),
    (B::Triples, 3.0),
    (B::HomeRuns, 4.0),
    (B::Walks, 1.0),
    (B::IntentionalWalks, 1.0),
    (B::HitByPitch, 1.0),
    (B::Runs, 1.0),
    (B::Rbis, 1.0),
    (B::StolenBases, 2.0),
    (B::CaughtStealing, -1.0),
    (B::Strikeouts, -1.0),
    (B::TotalBases, 0.25),
];

const DEFAULT_PITCHING: &[(PitchingEvent, f64)] = &[
    (P::WalksIssued, -1.0),
    (P::IntentionalWalks, -1.0),
    (P::EarnedRuns, -1.0),
    (P::HitsAllowed, -1.0),
    (P::HitBatters, -1.0),
    (P::HomeRunsAllowed, -3.0),
    (P::Innings, 3.0),
    (P::Strikeouts, 1.0),
    (P::Wins, 5.0),
    (P::Losses, -3.0),
    (P::Saves, 5.0),
    (P::BlownSaves, 0.0),
    (P::QualityStarts, 0.0),
    (P::TotalBases, -0.25),
];

// ESPN and CBS share a batting table.
const ESPN_BATTING: &[(BattingEvent, f64)] = &[
    (B::Singles, 1.0),
    (B::Doubles, 2.0),
    (B::Triples, 3.0),
    (B::HomeRuns, 4.0),
    (B::Walks, 1.0),
    (B::IntentionalWalks, 0.0),
    (B::HitByPitch, 1.0),
    (B::Runs, 1.0),
    (B::Rbis, 1.0),
    (B::StolenBases, 2.0),
    (B::CaughtStealing, -1.0),
    (B::Strikeouts, -0.5),
];

const ESPN_PITCHING: &[(PitchingEvent, f64)] = &[
    (P::WalksIssued, -1.0),
    (P::IntentionalWalks, 0.0),
    (P::EarnedRuns, -1.0),
    (P::HitsAllowed, -1.0),
    (P::HitBatters, 0.0),
    (P::HomeRunsAllowed, 0.0),
    (P::Innings, 3.0),
    (P::Strikeouts, 0.5),
    (P::Wins, 7.0),
    (P::Losses, -5.0),
    (P::Saves, 5.0),
    (P::BlownSaves, 0.0),
    (P::QualityStarts, 3.0),
    (P::TotalBases, 0.0),
    (P::Holds, 0.0),
];

const CBS_PITCHING: &[(PitchingEvent, f64)] = &[
    (P::WalksIssued, -1.0),
    (P::IntentionalWalks, 0.0),
    (P::EarnedRuns, -1.0),
    (P::HitsAllowed, -1.0),
    (P::HitBatters, -1.0),
    (P::HomeRunsAllowed, 0.0),
    (P::Innings, 3.0),
    (P::Strikeouts, 0.5),
    (P::Wins, 7.0),
    (P::Losses, -5.0),
    (P::Saves, 7.0),
    (P::BlownSaves, 0.0),
    (P::QualityStarts, 3.0),
    (P::TotalBases, 0.0),
    (P::Holds, 0.0),
];

const YAHOO_BATTING: &[(BattingEvent, f64)] = &[
    (B::Singles, 2.6),
    (B::Doubles, 5.2),
    (B::Triples, 7.8),
    (B::HomeRuns, 10.4),
    (B::Walks, 2.6),
    (B::IntentionalWalks, 0.0),
    (B::HitByPitch, 2.6),
    (B::Runs, 1.9),
    (B::Rbis, 1.9),
    (B::StolenBases, 4.2),
    (B::CaughtStealing, 0.0),
    (B::Strikeouts, 0.0),
];

const YAHOO_PITCHING: &[(PitchingEvent, f64)] = &[
    (P::WalksIssued, -1.3),
    (P::IntentionalWalks, 0.0),
    (P::EarnedRuns, -3.0),
    (P::HitsAllowed, -1.3),
    (P::HitBatters, -1.3),
    (P::HomeRunsAllowed, 0.0),
    (P::Innings, 3.0),
    (P::Strikeouts, 3.0),
    (P::Wins, 7.0),
    (P::Losses, 0.0),
    (P::Saves, 8.0),
    (P::BlownSaves, 0.0),
    (P::QualityStarts, 0.0),
    (P::TotalBases, 0.0),
    (P::Holds, 0.0),
];

// ---------------------------------------------------------------------------
// League type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeagueType {
    Default,
    #[serde(alias = "ESPN", alias = "espn")]
    Espn,
    #[serde(alias = "CBS", alias = "cbs")]
    Cbs,
    #[serde(alias = "yahoo")]
    Yahoo,
    #[serde(alias = "custom")]
    Custom,
}

impl LeagueType {
    /// Case-insensitive parse of a league type name.
    pub fn from_str_league(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "DEFAULT" => Some(LeagueType::Default),
            "ESPN" => Some(LeagueType::Espn),
            "CBS" => Some(LeagueType::Cbs),
            "YAHOO" => Some(LeagueType::Yahoo),
            "CUSTOM" => Some(LeagueType::Custom),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            LeagueType::Default => "Default",
            LeagueType::Espn => "ESPN",
            LeagueType::Cbs => "CBS",
            LeagueType::Yahoo => "Yahoo",
            LeagueType::Custom => "Custom",
        }
    }
}

impl fmt::Display for LeagueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Scoring settings
// ---------------------------------------------------------------------------

/// A custom scoring table as written in config or JSON:
/// `{ name, batting: { code: weight }, pitching: { code: weight } }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringTable {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub batting: BTreeMap<String, f64>,
    #[serde(default)]
    pub pitching: BTreeMap<String, f64>,
}

impl ScoringTable {
    pub fn from_json(text: &str) -> Result<Self, ScoringError> {
        serde_json::from_str(text).map_err(|e| ScoringError::Parse(e.to_string()))
    }
}

/// A named, immutable pair of batting and pitching weight tables.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringSettings {
    pub name: String,
    pub batting: WeightTable<BattingEvent>,
    pub pitching: WeightTable<PitchingEvent>,
}

impl ScoringSettings {
    /// Built-in preset for a league type. `Custom` has no preset of its own
    /// and yields the default table.
    pub fn preset(league_type: LeagueType) -> Self {
        let (batting, pitching) = match league_type {
            LeagueType::Default | LeagueType::Custom => (DEFAULT_BATTING, DEFAULT_PITCHING),
            LeagueType::Espn => (ESPN_BATTING, ESPN_PITCHING),
            LeagueType::Cbs => (ESPN_BATTING, CBS_PITCHING),
            LeagueType::Yahoo => (YAHOO_BATTING, YAHOO_PITCHING),
        };
        let name = match league_type {
            LeagueType::Custom => LeagueType::Default.display_str(),
            other => other.display_str(),
        };
        Self {
            name: name.to_string(),
            batting: WeightTable::from_pairs(batting),
            pitching: WeightTable::from_pairs(pitching),
        }
    }

    /// Build settings from a custom table. Unknown codes are ignored;
    /// non-finite weights are an error.
    pub fn from_table(table: &ScoringTable) -> Result<Self, ScoringError> {
        Ok(Self {
            name: table.name.clone().unwrap_or_else(|| "Custom".to_string()),
            batting: WeightTable::from_codes(&table.batting)?,
            pitching: WeightTable::from_codes(&table.pitching)?,
        })
    }

    /// Resolve the settings used for a calculation. A Custom league without a
    /// table falls back to the default preset.
    pub fn for_league(
        league_type: LeagueType,
        custom: Option<&ScoringTable>,
    ) -> Result<Self, ScoringError> {
        match (league_type, custom) {
            (LeagueType::Custom, Some(table)) => Self::from_table(table),
            (LeagueType::Custom, None) => {
                warn!("custom league type without a scoring table; using default weights");
                Ok(Self::preset(LeagueType::Default))
            }
            (other, _) => Ok(Self::preset(other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Stat lines scored by the tables
// ---------------------------------------------------------------------------

/// A pitcher's actual or projected outing (or season) line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PitchingLine {
    pub innings: f64,
    pub earned_runs: f64,
    pub walks: f64,
    pub intentional_walks: f64,
    pub hits: f64,
    pub home_runs: f64,
    pub hit_batters: f64,
    pub strikeouts: f64,
    pub saves: f64,
    pub blown_saves: f64,
    pub holds: f64,
    pub wins: f64,
    pub losses: f64,
    pub quality_starts: f64,
}

/// A batter's projected counting line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattingLine {
    pub singles: f64,
    pub doubles: f64,
    pub triples: f64,
    pub home_runs: f64,
    pub walks: f64,
    pub intentional_walks: f64,
    pub hit_by_pitch: f64,
    pub runs: f64,
    pub rbis: f64,
    pub stolen_bases: f64,
    pub caught_stealing: f64,
    pub strikeouts: f64,
    pub total_bases: f64,
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Pitcher points for an expected outing against an opposing lineup.
///
/// The lineup's batting events are charged to the pitcher: hits as HA, home
/// runs as HRA, walks as BB, runs as ER, and so on. Rounded to two decimals.
pub fn score(expected: &ExpectedGame, settings: &ScoringSettings) -> f64 {
    let p = &settings.pitching;
    let total = expected.expected_hits * p.weight(P::HitsAllowed)
        + expected.expected_home_runs * p.weight(P::HomeRunsAllowed)
        + expected.expected_walks * p.weight(P::WalksIssued)
        + expected.expected_intentional_walks * p.weight(P::IntentionalWalks)
        + expected.expected_hit_by_pitch * p.weight(P::HitBatters)
        + expected.expected_runs * p.weight(P::EarnedRuns)
        + expected.expected_strikeouts * p.weight(P::Strikeouts)
        + expected.expected_total_bases * p.weight(P::TotalBases)
        + expected.expected_innings * p.weight(P::Innings);
    debug!(
        "scored {} {} with {}: {:.4}",
        expected.team, expected.split, settings.name, total
    );
    round2(total)
}

/// Points for a full pitching line, rounded to two decimals.
pub fn score_pitching_line(line: &PitchingLine, settings: &ScoringSettings) -> f64 {
    let p = &settings.pitching;
    let total = line.innings * p.weight(P::Innings)
        + line.earned_runs * p.weight(P::EarnedRuns)
        + line.walks * p.weight(P::WalksIssued)
        + line.intentional_walks * p.weight(P::IntentionalWalks)
        + line.hits * p.weight(P::HitsAllowed)
        + line.home_runs * p.weight(P::HomeRunsAllowed)
        + line.hit_batters * p.weight(P::HitBatters)
        + line.strikeouts * p.weight(P::Strikeouts)
        + line.saves * p.weight(P::Saves)
        + line.blown_saves * p.weight(P::BlownSaves)
        + line.holds * p.weight(P::Holds)
        + line.wins * p.weight(P::Wins)
        + line.losses * p.weight(P::Losses)
        + line.quality_starts * p.weight(P::QualityStarts);
    round2(total)
}

/// Points for a batting line, rounded to two decimals.
pub fn score_batting_line(line: &BattingLine, settings: &ScoringSettings) -> f64 {
    let b = &settings.batting;
    let total = line.singles * b.weight(B::Singles)
        + line.doubles * b.weight(B::Doubles)
        + line.triples * b.weight(B::Triples)
        + line.home_runs * b.weight(B::HomeRuns)
        + line.walks * b.weight(B::Walks)
        + line.intentional_walks * b.weight(B::IntentionalWalks)
        + line.hit_by_pitch * b.weight(B::HitByPitch)
        + line.runs * b.weight(B::Runs)
        + line.rbis * b.weight(B::Rbis)
        + line.stolen_bases * b.weight(B::StolenBases)
        + line.caught_stealing * b.weight(B::CaughtStealing)
        + line.strikeouts * b.weight(B::Strikeouts)
        + line.total_bases * b.weight(B::TotalBases);
    round2(total)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
