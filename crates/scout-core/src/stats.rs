// Team stat lines: split identity, the typed raw line, and the loose
// ingestion record it is converted from.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Split type
// ---------------------------------------------------------------------------

/// The situational subset of a team's games a stat line covers.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SplitType {
    /// Plate appearances against left-handed pitching.
    Lefty,
    /// Plate appearances against right-handed pitching.
    Righty,
    #[default]
    Overall,
    Home,
    Away,
}

impl SplitType {
    pub const ALL: [SplitType; 5] = [
        SplitType::Lefty,
        SplitType::Righty,
        SplitType::Overall,
        SplitType::Home,
        SplitType::Away,
    ];

    /// Parse a split name. Accepts the canonical lowercase names plus the
    /// MLB situation codes (`vl`, `vr`, `h`, `a`) and a few common spellings.
    pub fn from_str_split(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "lefty" | "left" | "vl" | "l" | "lhp" => Some(SplitType::Lefty),
            "righty" | "right" | "vr" | "r" | "rhp" => Some(SplitType::Righty),
            "overall" | "total" | "all" => Some(SplitType::Overall),
            "home" | "h" => Some(SplitType::Home),
            "away" | "road" | "a" => Some(SplitType::Away),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SplitType::Lefty => "lefty",
            SplitType::Righty => "righty",
            SplitType::Overall => "overall",
            SplitType::Home => "home",
            SplitType::Away => "away",
        }
    }
}

impl fmt::Display for SplitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Store key for a stat line: one team, one split, one season.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StatKey {
    pub team: String,
    pub split: SplitType,
    pub season: i32,
}

impl StatKey {
    pub fn new(team: impl Into<String>, split: SplitType, season: i32) -> Self {
        Self {
            team: team.into(),
            split,
            season,
        }
    }
}

impl fmt::Display for StatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.team, self.split, self.season)
    }
}

// ---------------------------------------------------------------------------
// Typed raw stat line
// ---------------------------------------------------------------------------

/// One team's raw counting statistics for one split and season.
///
/// Immutable once stored; a re-ingested line for the same key replaces it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawStatLine {
    pub team_abbreviation: String,
    #[serde(default)]
    pub team_name: String,
    pub split_type: SplitType,
    pub season: i32,
    pub games: u32,
    pub plate_appearances: u32,
    pub at_bats: u32,
    pub runs: u32,
    pub hits: u32,
    pub singles: u32,
    pub doubles: u32,
    pub triples: u32,
    pub home_runs: u32,
    pub rbis: u32,
    pub walks: u32,
    pub intentional_walks: u32,
    pub hit_by_pitch: u32,
    pub strikeouts: u32,
    pub stolen_bases: u32,
    pub caught_stealing: u32,
    pub total_bases: u32,
    pub wins: u32,
    pub losses: u32,
}

impl RawStatLine {
    pub fn key(&self) -> StatKey {
        StatKey::new(self.team_abbreviation.clone(), self.split_type, self.season)
    }
}

// ---------------------------------------------------------------------------
// Loose ingestion record
// ---------------------------------------------------------------------------

/// A stat row as it arrives from a data source, before validation.
///
/// Every field is optional and counts are signed so that missing and negative
/// values survive long enough to be reported. Unknown columns are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawStatRecord {
    #[serde(default, alias = "team", alias = "teamAbbrev")]
    pub team_abbreviation: Option<String>,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default, alias = "split")]
    pub split_type: Option<String>,
    #[serde(default)]
    pub season: Option<i32>,
    #[serde(default)]
    pub games: Option<i64>,
    #[serde(default)]
    pub plate_appearances: Option<i64>,
    #[serde(default)]
    pub at_bats: Option<i64>,
    #[serde(default)]
    pub runs: Option<i64>,
    #[serde(default)]
    pub hits: Option<i64>,
    #[serde(default)]
    pub singles: Option<i64>,
    #[serde(default)]
    pub doubles: Option<i64>,
    #[serde(default)]
    pub triples: Option<i64>,
    #[serde(default)]
    pub home_runs: Option<i64>,
    #[serde(default)]
    pub rbis: Option<i64>,
    #[serde(default)]
    pub walks: Option<i64>,
    #[serde(default)]
    pub intentional_walks: Option<i64>,
    #[serde(default)]
    pub hit_by_pitch: Option<i64>,
    #[serde(default)]
    pub strikeouts: Option<i64>,
    #[serde(default)]
    pub stolen_bases: Option<i64>,
    #[serde(default)]
    pub caught_stealing: Option<i64>,
    #[serde(default)]
    pub total_bases: Option<i64>,
    #[serde(default)]
    pub wins: Option<i64>,
    #[serde(default)]
    pub losses: Option<i64>,
}

impl RawStatRecord {
    /// All counting fields by name, in declaration order.
    pub fn counts(&self) -> [(&'static str, Option<i64>); 19] {
        [
            ("games", self.games),
            ("plate_appearances", self.plate_appearances),
            ("at_bats", self.at_bats),
            ("runs", self.runs),
            ("hits", self.hits),
            ("singles", self.singles),
            ("doubles", self.doubles),
            ("triples", self.triples),
            ("home_runs", self.home_runs),
            ("rbis", self.rbis),
            ("walks", self.walks),
            ("intentional_walks", self.intentional_walks),
            ("hit_by_pitch", self.hit_by_pitch),
            ("strikeouts", self.strikeouts),
            ("stolen_bases", self.stolen_bases),
            ("caught_stealing", self.caught_stealing),
            ("total_bases", self.total_bases),
            ("wins", self.wins),
            ("losses", self.losses),
        ]
    }

    pub fn team_label(&self) -> &str {
        self.team_abbreviation.as_deref().unwrap_or("unknown")
    }
}

impl From<&RawStatLine> for RawStatRecord {
    fn from(line: &RawStatLine) -> Self {
        let n = |v: u32| Some(i64::from(v));
        Self {
            team_abbreviation: Some(line.team_abbreviation.clone()),
            team_name: Some(line.team_name.clone()),
            split_type: Some(line.split_type.as_str().to_string()),
            season: Some(line.season),
            games: n(line.games),
            plate_appearances: n(line.plate_appearances),
            at_bats: n(line.at_bats),
            runs: n(line.runs),
            hits: n(line.hits),
            singles: n(line.singles),
            doubles: n(line.doubles),
            triples: n(line.triples),
            home_runs: n(line.home_runs),
            rbis: n(line.rbis),
            walks: n(line.walks),
            intentional_walks: n(line.intentional_walks),
            hit_by_pitch: n(line.hit_by_pitch),
            strikeouts: n(line.strikeouts),
            stolen_bases: n(line.stolen_bases),
            caught_stealing: n(line.caught_stealing),
            total_bases: n(line.total_bases),
            wins: n(line.wins),
            losses: n(line.losses),
        }
    }
}

// ---------------------------------------------------------------------------
// Record -> line conversion
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum StatLineError {
    #[error("missing identity field `{0}`")]
    MissingIdentity(&'static str),

    #[error("unknown split type `{0}`")]
    UnknownSplit(String),

    #[error("negative value for `{field}`: {value}")]
    Negative { field: &'static str, value: i64 },

    #[error("value for `{field}` out of range: {value}")]
    OutOfRange { field: &'static str, value: i64 },
}

fn count(field: &'static str, value: Option<i64>) -> Result<u32, StatLineError> {
    match value {
        None => Ok(0),
        Some(v) if v < 0 => Err(StatLineError::Negative { field, value: v }),
        Some(v) => u32::try_from(v).map_err(|_| StatLineError::OutOfRange { field, value: v }),
    }
}

impl TryFrom<RawStatRecord> for RawStatLine {
    type Error = StatLineError;

    /// Missing counts become zero; missing identity or negative counts fail.
    fn try_from(rec: RawStatRecord) -> Result<Self, Self::Error> {
        let team = rec
            .team_abbreviation
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(StatLineError::MissingIdentity("team_abbreviation"))?
            .to_uppercase();
        let split_raw = rec
            .split_type
            .as_deref()
            .ok_or(StatLineError::MissingIdentity("split_type"))?;
        let split_type = SplitType::from_str_split(split_raw)
            .ok_or_else(|| StatLineError::UnknownSplit(split_raw.to_string()))?;
        let season = rec.season.ok_or(StatLineError::MissingIdentity("season"))?;

        Ok(RawStatLine {
            team_abbreviation: team,
            team_name: rec.team_name.clone().unwrap_or_default().trim().to_string(),
            split_type,
            season,
            games: count("games", rec.games)?,
            plate_appearances: count("plate_appearances", rec.plate_appearances)?,
            at_bats: count("at_bats", rec.at_bats)?,
            runs: count("runs", rec.runs)?,
            hits: count("hits", rec.hits)?,
            singles: count("singles", rec.singles)?,
            doubles: count("doubles", rec.doubles)?,
            triples: count("triples", rec.triples)?,
            home_runs: count("home_runs", rec.home_runs)?,
            rbis: count("rbis", rec.rbis)?,
            walks: count("walks", rec.walks)?,
            intentional_walks: count("intentional_walks", rec.intentional_walks)?,
            hit_by_pitch: count("hit_by_pitch", rec.hit_by_pitch)?,
            strikeouts: count("strikeouts", rec.strikeouts)?,
            stolen_bases: count("stolen_bases", rec.stolen_bases)?,
            caught_stealing: count("caught_stealing", rec.caught_stealing)?,
            total_bases: count("total_bases", rec.total_bases)?,
            wins: count("wins", rec.wins)?,
            losses: count("losses", rec.losses)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
