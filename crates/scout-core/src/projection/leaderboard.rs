// Team leaderboards: project and score every configured team for a split,
// then rank by fantasy points.

use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

use super::expected::{project_generic, project_scored, ExpectedGame, GameOutcome};
use super::rates::per_game_line;
use super::ProjectionError;
use crate::scoring::{LeagueType, ScoringSettings, ScoringTable};
use crate::stats::{SplitType, StatKey};
use crate::store::StatRepository;

/// Ranked `(points, team)` pairs, highest first.
pub type Leaderboard = Vec<(f64, String)>;

// ---------------------------------------------------------------------------
// Leaderboard kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LeaderboardKind {
    Lefty,
    Righty,
    Home,
    Away,
    Overall,
    /// Whole-game formula over each team's overall per-game line.
    NoSplit,
}

impl LeaderboardKind {
    pub const ALL: [LeaderboardKind; 6] = [
        LeaderboardKind::Lefty,
        LeaderboardKind::Righty,
        LeaderboardKind::Home,
        LeaderboardKind::Away,
        LeaderboardKind::Overall,
        LeaderboardKind::NoSplit,
    ];

    pub fn from_str_kind(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "nosplit" | "no-split" | "no_split" | "generic" => Some(LeaderboardKind::NoSplit),
            other => SplitType::from_str_split(other).map(LeaderboardKind::from),
        }
    }

    /// Boards to show for a requested name: `all` selects every board and no
    /// name selects `configured`. `None` when the name is unknown.
    pub fn select(requested: Option<&str>, configured: LeaderboardKind) -> Option<Vec<Self>> {
        match requested {
            None => Some(vec![configured]),
            Some(name) if name.trim().eq_ignore_ascii_case("all") => Some(Self::ALL.to_vec()),
            Some(name) => Self::from_str_kind(name).map(|kind| vec![kind]),
        }
    }

    /// The stored split the board reads from.
    pub fn split(&self) -> SplitType {
        match self {
            LeaderboardKind::Lefty => SplitType::Lefty,
            LeaderboardKind::Righty => SplitType::Righty,
            LeaderboardKind::Home => SplitType::Home,
            LeaderboardKind::Away => SplitType::Away,
            LeaderboardKind::Overall | LeaderboardKind::NoSplit => SplitType::Overall,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            LeaderboardKind::NoSplit => "no-split",
            other => other.split().as_str(),
        }
    }
}

impl From<SplitType> for LeaderboardKind {
    fn from(split: SplitType) -> Self {
        match split {
            SplitType::Lefty => LeaderboardKind::Lefty,
            SplitType::Righty => LeaderboardKind::Righty,
            SplitType::Home => LeaderboardKind::Home,
            SplitType::Away => LeaderboardKind::Away,
            SplitType::Overall => LeaderboardKind::Overall,
        }
    }
}

impl fmt::Display for LeaderboardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Ranking result
// ---------------------------------------------------------------------------

/// Every projected team for one split, sorted by points descending.
#[derive(Debug, Clone, Serialize)]
pub struct TeamRanking {
    pub split: SplitType,
    pub season: i32,
    pub settings_name: String,
    pub expected_innings: f64,
    pub entries: Vec<ExpectedGame>,
    /// Configured teams with no stored line for the split.
    pub skipped: Vec<String>,
}

impl TeamRanking {
    pub fn leaderboard(&self) -> Leaderboard {
        self.entries
            .iter()
            .map(|g| (g.fantasy_points, g.team.clone()))
            .collect()
    }

    pub fn top(&self, n: usize) -> &[ExpectedGame] {
        &self.entries[..n.min(self.entries.len())]
    }
}

/// Whole-game board for every team with an overall line.
#[derive(Debug, Clone, Serialize)]
pub struct NoSplitRanking {
    pub season: i32,
    pub settings_name: String,
    pub expected_innings: f64,
    pub entries: Leaderboard,
    /// Configured teams with no stored overall line.
    pub skipped: Vec<String>,
}

fn sort_desc<T>(items: &mut [T], points: impl Fn(&T) -> f64) {
    // sort_by is stable: equal points keep configured team order.
    items.sort_by(|a, b| {
        points(b)
            .partial_cmp(&points(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

fn log_summary(label: &str, points: &[f64]) {
    if points.is_empty() {
        info!("{label}: no teams projected");
        return;
    }
    let highest = points.iter().copied().fold(f64::MIN, f64::max);
    let lowest = points.iter().copied().fold(f64::MAX, f64::min);
    let average = points.iter().sum::<f64>() / points.len() as f64;
    info!(
        "{label}: {} teams, highest {:.2}, lowest {:.2}, average {:.2}",
        points.len(),
        highest,
        lowest,
        average
    );
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Runs rates -> projection -> scoring across a fixed team list.
pub struct Aggregator<'a, R: StatRepository + ?Sized> {
    repo: &'a R,
    teams: Vec<String>,
    season: i32,
}

impl<'a, R: StatRepository + ?Sized> Aggregator<'a, R> {
    pub fn new(repo: &'a R, teams: &[String], season: i32) -> Self {
        Self {
            repo,
            teams: teams.to_vec(),
            season,
        }
    }

    pub fn teams(&self) -> &[String] {
        &self.teams
    }

    pub fn season(&self) -> i32 {
        self.season
    }

    /// Project and score one team. A team with no stored line is an error.
    pub fn project_team(
        &self,
        team: &str,
        split: SplitType,
        expected_innings: f64,
        settings: &ScoringSettings,
    ) -> Result<ExpectedGame, ProjectionError> {
        let key = StatKey::new(team, split, self.season);
        let rates = self
            .repo
            .rates(&key)?
            .ok_or_else(|| ProjectionError::MissingData {
                team: team.to_string(),
                split,
                season: self.season,
            })?;
        let game = project_scored(&rates, expected_innings, settings);
        debug!("{} {}: {:.2} pts", team, split, game.fantasy_points);
        Ok(game)
    }

    /// Rank every team for `split` under the league's scoring settings.
    pub fn compute_all_teams(
        &self,
        split: SplitType,
        expected_innings: f64,
        league_type: LeagueType,
        custom: Option<&ScoringTable>,
    ) -> Result<TeamRanking, ProjectionError> {
        let settings = ScoringSettings::for_league(league_type, custom)?;
        self.rank(split, expected_innings, &settings)
    }

    /// Rank every team for `split` under explicit settings. Teams without a
    /// stored line are skipped and listed in the result.
    pub fn rank(
        &self,
        split: SplitType,
        expected_innings: f64,
        settings: &ScoringSettings,
    ) -> Result<TeamRanking, ProjectionError> {
        let mut entries = Vec::with_capacity(self.teams.len());
        let mut skipped = Vec::new();

        for team in &self.teams {
            match self.project_team(team, split, expected_innings, settings) {
                Ok(game) => entries.push(game),
                Err(ProjectionError::MissingData { .. }) => {
                    warn!("no {} line for {} in {}, skipping", split, team, self.season);
                    skipped.push(team.clone());
                }
                Err(e) => return Err(e),
            }
        }

        sort_desc(&mut entries, |g| g.fantasy_points);
        let points: Vec<f64> = entries.iter().map(|g| g.fantasy_points).collect();
        log_summary(&format!("{} ({})", split, settings.name), &points);

        Ok(TeamRanking {
            split,
            season: self.season,
            settings_name: settings.name.clone(),
            expected_innings,
            entries,
            skipped,
        })
    }

    /// Whole-game board: each team's overall per-game line scored directly.
    ///
    /// The opposing team's losses per game stand in for the pitcher's win
    /// chance, and its wins per game for the pitcher's loss chance. No
    /// quality start is credited.
    pub fn no_split_ranking(
        &self,
        expected_innings: f64,
        settings: &ScoringSettings,
    ) -> Result<NoSplitRanking, ProjectionError> {
        let mut entries = Vec::with_capacity(self.teams.len());
        let mut skipped = Vec::new();
        for team in &self.teams {
            let key = StatKey::new(team.as_str(), SplitType::Overall, self.season);
            let Some(line) = self.repo.stat_line(&key)? else {
                warn!("no overall line for {} in {}, skipping", team, self.season);
                skipped.push(team.clone());
                continue;
            };
            let per_game = per_game_line(&line);
            let outcome = GameOutcome {
                win_avg: per_game.losses,
                loss_avg: per_game.wins,
                quality_start_avg: 0.0,
            };
            let points = project_generic(&per_game, outcome, expected_innings, settings);
            debug!("{} no-split: {:.2} pts", team, points);
            entries.push((points, team.clone()));
        }
        sort_desc(&mut entries, |(p, _)| *p);
        let points: Vec<f64> = entries.iter().map(|(p, _)| *p).collect();
        log_summary(&format!("no-split ({})", settings.name), &points);

        Ok(NoSplitRanking {
            season: self.season,
            settings_name: settings.name.clone(),
            expected_innings,
            entries,
            skipped,
        })
    }

    pub fn no_split_leaderboard(
        &self,
        expected_innings: f64,
        settings: &ScoringSettings,
    ) -> Result<Leaderboard, ProjectionError> {
        Ok(self.no_split_ranking(expected_innings, settings)?.entries)
    }

    pub fn leaderboard(
        &self,
        kind: LeaderboardKind,
        expected_innings: f64,
        settings: &ScoringSettings,
    ) -> Result<Leaderboard, ProjectionError> {
        match kind {
            LeaderboardKind::NoSplit => self.no_split_leaderboard(expected_innings, settings),
            other => Ok(self
                .rank(other.split(), expected_innings, settings)?
                .leaderboard()),
        }
    }

    /// All six named leaderboards, in `LeaderboardKind::ALL` order.
    pub fn all_leaderboards(
        &self,
        expected_innings: f64,
        settings: &ScoringSettings,
    ) -> Result<Vec<(LeaderboardKind, Leaderboard)>, ProjectionError> {
        let mut boards = Vec::with_capacity(LeaderboardKind::ALL.len());
        for kind in LeaderboardKind::ALL {
            boards.push((kind, self.leaderboard(kind, expected_innings, settings)?));
        }
        Ok(boards)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
