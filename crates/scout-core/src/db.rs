// SQLite persistence for team stat lines, cached rates, and expected-game
// audit records.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::projection::expected::ExpectedGame;
use crate::projection::rates::{compute_rates, RateLine};
use crate::stats::{RawStatLine, SplitType, StatKey};
use crate::store::StatRepository;

/// SQLite-backed store keyed by (team, split, season).
pub struct Database {
    conn: Mutex<Connection>,
}

/// A persisted expected game with its audit metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedGameRecord {
    pub id: i64,
    pub computed_at: DateTime<Utc>,
    pub game: ExpectedGame,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS team_stats (
                team       TEXT NOT NULL,
                split      TEXT NOT NULL,
                season     INTEGER NOT NULL,
                team_name  TEXT NOT NULL DEFAULT '',
                line       TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                PRIMARY KEY (team, split, season)
            );

            CREATE TABLE IF NOT EXISTS team_rates (
                team   TEXT NOT NULL,
                split  TEXT NOT NULL,
                season INTEGER NOT NULL,
                rates  TEXT NOT NULL,
                PRIMARY KEY (team, split, season)
            );

            CREATE TABLE IF NOT EXISTS expected_games (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                team             TEXT NOT NULL,
                split            TEXT NOT NULL,
                season           INTEGER NOT NULL,
                settings_name    TEXT NOT NULL,
                expected_innings REAL NOT NULL,
                fantasy_points   REAL NOT NULL,
                game             TEXT NOT NULL,
                computed_at      TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_expected_games_team ON expected_games(team);
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock).
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    fn write_stat_line(conn: &Connection, line: &RawStatLine) -> Result<()> {
        let json = serde_json::to_string(line).context("failed to serialize stat line")?;
        conn.execute(
            "INSERT OR REPLACE INTO team_stats (team, split, season, team_name, line)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                line.team_abbreviation,
                line.split_type.as_str(),
                line.season,
                line.team_name,
                json,
            ],
        )
        .context("failed to upsert stat line")?;
        conn.execute(
            "DELETE FROM team_rates WHERE team = ?1 AND split = ?2 AND season = ?3",
            params![line.team_abbreviation, line.split_type.as_str(), line.season],
        )
        .context("failed to invalidate cached rates")?;
        Ok(())
    }

    /// Store a stat line, replacing any line with the same key and dropping
    /// its cached rates.
    pub fn upsert_stat_line(&self, line: &RawStatLine) -> Result<()> {
        let conn = self.conn();
        Self::write_stat_line(&conn, line)
    }

    /// Upsert many lines in a single transaction. Returns the number written.
    pub fn import_stat_lines(&self, lines: &[RawStatLine]) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .context("failed to begin import transaction")?;
        for line in lines {
            Self::write_stat_line(&tx, line)?;
        }
        tx.commit().context("failed to commit import")?;
        debug!("imported {} stat lines", lines.len());
        Ok(lines.len())
    }

    pub fn load_stat_line(
        &self,
        team: &str,
        split: SplitType,
        season: i32,
    ) -> Result<Option<RawStatLine>> {
        let conn = self.conn();
        let json: Option<String> = conn
            .query_row(
                "SELECT line FROM team_stats WHERE team = ?1 AND split = ?2 AND season = ?3",
                params![team, split.as_str(), season],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query stat line")?;
        json.map(|j| serde_json::from_str(&j).context("failed to deserialize stat line"))
            .transpose()
    }

    /// Teams with a stored line for `split` in `season`, alphabetically.
    pub fn teams_with_split(&self, split: SplitType, season: i32) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT team FROM team_stats WHERE split = ?1 AND season = ?2 ORDER BY team")
            .context("failed to prepare teams_with_split query")?;
        let teams = stmt
            .query_map(params![split.as_str(), season], |row| row.get(0))
            .context("failed to query teams")?
            .collect::<std::result::Result<Vec<String>, _>>()
            .context("failed to map team rows")?;
        Ok(teams)
    }

    pub fn stat_line_count(&self) -> Result<usize> {
        let conn = self.conn();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM team_stats", [], |row| row.get(0))
            .context("failed to count stat lines")?;
        Ok(count as usize)
    }

    pub fn cache_rates(&self, rates: &RateLine) -> Result<()> {
        let conn = self.conn();
        let json = serde_json::to_string(rates).context("failed to serialize rates")?;
        conn.execute(
            "INSERT OR REPLACE INTO team_rates (team, split, season, rates) VALUES (?1, ?2, ?3, ?4)",
            params![rates.team, rates.split.as_str(), rates.season, json],
        )
        .context("failed to cache rates")?;
        Ok(())
    }

    pub fn load_cached_rates(
        &self,
        team: &str,
        split: SplitType,
        season: i32,
    ) -> Result<Option<RateLine>> {
        let conn = self.conn();
        let json: Option<String> = conn
            .query_row(
                "SELECT rates FROM team_rates WHERE team = ?1 AND split = ?2 AND season = ?3",
                params![team, split.as_str(), season],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query cached rates")?;
        json.map(|j| serde_json::from_str(&j).context("failed to deserialize cached rates"))
            .transpose()
    }

    /// Cached rates for a key, computing and caching them on a miss.
    /// Returns `None` when no stat line is stored.
    pub fn rates_for(&self, team: &str, split: SplitType, season: i32) -> Result<Option<RateLine>> {
        if let Some(rates) = self.load_cached_rates(team, split, season)? {
            return Ok(Some(rates));
        }
        let Some(line) = self.load_stat_line(team, split, season)? else {
            return Ok(None);
        };
        let rates = compute_rates(&line);
        self.cache_rates(&rates)?;
        Ok(Some(rates))
    }

    /// Append an expected game to the audit table. Returns its row id.
    pub fn record_expected_game(&self, game: &ExpectedGame) -> Result<i64> {
        let conn = self.conn();
        let json = serde_json::to_string(game).context("failed to serialize expected game")?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO expected_games
                (team, split, season, settings_name, expected_innings, fantasy_points, game, computed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                game.team,
                game.split.as_str(),
                game.season,
                game.settings_name,
                game.expected_innings,
                game.fantasy_points,
                json,
                now,
            ],
        )
        .context("failed to record expected game")?;
        Ok(conn.last_insert_rowid())
    }

    /// Expected games recorded for `team`, oldest first.
    pub fn load_expected_games(&self, team: &str) -> Result<Vec<ExpectedGameRecord>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT id, computed_at, game FROM expected_games WHERE team = ?1 ORDER BY id",
            )
            .context("failed to prepare load_expected_games query")?;
        let rows = stmt
            .query_map(params![team], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .context("failed to query expected games")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map expected game rows")?;

        rows.into_iter()
            .map(|(id, ts, json)| {
                let computed_at = DateTime::parse_from_rfc3339(&ts)
                    .with_context(|| format!("bad computed_at timestamp `{ts}`"))?
                    .with_timezone(&Utc);
                let game = serde_json::from_str(&json)
                    .context("failed to deserialize expected game")?;
                Ok(ExpectedGameRecord {
                    id,
                    computed_at,
                    game,
                })
            })
            .collect()
    }
}

impl StatRepository for Database {
    fn stat_line(&self, key: &StatKey) -> Result<Option<RawStatLine>> {
        self.load_stat_line(&key.team, key.split, key.season)
    }

    fn rates(&self, key: &StatKey) -> Result<Option<RateLine>> {
        self.rates_for(&key.team, key.split, key.season)
    }
}
