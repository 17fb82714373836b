// Configuration loading and parsing (league.toml, projection.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::ingest::IngestOptions;
use crate::projection::leaderboard::LeaderboardKind;
use crate::scoring::{LeagueType, ScoringError, ScoringSettings, ScoringTable};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub projection: ProjectionConfig,
    pub teams: Vec<String>,
    pub db_path: String,
    pub data_paths: DataPaths,
}

#[derive(Debug, Clone)]
pub struct LeagueConfig {
    pub name: String,
    pub league_type: LeagueType,
    pub season: i32,
    pub custom_scoring: Option<ScoringTable>,
}

#[derive(Debug, Clone)]
pub struct ProjectionConfig {
    pub expected_innings: f64,
    pub leaderboard: LeaderboardKind,
    pub top_n: usize,
    pub estimate_missing_hit_types: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub team_stats: String,
}

impl Config {
    /// Scoring settings for the configured league type.
    pub fn scoring_settings(&self) -> Result<ScoringSettings, ScoringError> {
        ScoringSettings::for_league(self.league.league_type, self.league.custom_scoring.as_ref())
    }

    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            estimate_missing_hit_types: self.projection.estimate_missing_hit_types,
            ..IngestOptions::default()
        }
    }

    /// The database file. An empty `[database] path` resolves to the
    /// platform data directory.
    pub fn resolved_db_path(&self) -> PathBuf {
        if !self.db_path.trim().is_empty() {
            return PathBuf::from(&self.db_path);
        }
        directories::ProjectDirs::from("", "", "matchup-scout")
            .map(|dirs| dirs.data_dir().join("matchup-scout.db"))
            .unwrap_or_else(|| PathBuf::from("matchup-scout.db"))
    }
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[league]` table in league.toml.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueSection,
}

#[derive(Debug, Clone, Deserialize)]
struct LeagueSection {
    name: String,
    league_type: String,
    /// Defaults to the current calendar year.
    #[serde(default)]
    season: Option<i32>,
    #[serde(default)]
    custom_scoring: Option<ScoringTable>,
}

// ---------------------------------------------------------------------------
// projection.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct ProjectionFile {
    starter: StarterSection,
    leaderboard: LeaderboardSection,
    #[serde(default)]
    ingest: IngestSection,
    database: DatabaseSection,
    data_paths: DataPaths,
    teams: TeamsSection,
}

#[derive(Debug, Clone, Deserialize)]
struct StarterSection {
    expected_innings: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct LeaderboardSection {
    split: String,
    top_n: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct IngestSection {
    #[serde(default)]
    estimate_missing_hit_types: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    #[serde(default)]
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
struct TeamsSection {
    abbreviations: Vec<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml` and
/// `config/projection.toml` relative to `base_dir`.
///
/// Does not copy defaults; `load_config()` does.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- league.toml ---
    let league_path = config_dir.join("league.toml");
    let league_text = read_file(&league_path)?;
    let league_file: LeagueFile =
        toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
            path: league_path.clone(),
            source: e,
        })?;
    let section = league_file.league;

    let league_type = LeagueType::from_str_league(&section.league_type).ok_or_else(|| {
        ConfigError::ValidationError {
            field: "league.league_type".into(),
            message: format!(
                "unknown league type `{}` (expected Default, ESPN, CBS, Yahoo or Custom)",
                section.league_type
            ),
        }
    })?;
    let season = section.season.unwrap_or_else(current_season);

    // --- projection.toml ---
    let projection_path = config_dir.join("projection.toml");
    let projection_text = read_file(&projection_path)?;
    let projection_file: ProjectionFile =
        toml::from_str(&projection_text).map_err(|e| ConfigError::ParseError {
            path: projection_path.clone(),
            source: e,
        })?;

    let leaderboard = LeaderboardKind::from_str_kind(&projection_file.leaderboard.split)
        .ok_or_else(|| ConfigError::ValidationError {
            field: "leaderboard.split".into(),
            message: format!("unknown split `{}`", projection_file.leaderboard.split),
        })?;

    let config = Config {
        league: LeagueConfig {
            name: section.name,
            league_type,
            season,
            custom_scoring: section.custom_scoring,
        },
        projection: ProjectionConfig {
            expected_innings: projection_file.starter.expected_innings,
            leaderboard,
            top_n: projection_file.leaderboard.top_n,
            estimate_missing_hit_types: projection_file.ingest.estimate_missing_hit_types,
        },
        teams: projection_file
            .teams
            .abbreviations
            .iter()
            .map(|t| t.trim().to_uppercase())
            .collect(),
        db_path: projection_file.database.path,
        data_paths: projection_file.data_paths,
    };

    validate(&config)?;

    Ok(config)
}

/// Files read by `load_config_from`, bootstrapped from `defaults/`.
const CONFIG_FILES: [&str; 2] = ["league.toml", "projection.toml"];

/// Copy each missing league or projection file from `defaults/` into
/// `config/`. An existing config file is never overwritten. Returns the
/// files written.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    match (defaults_dir.is_dir(), config_dir.is_dir()) {
        (false, false) => {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "no defaults/ or config/ directory under {}",
                    base_dir.display()
                ),
            })
        }
        (false, true) => return Ok(Vec::new()),
        _ => {}
    }

    let bootstrap_error = |action: &str, path: &Path, e: std::io::Error| {
        ConfigError::DefaultsCopyError {
            message: format!("{action} {}: {e}", path.display()),
        }
    };

    std::fs::create_dir_all(&config_dir)
        .map_err(|e| bootstrap_error("cannot create", &config_dir, e))?;

    let mut written = Vec::new();
    for name in CONFIG_FILES {
        let template = defaults_dir.join(name);
        let target = config_dir.join(name);
        if target.exists() || !template.is_file() {
            continue;
        }
        std::fs::copy(&template, &target)
            .map_err(|e| bootstrap_error("cannot copy defaults to", &target, e))?;
        written.push(target);
    }

    Ok(written)
}

/// Loads config relative to the current working directory, copying defaults
/// first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn current_season() -> i32 {
    use chrono::Datelike;
    chrono::Local::now().year()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let innings = config.projection.expected_innings;
    if !innings.is_finite() || innings <= 0.0 || innings > 9.0 {
        return Err(ConfigError::ValidationError {
            field: "starter.expected_innings".into(),
            message: format!("must be in (0, 9], got {innings}"),
        });
    }

    if config.projection.top_n == 0 {
        return Err(ConfigError::ValidationError {
            field: "leaderboard.top_n".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.teams.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "teams.abbreviations".into(),
            message: "must list at least one team".into(),
        });
    }
    if let Some(blank) = config.teams.iter().position(|t| t.is_empty()) {
        return Err(ConfigError::ValidationError {
            field: format!("teams.abbreviations[{blank}]"),
            message: "must not be empty".into(),
        });
    }

    if config.data_paths.team_stats.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "data_paths.team_stats".into(),
            message: "must not be empty".into(),
        });
    }

    match (&config.league.league_type, &config.league.custom_scoring) {
        (LeagueType::Custom, None) => {
            return Err(ConfigError::ValidationError {
                field: "league.custom_scoring".into(),
                message: "required when league_type is Custom".into(),
            });
        }
        (_, Some(table)) => {
            let tables: &[(&str, &std::collections::BTreeMap<String, f64>)] = &[
                ("league.custom_scoring.batting", &table.batting),
                ("league.custom_scoring.pitching", &table.pitching),
            ];
            for (section, weights) in tables {
                for (code, value) in weights.iter() {
                    if !value.is_finite() {
                        return Err(ConfigError::ValidationError {
                            field: format!("{section}.{code}"),
                            message: format!("must be finite, got {value}"),
                        });
                    }
                }
            }
        }
        _ => {}
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    /// Helper: returns the scout-core crate root (works whether `cargo test`
    /// runs from the crate root or the workspace root).
    fn project_root() -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        if cwd.join("defaults").exists() {
            cwd
        } else if cwd.join("crates/scout-core/defaults").exists() {
            cwd.join("crates/scout-core")
        } else {
            panic!("Cannot locate defaults/ directory from CWD {:?}", cwd);
        }
    }

    /// Fresh temp dir with `config/` populated from the shipped defaults.
    fn temp_config_dir(name: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        let config_dir = tmp.join("config");
        fs::create_dir_all(&config_dir).unwrap();
        let root = project_root();
        fs::copy(root.join("defaults/league.toml"), config_dir.join("league.toml")).unwrap();
        fs::copy(
            root.join("defaults/projection.toml"),
            config_dir.join("projection.toml"),
        )
        .unwrap();
        tmp
    }

    fn edit(tmp: &Path, file: &str, from: &str, to: &str) {
        let path = tmp.join("config").join(file);
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains(from), "{file} does not contain {from:?}");
        fs::write(&path, text.replace(from, to)).unwrap();
    }

    fn expect_field(tmp: &Path, expected: &str) {
        match load_config_from(tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, expected),
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn load_valid_config_from_default_files() {
        let tmp = temp_config_dir("scout_config_defaults");
        let config = load_config_from(&tmp).expect("should load valid config");

        assert_eq!(config.league.name, "Matchup Scout League");
        assert_eq!(config.league.league_type, LeagueType::Espn);
        assert_eq!(config.league.season, 2024);
        assert!(config.league.custom_scoring.is_none());

        assert!((config.projection.expected_innings - 6.0).abs() < f64::EPSILON);
        assert_eq!(config.projection.leaderboard, LeaderboardKind::Lefty);
        assert_eq!(config.projection.top_n, 10);
        assert!(!config.projection.estimate_missing_hit_types);

        assert_eq!(config.teams.len(), 30);
        assert_eq!(config.teams[0], "COL");
        assert!(config.teams.contains(&"LAD".to_string()));
        assert_eq!(config.db_path, "matchup-scout.db");
        assert_eq!(config.data_paths.team_stats, "data/team_stats.csv");

        let settings = config.scoring_settings().unwrap();
        assert_eq!(settings.name, "ESPN");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_missing_and_keeps_existing() {
        let tmp = std::env::temp_dir().join("scout_config_bootstrap");
        let _ = fs::remove_dir_all(&tmp);
        let defaults = tmp.join("defaults");
        fs::create_dir_all(&defaults).unwrap();
        let root = project_root();
        fs::copy(root.join("defaults/league.toml"), defaults.join("league.toml")).unwrap();
        fs::copy(root.join("defaults/projection.toml"), defaults.join("projection.toml")).unwrap();
        fs::write(defaults.join("notes.toml"), "# not a config file").unwrap();

        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("config/league.toml"), "# user edited").unwrap();

        let copied = ensure_config_files(&tmp).unwrap();
        assert_eq!(copied, vec![tmp.join("config/projection.toml")]);
        assert_eq!(
            fs::read_to_string(tmp.join("config/league.toml")).unwrap(),
            "# user edited"
        );
        assert!(!tmp.join("config/notes.toml").exists());

        // A second run finds nothing to do.
        assert!(ensure_config_files(&tmp).unwrap().is_empty());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_defaults_and_config_is_an_error() {
        let tmp = std::env::temp_dir().join("scout_config_nothing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        let err = ensure_config_files(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::DefaultsCopyError { .. }));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_projection_toml_is_file_not_found() {
        let tmp = temp_config_dir("scout_config_no_projection");
        fs::remove_file(tmp.join("config/projection.toml")).unwrap();
        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let tmp = temp_config_dir("scout_config_malformed");
        fs::write(tmp.join("config/league.toml"), "[league\nname = ").unwrap();
        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_expected_innings_out_of_range() {
        let tmp = temp_config_dir("scout_config_innings_high");
        edit(&tmp, "projection.toml", "expected_innings = 6.0", "expected_innings = 9.5");
        expect_field(&tmp, "starter.expected_innings");
        let _ = fs::remove_dir_all(&tmp);

        let tmp = temp_config_dir("scout_config_innings_zero");
        edit(&tmp, "projection.toml", "expected_innings = 6.0", "expected_innings = 0.0");
        expect_field(&tmp, "starter.expected_innings");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_top_n_zero() {
        let tmp = temp_config_dir("scout_config_top_n");
        edit(&tmp, "projection.toml", "top_n = 10", "top_n = 0");
        expect_field(&tmp, "leaderboard.top_n");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_unknown_split() {
        let tmp = temp_config_dir("scout_config_split");
        edit(&tmp, "projection.toml", "split = \"lefty\"", "split = \"daytime\"");
        expect_field(&tmp, "leaderboard.split");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_unknown_league_type() {
        let tmp = temp_config_dir("scout_config_league_type");
        edit(&tmp, "league.toml", "league_type = \"ESPN\"", "league_type = \"Fantrax\"");
        expect_field(&tmp, "league.league_type");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn custom_league_requires_table() {
        let tmp = temp_config_dir("scout_config_custom_missing");
        edit(&tmp, "league.toml", "league_type = \"ESPN\"", "league_type = \"Custom\"");
        expect_field(&tmp, "league.custom_scoring");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn custom_league_with_table_loads() {
        let tmp = temp_config_dir("scout_config_custom_table");
        let league = r#"
[league]
name = "Friends"
league_type = "custom"
season = 2023

[league.custom_scoring]
name = "Friends Rules"

[league.custom_scoring.batting]
HR = 5.0

[league.custom_scoring.pitching]
INN = 2.0
K = 1.5
ER = -2.0
"#;
        fs::write(tmp.join("config/league.toml"), league).unwrap();
        let config = load_config_from(&tmp).expect("custom config should load");
        assert_eq!(config.league.league_type, LeagueType::Custom);
        assert_eq!(config.league.season, 2023);

        let settings = config.scoring_settings().unwrap();
        assert_eq!(settings.name, "Friends Rules");
        assert_eq!(
            settings.pitching.weight(crate::scoring::PitchingEvent::Strikeouts),
            1.5
        );
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_non_finite_custom_weight() {
        let tmp = temp_config_dir("scout_config_custom_nan");
        let league = r#"
[league]
name = "Friends"
league_type = "Custom"

[league.custom_scoring.pitching]
K = nan
"#;
        fs::write(tmp.join("config/league.toml"), league).unwrap();
        expect_field(&tmp, "league.custom_scoring.pitching.K");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_empty_team_list() {
        let tmp = temp_config_dir("scout_config_no_teams");
        let path = tmp.join("config/projection.toml");
        let text = fs::read_to_string(&path).unwrap();
        let start = text.find("abbreviations").unwrap();
        let mut trimmed = text[..start].to_string();
        trimmed.push_str("abbreviations = []\n");
        fs::write(&path, trimmed).unwrap();
        expect_field(&tmp, "teams.abbreviations");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn season_defaults_to_current_year() {
        let tmp = temp_config_dir("scout_config_season_default");
        edit(&tmp, "league.toml", "season = 2024\n", "");
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.league.season, current_season());
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn empty_db_path_resolves_to_data_dir() {
        let tmp = temp_config_dir("scout_config_db_path");
        edit(&tmp, "projection.toml", "path = \"matchup-scout.db\"", "path = \"\"");
        let config = load_config_from(&tmp).unwrap();
        let resolved = config.resolved_db_path();
        assert!(resolved.ends_with("matchup-scout.db"));
        let _ = fs::remove_dir_all(&tmp);
    }
}
