// Matchup Scout command-line entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file)
// 2. Load config
// 3. Open database
// 4. Import the configured team stats CSV, if present
// 5. Print leaderboards (the one named on the command line, `all`, or the
//    configured default)

use scout_core::config;
use scout_core::db::Database;
use scout_core::ingest;
use scout_core::projection::leaderboard::{Aggregator, Leaderboard, LeaderboardKind};

use anyhow::{bail, Context};
use std::path::Path;
use tracing::{info, warn};

fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Matchup Scout starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    let settings = config
        .scoring_settings()
        .context("failed to build scoring settings")?;
    info!(
        "Config loaded: league={}, scoring={}, season={}, {} teams",
        config.league.name,
        settings.name,
        config.league.season,
        config.teams.len()
    );

    // 3. Open database
    let db_path = config.resolved_db_path();
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let db = Database::open(&db_path.to_string_lossy()).context("failed to open database")?;
    info!("Database opened at {}", db_path.display());

    // 4. Import team stats
    let stats_path = Path::new(&config.data_paths.team_stats);
    if stats_path.exists() {
        let lines = ingest::load_stat_lines(stats_path, &config.ingest_options())
            .context("failed to ingest team stats")?;
        let written = db.import_stat_lines(&lines).context("failed to store team stats")?;
        info!("Imported {} stat lines from {}", written, stats_path.display());
    } else {
        warn!(
            "team stats file {} not found, using stored lines only",
            stats_path.display()
        );
    }
    if db.stat_line_count()? == 0 {
        bail!(
            "no team stats available; place a CSV at {}",
            stats_path.display()
        );
    }

    // 5. Leaderboards
    let innings = config.projection.expected_innings;
    let aggregator = Aggregator::new(&db, &config.teams, config.league.season);

    let requested = std::env::args().nth(1);
    let Some(kinds) = LeaderboardKind::select(requested.as_deref(), config.projection.leaderboard)
    else {
        bail!(
            "unknown leaderboard `{}` (expected lefty, righty, home, away, overall, no-split or all)",
            requested.unwrap_or_default()
        );
    };

    println!(
        "{} ({} scoring, {} season, {:.1} IP)",
        config.league.name, settings.name, config.league.season, innings
    );
    for kind in kinds {
        let (board, skipped) = match kind {
            LeaderboardKind::NoSplit => {
                let ranking = aggregator.no_split_ranking(innings, &settings)?;
                (ranking.entries, ranking.skipped)
            }
            split_kind => {
                let ranking = aggregator.rank(split_kind.split(), innings, &settings)?;
                for game in ranking.top(config.projection.top_n) {
                    db.record_expected_game(game)?;
                }
                (ranking.leaderboard(), ranking.skipped)
            }
        };
        print_board(kind, &board, &skipped, config.projection.top_n);
    }

    info!("Matchup Scout finished");
    Ok(())
}

fn print_board(kind: LeaderboardKind, board: &Leaderboard, skipped: &[String], top_n: usize) {
    println!();
    println!("== {} ==", kind);
    if board.is_empty() {
        println!("  (no data)");
    }
    for (rank, (points, team)) in board.iter().take(top_n).enumerate() {
        println!("{:>3}. {:<4} {:>7.2}", rank + 1, team, points);
    }
    if !skipped.is_empty() {
        println!("  no data: {}", skipped.join(", "));
    }
}

/// Initialize tracing to log to a file so stdout carries only the boards.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("matchup-scout.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("scout_core=info,scout_cli=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
