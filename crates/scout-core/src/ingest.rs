// Team stat ingestion from CSV.
//
// Rows are read loosely as `RawStatRecord`s, checked with the advisory
// validator, optionally patched with the hit-type fallback, and converted to
// typed `RawStatLine`s keyed by (team, split, season).

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::projection::expected::HitDistribution;
use crate::projection::rates::validate;
use crate::stats::{RawStatLine, RawStatRecord, StatKey};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse CSV {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("ingest validation failed: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Split total hits into hit types when a row has hits but no breakdown.
    pub estimate_missing_hit_types: bool,
    pub hit_distribution: HitDistribution,
}

// ---------------------------------------------------------------------------
// CSV loading
// ---------------------------------------------------------------------------

fn records_from_reader<R: Read>(rdr: R) -> Result<Vec<RawStatRecord>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut records = Vec::new();
    for result in reader.deserialize::<RawStatRecord>() {
        match result {
            Ok(rec) => records.push(rec),
            Err(e) => {
                warn!("skipping malformed stat row: {}", e);
            }
        }
    }
    Ok(records)
}

/// Load raw stat records from a CSV file with snake_case headers.
pub fn load_stat_records(path: &Path) -> Result<Vec<RawStatRecord>, IngestError> {
    let file = std::fs::File::open(path).map_err(|e| IngestError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    records_from_reader(file).map_err(|e| IngestError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// Preparation
// ---------------------------------------------------------------------------

fn missing_hit_types(rec: &RawStatRecord) -> bool {
    rec.singles.is_none() && rec.doubles.is_none() && rec.triples.is_none() && rec.home_runs.is_none()
}

fn estimate_hit_types(rec: &mut RawStatRecord, dist: &HitDistribution) {
    let Some(hits) = rec.hits.filter(|h| *h >= 0) else {
        return;
    };
    let (s, d, t, hr) = dist.split(hits);
    rec.singles = Some(s);
    rec.doubles = Some(d);
    rec.triples = Some(t);
    rec.home_runs = Some(hr);
    if rec.total_bases.is_none() {
        rec.total_bases = Some(s + 2 * d + 3 * t + 4 * hr);
    }
    debug!("{}: estimated hit types from {} hits", rec.team_label(), hits);
}

/// Validate, patch and convert records. Findings are logged, never fatal;
/// rows without identity or with negative counts are dropped. When several
/// rows share an identity the last one wins.
pub fn prepare_stat_lines(
    records: Vec<RawStatRecord>,
    options: &IngestOptions,
) -> Result<Vec<RawStatLine>, IngestError> {
    let total = records.len();
    let mut lines: Vec<RawStatLine> = Vec::with_capacity(total);
    let mut index: HashMap<StatKey, usize> = HashMap::new();
    let mut skipped = 0usize;

    for mut rec in records {
        if options.estimate_missing_hit_types && missing_hit_types(&rec) {
            estimate_hit_types(&mut rec, &options.hit_distribution);
        }

        let report = validate(&rec);
        for finding in &report.errors {
            warn!("{}: {}", rec.team_label(), finding);
        }
        for finding in &report.warnings {
            warn!("{}: {}", rec.team_label(), finding);
        }

        let label = rec.team_label().to_string();
        let line = match RawStatLine::try_from(rec) {
            Ok(line) => line,
            Err(e) => {
                warn!("skipping stat row for '{}': {}", label, e);
                skipped += 1;
                continue;
            }
        };

        match index.get(&line.key()) {
            Some(&pos) => {
                warn!("duplicate stat row for {}, using latest", line.key());
                lines[pos] = line;
            }
            None => {
                index.insert(line.key(), lines.len());
                lines.push(line);
            }
        }
    }

    if lines.is_empty() {
        return Err(IngestError::Validation(format!(
            "no usable stat rows out of {total}"
        )));
    }

    info!(
        "prepared {} stat lines from {} rows ({} skipped)",
        lines.len(),
        total,
        skipped
    );
    Ok(lines)
}

/// `load_stat_records` followed by `prepare_stat_lines`.
pub fn load_stat_lines(path: &Path, options: &IngestOptions) -> Result<Vec<RawStatLine>, IngestError> {
    let records = load_stat_records(path)?;
    prepare_stat_lines(records, options)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::SplitType;

    const HEADER: &str = "team_abbreviation,team_name,split_type,season,games,plate_appearances,at_bats,runs,hits,singles,doubles,triples,home_runs,walks,strikeouts,wins,losses,source";

    fn csv(rows: &[&str]) -> String {
        let mut text = String::from(HEADER);
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text
    }

    #[test]
    fn reads_rows_and_ignores_extra_columns() {
        let text = csv(&[
            "NYY,New York Yankees,lefty,2024,40,1500,1330,200,350,220,70,5,55,150,330,22,18,fangraphs",
            "BOS,Boston Red Sox,vr,2024,120,4600,4100,560,1050,700,230,20,100,400,1050,60,60,fangraphs",
        ]);
        let records = records_from_reader(text.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].team_abbreviation.as_deref(), Some("NYY"));
        assert_eq!(records[1].split_type.as_deref(), Some("vr"));
        assert_eq!(records[1].home_runs, Some(100));
    }

    #[test]
    fn empty_cells_are_missing_values() {
        let text = csv(&["NYY,,lefty,2024,40,1500,,200,350,,,,,150,330,22,18,"]);
        let records = records_from_reader(text.as_bytes()).unwrap();
        assert_eq!(records[0].singles, None);
        assert_eq!(records[0].at_bats, None);
        assert_eq!(records[0].hits, Some(350));
    }

    #[test]
    fn malformed_row_is_skipped() {
        let text = csv(&[
            "NYY,,lefty,2024,forty,1500,1330,200,350,220,70,5,55,150,330,22,18,",
            "BOS,,lefty,2024,40,1500,1330,200,350,220,70,5,55,150,330,22,18,",
        ]);
        let records = records_from_reader(text.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].team_abbreviation.as_deref(), Some("BOS"));
    }

    #[test]
    fn last_row_per_identity_wins() {
        let text = csv(&[
            "NYY,,lefty,2024,40,1500,1330,200,350,220,70,5,55,150,330,22,18,",
            "BOS,,lefty,2024,40,1500,1330,200,350,220,70,5,55,150,330,22,18,",
            "nyy,,vl,2024,41,1540,1370,205,355,225,70,5,55,150,335,22,19,",
        ]);
        let records = records_from_reader(text.as_bytes()).unwrap();
        let lines = prepare_stat_lines(records, &IngestOptions::default()).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].team_abbreviation, "NYY");
        assert_eq!(lines[0].games, 41);
        assert_eq!(lines[1].team_abbreviation, "BOS");
    }

    #[test]
    fn invalid_rows_still_ingest_but_negative_rows_do_not() {
        let text = csv(&[
            // hits identity broken: advisory only
            "NYY,,lefty,2024,40,1500,1330,200,351,220,70,5,55,150,330,22,18,",
            "BOS,,lefty,2024,40,1500,1330,-1,350,220,70,5,55,150,330,22,18,",
        ]);
        let records = records_from_reader(text.as_bytes()).unwrap();
        let lines = prepare_stat_lines(records, &IngestOptions::default()).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].hits, 351);
    }

    #[test]
    fn hit_distribution_fallback_fills_missing_hit_types() {
        let rec = RawStatRecord {
            team_abbreviation: Some("KC".into()),
            split_type: Some("home".into()),
            season: Some(2024),
            games: Some(81),
            plate_appearances: Some(3100),
            hits: Some(800),
            ..RawStatRecord::default()
        };
        let options = IngestOptions {
            estimate_missing_hit_types: true,
            ..IngestOptions::default()
        };
        let lines = prepare_stat_lines(vec![rec.clone()], &options).unwrap();
        let line = &lines[0];
        assert_eq!(line.split_type, SplitType::Home);
        assert_eq!(line.singles + line.doubles + line.triples + line.home_runs, 800);
        assert_eq!(line.doubles, 160);
        assert_eq!(
            line.total_bases,
            line.singles + 2 * line.doubles + 3 * line.triples + 4 * line.home_runs
        );

        let untouched = prepare_stat_lines(vec![rec], &IngestOptions::default()).unwrap();
        assert_eq!(untouched[0].singles, 0);
    }

    #[test]
    fn no_usable_rows_is_an_error() {
        let rec = RawStatRecord {
            season: Some(2024),
            ..RawStatRecord::default()
        };
        let err = prepare_stat_lines(vec![rec], &IngestOptions::default()).unwrap_err();
        assert!(matches!(err, IngestError::Validation(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_stat_records(Path::new("/nonexistent/team_stats.csv")).unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }));
    }
}
