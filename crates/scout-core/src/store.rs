// Read access to stored stat lines, and an in-memory implementation.

use std::collections::BTreeMap;

use crate::projection::rates::{compute_rates, RateLine};
use crate::stats::{RawStatLine, SplitType, StatKey};

/// Key-value source of raw stat lines keyed by (team, split, season).
pub trait StatRepository {
    fn stat_line(&self, key: &StatKey) -> anyhow::Result<Option<RawStatLine>>;

    /// Rates for a stored line. Implementations may serve these from a cache.
    fn rates(&self, key: &StatKey) -> anyhow::Result<Option<RateLine>> {
        Ok(self.stat_line(key)?.map(|line| compute_rates(&line)))
    }
}

/// Map-backed repository. Inserting a line for an existing key replaces it.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    lines: BTreeMap<StatKey, RawStatLine>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lines(lines: impl IntoIterator<Item = RawStatLine>) -> Self {
        let mut store = Self::new();
        for line in lines {
            store.insert(line);
        }
        store
    }

    /// Store `line`, returning the line it superseded, if any.
    pub fn insert(&mut self, line: RawStatLine) -> Option<RawStatLine> {
        self.lines.insert(line.key(), line)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn teams_with_split(&self, split: SplitType, season: i32) -> Vec<String> {
        self.lines
            .keys()
            .filter(|k| k.split == split && k.season == season)
            .map(|k| k.team.clone())
            .collect()
    }
}

impl StatRepository for InMemoryStore {
    fn stat_line(&self, key: &StatKey) -> anyhow::Result<Option<RawStatLine>> {
        Ok(self.lines.get(key).cloned())
    }
}
