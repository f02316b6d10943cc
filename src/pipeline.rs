use serde::{Deserialize, Serialize};

use crate::identity::IdentityRegistry;
use crate::round::{Round, RoundMeta, extract_round};
use crate::season::{RankingTable, aggregate};
use crate::table::Grid;

/// One source document as fetched and persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub name: String,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub date: String,
}

impl SourceRecord {
    pub fn new(name: &str, data: &str, url: &str, date: &str) -> Self {
        Self {
            name: name.to_string(),
            data: data.to_string(),
            url: url.to_string(),
            date: date.to_string(),
        }
    }
}

/// Groups records by sex, league and round number, so round 10 sorts after
/// round 9. Names that do not follow the round pattern go last, by name.
pub fn sort_records(records: &mut [SourceRecord]) {
    records.sort_by_cached_key(|record| record_order(&record.name));
}

fn record_order(name: &str) -> (bool, Vec<String>, u32, String) {
    let parts: Vec<&str> = name.trim().split('_').collect();
    match parts.get(4).and_then(|p| p.trim().parse::<u32>().ok()) {
        Some(round) => (
            false,
            parts[..4].iter().map(|p| p.to_string()).collect(),
            round,
            name.to_string(),
        ),
        None => (true, Vec::new(), 0, name.to_string()),
    }
}

/// An import session. Owns the team identity state for every document it
/// parses; call `reset` (or make a new session) before an unrelated dataset.
#[derive(Debug, Default)]
pub struct Session {
    registry: IdentityRegistry,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    pub fn reset(&mut self) {
        self.registry.reset();
    }

    pub fn extract(&mut self, record: &SourceRecord) -> Option<Round> {
        let Some(meta) = RoundMeta::parse(&record.name) else {
            log::warn!("skipping source with unrecognised name {:?}", record.name);
            return None;
        };
        let meta = meta.with_source(&record.url, &record.date);
        let grid = Grid::parse(&record.data);
        Some(extract_round(&grid, meta, &mut self.registry))
    }

    pub fn build_rounds(&mut self, records: &[SourceRecord]) -> Vec<Round> {
        let rounds: Vec<Round> = records.iter().filter_map(|r| self.extract(r)).collect();
        log::info!(
            "extracted {} rounds, {} games, {} team keys",
            rounds.len(),
            rounds.iter().map(|r| r.games.len()).sum::<usize>(),
            self.registry.len()
        );
        rounds
    }

    pub fn rankings(&mut self, records: &[SourceRecord]) -> Vec<RankingTable> {
        aggregate(&self.build_rounds(records))
    }
}
