use std::collections::HashSet;

use crate::identity::IdentityRegistry;
use crate::table::Grid;

// Known spellings of the final-standings header, with the column offset from
// the header cell to the team names. Earlier entries win.
const STANDINGS_HEADERS: &[(&str, usize)] = &[
    ("KONČNA RAZVRSTITEV", 1),
    // UTF-8 export re-read as Latin-1.
    ("KONÄŒNA RAZVRSTITEV", 1),
    ("KONČNA  RAZVRSTITEV", 1),
    ("KONČNA RAZVRSTITEV:", 1),
    ("KONCNA RAZVRSTITEV", 1),
    ("Končna razvrstitev", 1),
    ("KONČNI VRSTNI RED", 0),
];

const MAX_STANDINGS: usize = 8;
const MIN_NAME_LEN: usize = 3;

// Match grid of the league template.
const GAME_FIRST_ROW: usize = 6;
const GAME_LAST_ROW: usize = 40;
const TEAM1_COL: usize = 1;
const TEAM2_COL: usize = 3;
const SET_COLUMNS: [(usize, usize); 3] = [(4, 5), (6, 7), (8, 9)];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundMeta {
    pub sex: String,
    pub league: String,
    pub round: u32,
    pub source_url: String,
    pub captured: String,
}

impl RoundMeta {
    /// Parses `{sex}_{literal}_{league}_{literal}_{round}`, e.g. `M_liga_1a_krog_3`.
    pub fn parse(name: &str) -> Option<Self> {
        let parts: Vec<&str> = name.trim().split('_').collect();
        if parts.len() < 5 {
            return None;
        }
        let round = parts[4].trim().parse::<u32>().ok()?;
        Some(Self {
            sex: parts[0].to_string(),
            league: parts[2].to_string(),
            round,
            source_url: String::new(),
            captured: String::new(),
        })
    }

    pub fn with_source(mut self, url: &str, captured: &str) -> Self {
        self.source_url = url.to_string();
        self.captured = captured.to_string();
        self
    }

    pub fn is_secondary_tier(&self) -> bool {
        self.league.ends_with('b')
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub name: String,
    pub id: Option<u32>,
    pub ranked: bool,
}

impl Team {
    pub fn empty() -> Self {
        Self {
            name: String::new(),
            id: None,
            ranked: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.name.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub meta: RoundMeta,
    pub team1: Team,
    pub team2: Team,
    pub winner: Team,
    /// Sets won, winner first: `"2:1"`.
    pub score: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    pub meta: RoundMeta,
    pub standings: Vec<Team>,
    pub games: Vec<Game>,
}

pub fn extract_round(grid: &Grid, meta: RoundMeta, registry: &mut IdentityRegistry) -> Round {
    let mut standings = extract_standings(grid, registry);
    if standings.is_empty() {
        standings = extract_roster(grid, registry);
    }
    let games = extract_games(grid, &meta, registry);
    Round {
        meta,
        standings,
        games,
    }
}

/// Locates the standings header; returns the row and the name column.
pub fn find_standings_anchor(grid: &Grid) -> Option<(usize, usize)> {
    for (spelling, offset) in STANDINGS_HEADERS {
        for (row_idx, row) in grid.rows().iter().enumerate() {
            if let Some(col_idx) = row.iter().position(|cell| cell == spelling) {
                return Some((row_idx, col_idx + offset));
            }
        }
    }
    None
}

fn extract_standings(grid: &Grid, registry: &mut IdentityRegistry) -> Vec<Team> {
    let Some((anchor_row, col)) = find_standings_anchor(grid) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for row in anchor_row + 1..=anchor_row + MAX_STANDINGS {
        let name = grid.cell(row, col).trim();
        if name.is_empty() {
            break;
        }
        if name.chars().count() >= MIN_NAME_LEN {
            out.push(Team {
                name: name.to_string(),
                id: Some(registry.get_id(name)),
                ranked: true,
            });
        } else {
            out.push(Team {
                name: name.to_string(),
                id: None,
                ranked: false,
            });
        }
    }
    while out.last().is_some_and(|team| team.id.is_none()) {
        out.pop();
    }
    out
}

fn extract_roster(grid: &Grid, registry: &mut IdentityRegistry) -> Vec<Team> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for row in GAME_FIRST_ROW..=GAME_LAST_ROW {
        for col in [TEAM1_COL, TEAM2_COL] {
            let name = grid.cell(row, col).trim();
            if name.chars().count() < MIN_NAME_LEN {
                continue;
            }
            let id = registry.get_id(name);
            if seen.insert(id) {
                out.push(Team {
                    name: name.to_string(),
                    id: Some(id),
                    ranked: false,
                });
            }
        }
    }
    out
}

fn extract_games(grid: &Grid, meta: &RoundMeta, registry: &mut IdentityRegistry) -> Vec<Game> {
    let mut out = Vec::new();
    for row in GAME_FIRST_ROW..=GAME_LAST_ROW {
        let left = grid.cell(row, TEAM1_COL).trim();
        let right = grid.cell(row, TEAM2_COL).trim();
        if !is_pair_name(left) || !is_pair_name(right) {
            continue;
        }

        let (sets1, sets2) = count_sets(grid, row);
        if sets1 == 0 && sets2 == 0 {
            continue;
        }
        if sets1 == sets2 {
            log::debug!("row {row} of {}: drawn sets {sets1}:{sets2}, skipped", meta.league);
            continue;
        }

        let team1 = Team {
            name: left.to_string(),
            id: Some(registry.get_id(left)),
            ranked: false,
        };
        let team2 = Team {
            name: right.to_string(),
            id: Some(registry.get_id(right)),
            ranked: false,
        };
        let (winner, score) = if sets1 > sets2 {
            (team1.clone(), format!("{sets1}:{sets2}"))
        } else {
            (team2.clone(), format!("{sets2}:{sets1}"))
        };
        out.push(Game {
            meta: meta.clone(),
            team1,
            team2,
            winner,
            score,
        });
    }
    out
}

fn is_pair_name(name: &str) -> bool {
    name.split('/').filter(|part| !part.trim().is_empty()).count() >= 2
}

/// Sets won by each side of a match row. The numerically lower cell takes
/// the set. An empty cell skips that set for its side only, so the other
/// side's cursor stays put.
fn count_sets(grid: &Grid, row: usize) -> (u32, u32) {
    let (mut i, mut j) = (0usize, 0usize);
    let (mut won1, mut won2) = (0u32, 0u32);
    while i < SET_COLUMNS.len() && j < SET_COLUMNS.len() {
        let left = grid.cell(row, SET_COLUMNS[i].0).trim();
        let right = grid.cell(row, SET_COLUMNS[j].1).trim();
        match (left.is_empty(), right.is_empty()) {
            (true, true) => {
                i += 1;
                j += 1;
                continue;
            }
            (true, false) => {
                i += 1;
                continue;
            }
            (false, true) => {
                j += 1;
                continue;
            }
            (false, false) => {}
        }
        if let (Ok(a), Ok(b)) = (left.parse::<i32>(), right.parse::<i32>()) {
            if a < b {
                won1 += 1;
            } else if b < a {
                won2 += 1;
            }
        }
        i += 1;
        j += 1;
    }
    (won1, won2)
}
