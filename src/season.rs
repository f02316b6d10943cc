use crate::round::{Round, RoundMeta, Team};

/// One pass through a league tier: `rows[finish_position][round_index]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingTable {
    pub metas: Vec<RoundMeta>,
    /// Overall rank of the first row.
    pub start_rank: usize,
    pub rows: Vec<Vec<Team>>,
}

impl RankingTable {
    pub fn lead(&self) -> Option<&RoundMeta> {
        self.metas.first()
    }

    pub fn team_count(&self) -> usize {
        self.rows.len()
    }

    pub fn round_count(&self) -> usize {
        self.metas.len()
    }
}

/// Folds rounds (in discovery order) into per-segment ranking tables.
///
/// A segment closes when the round number drops. Ranks run on across
/// segments of the same sex; a "b" tier shares the rank range of the tier
/// closed just before it.
#[derive(Debug, Clone)]
pub struct SeasonAggregator {
    metas: Vec<RoundMeta>,
    standings: Vec<Vec<Team>>,
    rank: usize,
    prev_sex: Option<String>,
    tables: Vec<RankingTable>,
}

impl Default for SeasonAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl SeasonAggregator {
    pub fn new() -> Self {
        Self {
            metas: Vec::new(),
            standings: Vec::new(),
            rank: 1,
            prev_sex: None,
            tables: Vec::new(),
        }
    }

    pub fn push(&mut self, round: &Round) {
        if let Some(last) = self.metas.last()
            && last.round > round.meta.round
        {
            self.close();
        }
        if self.prev_sex.as_deref() != Some(round.meta.sex.as_str()) {
            self.rank = 1;
            self.prev_sex = Some(round.meta.sex.clone());
        }
        self.metas.push(round.meta.clone());
        self.standings.push(round.standings.clone());
    }

    pub fn finish(mut self) -> Vec<RankingTable> {
        self.close();
        self.tables
    }

    fn close(&mut self) {
        if self.metas.is_empty() {
            return;
        }
        let mut start_rank = self.rank;
        let secondary = self.metas.last().is_some_and(RoundMeta::is_secondary_tier);
        if secondary && let Some(prev) = self.tables.last() {
            start_rank = start_rank.saturating_sub(prev.team_count()).max(1);
        }

        let rows = transpose(&self.standings);
        self.rank += rows.len();
        self.standings.clear();
        self.tables.push(RankingTable {
            metas: std::mem::take(&mut self.metas),
            start_rank,
            rows,
        });
    }
}

pub fn aggregate(rounds: &[Round]) -> Vec<RankingTable> {
    let mut agg = SeasonAggregator::new();
    for round in rounds {
        agg.push(round);
    }
    agg.finish()
}

/// Pivots per-round standings into per-position rows, padding short rounds
/// with `Team::empty()`.
pub fn transpose(standings: &[Vec<Team>]) -> Vec<Vec<Team>> {
    let positions = standings.iter().map(Vec::len).max().unwrap_or(0);
    (0..positions)
        .map(|pos| {
            standings
                .iter()
                .map(|round| round.get(pos).cloned().unwrap_or_else(Team::empty))
                .collect()
        })
        .collect()
}
