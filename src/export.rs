use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::round::{Round, Team};
use crate::season::RankingTable;

pub struct ExportReport {
    pub tables: usize,
    pub ranking_rows: usize,
    pub games: usize,
}

pub fn export_rankings(
    path: &Path,
    tables: &[RankingTable],
    rounds: &[Round],
) -> Result<ExportReport> {
    let mut workbook = Workbook::new();
    let mut ranking_rows = 0usize;

    for (idx, table) in tables.iter().enumerate() {
        let rows = table_rows(table);
        ranking_rows += rows.len().saturating_sub(1);
        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_name(idx, table))?;
        write_rows(sheet, &rows)?;
    }

    let mut games_rows = vec![vec![
        "Sex".to_string(),
        "League".to_string(),
        "Round".to_string(),
        "Team 1".to_string(),
        "Team 2".to_string(),
        "Winner".to_string(),
        "Score".to_string(),
        "Captured".to_string(),
        "Source".to_string(),
    ]];
    for game in rounds.iter().flat_map(|r| r.games.iter()) {
        games_rows.push(vec![
            game.meta.sex.clone(),
            game.meta.league.clone(),
            game.meta.round.to_string(),
            game.team1.name.clone(),
            game.team2.name.clone(),
            game.winner.name.clone(),
            game.score.clone(),
            game.meta.captured.clone(),
            game.meta.source_url.clone(),
        ]);
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Games")?;
        write_rows(sheet, &games_rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        tables: tables.len(),
        ranking_rows,
        games: games_rows.len().saturating_sub(1),
    })
}

pub fn table_rows(table: &RankingTable) -> Vec<Vec<String>> {
    let mut header = vec!["Rank".to_string()];
    header.extend(table.metas.iter().map(|m| format!("Round {}", m.round)));

    let mut out = vec![header];
    for (pos, row) in table.rows.iter().enumerate() {
        let mut line = vec![(table.start_rank + pos).to_string()];
        line.extend(row.iter().map(team_label));
        out.push(line);
    }
    out
}

pub fn render_table(table: &RankingTable) -> String {
    let mut out = String::new();
    if let Some(lead) = table.lead() {
        let first = table.metas.iter().map(|m| m.round).min().unwrap_or(lead.round);
        let last = table.metas.iter().map(|m| m.round).max().unwrap_or(lead.round);
        let _ = writeln!(
            out,
            "{} league {} (rounds {first}-{last}, from rank {})",
            lead.sex, lead.league, table.start_rank
        );
    }
    let rows = table_rows(table);
    let widths: Vec<usize> = (0..rows.first().map(Vec::len).unwrap_or(0))
        .map(|col| {
            rows.iter()
                .map(|r| r.get(col).map(|c| c.chars().count()).unwrap_or(0))
                .max()
                .unwrap_or(0)
        })
        .collect();
    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect();
        let _ = writeln!(out, "{}", cells.join(" | ").trim_end());
    }
    out
}

fn team_label(team: &Team) -> String {
    if team.ranked || team.is_empty() {
        team.name.clone()
    } else {
        format!("({})", team.name)
    }
}

fn sheet_name(idx: usize, table: &RankingTable) -> String {
    let label = table
        .lead()
        .map(|m| format!("{} {}", m.sex, m.league))
        .unwrap_or_default();
    let cleaned: String = label
        .chars()
        .filter(|ch| !matches!(ch, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(24)
        .collect();
    format!("{} {}", idx + 1, cleaned.trim())
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
