use std::fs;

use volley_rank::export::{export_rankings, render_table, table_rows};
use volley_rank::round::{Game, Round, RoundMeta, Team};
use volley_rank::season::aggregate;

fn team(name: &str, id: u32, ranked: bool) -> Team {
    Team {
        name: name.to_string(),
        id: Some(id),
        ranked,
    }
}

fn rounds() -> Vec<Round> {
    let meta1 = RoundMeta::parse("M_liga_1_krog_1").expect("valid round name");
    let meta2 = RoundMeta::parse("M_liga_1_krog_2").expect("valid round name");
    let game = Game {
        meta: meta1.clone(),
        team1: team("Novak/Kos", 1, false),
        team2: team("Zupan/Horvat", 2, false),
        winner: team("Novak/Kos", 1, false),
        score: "2:1".to_string(),
    };
    vec![
        Round {
            meta: meta1,
            standings: vec![team("Novak/Kos", 1, true), team("Zupan/Horvat", 2, true)],
            games: vec![game],
        },
        Round {
            meta: meta2,
            standings: vec![team("Zupan/Horvat", 2, false)],
            games: Vec::new(),
        },
    ]
}

#[test]
fn table_rows_number_positions_from_start_rank() {
    let tables = aggregate(&rounds());
    let rows = table_rows(&tables[0]);
    assert_eq!(rows[0], vec!["Rank", "Round 1", "Round 2"]);
    assert_eq!(rows[1], vec!["1", "Novak/Kos", "(Zupan/Horvat)"]);
    assert_eq!(rows[2], vec!["2", "Zupan/Horvat", ""]);
}

#[test]
fn rendered_table_has_title_and_rows() {
    let tables = aggregate(&rounds());
    let text = render_table(&tables[0]);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "M league 1 (rounds 1-2, from rank 1)");
    assert_eq!(lines.len(), 4);
    assert!(lines[3].starts_with("2    | Zupan/Horvat"));
}

#[test]
fn workbook_is_written() {
    let dir = std::env::temp_dir().join(format!("volley_rank_export_{}", std::process::id()));
    fs::create_dir_all(&dir).expect("temp dir should be creatable");
    let path = dir.join("rankings.xlsx");
    let rounds = rounds();
    let tables = aggregate(&rounds);
    let report = export_rankings(&path, &tables, &rounds).expect("export should work");
    assert_eq!(report.tables, 1);
    assert_eq!(report.ranking_rows, 2);
    assert_eq!(report.games, 1);
    assert!(fs::metadata(&path).map(|m| m.len() > 0).unwrap_or(false));
}
