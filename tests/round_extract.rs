use std::fs;
use std::path::PathBuf;

use volley_rank::identity::IdentityRegistry;
use volley_rank::round::{RoundMeta, extract_round, find_standings_anchor};
use volley_rank::table::Grid;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

struct Sheet {
    rows: Vec<Vec<String>>,
}

impl Sheet {
    fn new() -> Self {
        Self {
            rows: vec![vec![String::new(); 12]; 42],
        }
    }

    fn set(&mut self, row: usize, col: usize, value: &str) -> &mut Self {
        self.rows[row][col] = value.to_string();
        self
    }

    fn standings(&mut self, header: &str, names: &[&str]) -> &mut Self {
        self.set(1, 10, header);
        for (idx, name) in names.iter().enumerate() {
            self.set(2 + idx, 11, name);
        }
        self
    }

    fn game(&mut self, row: usize, left: &str, right: &str, sets: &[(&str, &str)]) -> &mut Self {
        self.set(row, 1, left).set(row, 3, right);
        for (idx, (a, b)) in sets.iter().enumerate() {
            self.set(row, 4 + idx * 2, a).set(row, 5 + idx * 2, b);
        }
        self
    }

    fn grid(&self) -> Grid {
        let text = self
            .rows
            .iter()
            .map(|r| r.join(","))
            .collect::<Vec<_>>()
            .join("\r\n");
        Grid::parse(&text)
    }
}

fn meta() -> RoundMeta {
    RoundMeta::parse("M_liga_1_krog_1").expect("valid round name")
}

#[test]
fn round_name_tokens() {
    let meta = RoundMeta::parse("Z_liga_2b_krog_11").expect("should parse");
    assert_eq!(meta.sex, "Z");
    assert_eq!(meta.league, "2b");
    assert_eq!(meta.round, 11);
    assert!(meta.is_secondary_tier());
    assert!(RoundMeta::parse("M_liga_1_krog").is_none());
    assert!(RoundMeta::parse("M_liga_1_krog_x").is_none());
}

#[test]
fn fixture_round_extracts_standings_and_games() {
    let grid = Grid::parse(&read_fixture("M_liga_1_krog_1.csv"));
    let mut registry = IdentityRegistry::new();
    let round = extract_round(&grid, meta(), &mut registry);

    let names: Vec<&str> = round.standings.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Novak / Kos", "Zupan/Horvat", "Krajnc / Potočnik", "Kovač/Mlakar"]
    );
    let ids: Vec<Option<u32>> = round.standings.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![Some(1), Some(2), Some(3), Some(4)]);
    assert!(round.standings.iter().all(|t| t.ranked));

    assert_eq!(round.games.len(), 3);
    let first = &round.games[0];
    assert_eq!(first.team1.id, Some(1));
    assert_eq!(first.team2.id, Some(2));
    assert_eq!(first.winner.id, Some(1));
    assert_eq!(first.score, "2:1");

    // Spelling without the caron still resolves to the ranked team.
    let second = &round.games[1];
    assert_eq!(second.team1.id, Some(3));
    assert_eq!(second.winner.id, Some(4));
    assert_eq!(second.score, "2:0");

    let third = &round.games[2];
    assert_eq!(third.winner.id, Some(1));
    assert_eq!(third.score, "1:0");

    assert_eq!(registry.next_id(), 5);
}

#[test]
fn standings_stop_at_eight_rows() {
    let names = [
        "A1/B1", "A2/B2", "A3/B3", "A4/B4", "A5/B5", "A6/B6", "A7/B7", "A8/B8", "A9/B9",
    ];
    let mut sheet = Sheet::new();
    sheet.standings("KONČNA RAZVRSTITEV", &names);
    let mut registry = IdentityRegistry::new();
    let round = extract_round(&sheet.grid(), meta(), &mut registry);
    assert_eq!(round.standings.len(), 8);
    assert_eq!(round.standings[7].name, "A8/B8");
}

#[test]
fn short_names_are_unranked_and_trailing_ones_trimmed() {
    let mut sheet = Sheet::new();
    sheet.standings("KONČNA RAZVRSTITEV", &["Novak/Kos", "x", "Zupan/Horvat", "y", "-"]);
    let mut registry = IdentityRegistry::new();
    let round = extract_round(&sheet.grid(), meta(), &mut registry);

    assert_eq!(round.standings.len(), 3);
    assert_eq!(round.standings[1].name, "x");
    assert_eq!(round.standings[1].id, None);
    assert!(!round.standings[1].ranked);
    assert_eq!(round.standings[2].id, Some(2));
}

#[test]
fn header_variants_are_recognised() {
    let mut sheet = Sheet::new();
    sheet.set(3, 2, "KONÄŒNA RAZVRSTITEV");
    assert_eq!(find_standings_anchor(&sheet.grid()), Some((3, 3)));

    let mut sheet = Sheet::new();
    sheet.set(4, 5, "KONČNI VRSTNI RED");
    assert_eq!(find_standings_anchor(&sheet.grid()), Some((4, 5)));

    // Earlier spellings take priority over later ones.
    sheet.set(9, 0, "KONČNA RAZVRSTITEV");
    assert_eq!(find_standings_anchor(&sheet.grid()), Some((9, 1)));

    assert_eq!(find_standings_anchor(&Sheet::new().grid()), None);
}

#[test]
fn missing_header_falls_back_to_roster() {
    let mut sheet = Sheet::new();
    sheet
        .game(6, "Novak/Kos", "Zupan/Horvat", &[("1", "2")])
        .game(7, "Zupan / Horvat", "Kovač/Mlakar", &[])
        .game(8, "ab", "Kovac/Mlakar", &[]);
    let mut registry = IdentityRegistry::new();
    let round = extract_round(&sheet.grid(), meta(), &mut registry);

    let names: Vec<&str> = round.standings.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Novak/Kos", "Zupan/Horvat", "Kovač/Mlakar"]);
    assert!(round.standings.iter().all(|t| !t.ranked));
    assert_eq!(round.games.len(), 1);
}

#[test]
fn all_short_standings_fall_back_to_roster() {
    let mut sheet = Sheet::new();
    sheet
        .standings("KONČNA RAZVRSTITEV", &["ab", "cd"])
        .game(6, "Novak/Kos", "Zupan/Horvat", &[("2", "1")]);
    let mut registry = IdentityRegistry::new();
    let round = extract_round(&sheet.grid(), meta(), &mut registry);
    assert_eq!(round.standings.len(), 2);
    assert!(round.standings.iter().all(|t| !t.ranked && t.id.is_some()));
}

#[test]
fn only_pair_rows_with_decided_sets_are_games() {
    let mut sheet = Sheet::new();
    sheet
        .standings("KONČNA RAZVRSTITEV", &["Novak/Kos", "Zupan/Horvat"])
        .game(6, "Novak", "Zupan", &[("1", "2"), ("1", "2")])
        .game(7, "Novak/Kos", "Zupan/Horvat", &[])
        .game(8, "Novak/Kos", "Zupan/Horvat", &[("21", "19"), ("15", "21"), ("-", "-")])
        .game(9, "Novak/Kos", "Zupan/Horvat", &[("3", "1"), ("", "2"), ("4", "")]);
    let mut registry = IdentityRegistry::new();
    let round = extract_round(&sheet.grid(), meta(), &mut registry);

    // Row 8 splits the sets and is dropped; row 9 compares 3:1 then 4:2.
    assert_eq!(round.games.len(), 1);
    let game = &round.games[0];
    assert_eq!(game.winner.name, "Zupan/Horvat");
    assert_eq!(game.score, "2:0");
    assert_eq!(game.meta.round, 1);
}

#[test]
fn rows_past_the_template_window_are_ignored() {
    let mut sheet = Sheet::new();
    sheet
        .game(5, "Novak/Kos", "Zupan/Horvat", &[("1", "2")])
        .game(41, "Novak/Kos", "Zupan/Horvat", &[("1", "2")]);
    let mut registry = IdentityRegistry::new();
    let round = extract_round(&sheet.grid(), meta(), &mut registry);
    assert!(round.games.is_empty());
    assert!(round.standings.is_empty());
    assert!(registry.is_empty());
}
