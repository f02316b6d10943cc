/// Row/column grid of a spreadsheet export.
///
/// Rows split on CRLF, cells on commas, no quoting. Rows can be ragged;
/// `cell` reads past the end as an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid(Vec<Vec<String>>);

impl Grid {
    pub fn parse(text: &str) -> Self {
        Self(
            text.split("\r\n")
                .map(|line| line.split(',').map(str::to_string).collect())
                .collect(),
        )
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.0
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
