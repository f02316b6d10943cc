use std::collections::HashMap;

const FUZZY_THRESHOLD: usize = 3;

/// Comparison key for a raw team name.
///
/// Lowercases, drops spaces and asterisks, then sorts the `/`-separated
/// player names so `"Ana / Bea"` and `"BEA/ana"` collapse to the same key.
pub fn canonical_key(raw: &str) -> String {
    let cleaned: String = raw
        .to_lowercase()
        .chars()
        .filter(|ch| *ch != ' ' && *ch != '*')
        .collect();
    let mut parts: Vec<&str> = cleaned.split('/').collect();
    parts.sort_unstable();
    parts.join("/")
}

pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // table[i][j] = distance between a[i..] and b[j..]
    let cols = b.len() + 1;
    let mut table = vec![0usize; (a.len() + 1) * cols];
    for i in (0..=a.len()).rev() {
        for j in (0..=b.len()).rev() {
            let idx = i * cols + j;
            if i == a.len() || j == b.len() {
                table[idx] = (a.len() - i) + (b.len() - j);
                continue;
            }
            table[idx] = if a[i] == b[j] {
                table[(i + 1) * cols + j + 1]
            } else {
                1 + table[(i + 1) * cols + j]
                    .min(table[i * cols + j + 1])
                    .min(table[(i + 1) * cols + j + 1])
            };
        }
    }
    table[0]
}

/// Session-scoped mapping from canonical team keys to stable ids.
///
/// Classification is order dependent: every call may register a new key,
/// and later fuzzy lookups see it.
#[derive(Debug, Clone)]
pub struct IdentityRegistry {
    // Insertion order drives the fuzzy scan.
    keys: Vec<(String, u32)>,
    index: HashMap<String, u32>,
    next_id: u32,
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            index: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn get_id(&mut self, raw: &str) -> u32 {
        let key = canonical_key(raw);
        if let Some(id) = self.index.get(&key) {
            return *id;
        }

        if let Some((id, dist)) = self.closest(&key) {
            log::debug!("aliasing {raw:?} to team {id} (distance {dist})");
            self.register(key, id);
            return id;
        }

        let id = self.next_id;
        self.next_id += 1;
        self.register(key, id);
        id
    }

    pub fn peek(&self, raw: &str) -> Option<u32> {
        self.index.get(&canonical_key(raw)).copied()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    pub fn reset(&mut self) {
        self.keys.clear();
        self.index.clear();
        self.next_id = 1;
    }

    fn closest(&self, key: &str) -> Option<(u32, usize)> {
        let mut best: Option<(u32, usize)> = None;
        let mut best_dist = FUZZY_THRESHOLD;
        for (known, id) in &self.keys {
            let dist = edit_distance(known, key);
            if dist < best_dist {
                best = Some((*id, dist));
                best_dist = dist;
            }
        }
        best
    }

    fn register(&mut self, key: String, id: u32) {
        self.index.insert(key.clone(), id);
        self.keys.push((key, id));
    }
}
