use std::env;
use std::path::PathBuf;

use crate::store::default_store_path;

const DEFAULT_LINKS_FILE: &str = "links.txt";
const DEFAULT_SNAPSHOT: &str = "data.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub links_file: PathBuf,
    pub snapshot: String,
    pub store_path: Option<PathBuf>,
    pub fetch_parallelism: usize,
    pub store_max_age_hours: u64,
    pub xlsx: Option<PathBuf>,
    pub refresh: bool,
    pub verbose: bool,
}

impl AppConfig {
    /// Reads `VOLLEY_*`, `FETCH_PARALLELISM` and `STORE_MAX_AGE_HOURS`.
    pub fn from_env() -> Self {
        Self {
            links_file: env_non_empty("VOLLEY_LINKS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LINKS_FILE)),
            snapshot: env_non_empty("VOLLEY_SNAPSHOT_URL")
                .unwrap_or_else(|| DEFAULT_SNAPSHOT.to_string()),
            store_path: env_non_empty("VOLLEY_STORE_PATH")
                .map(PathBuf::from)
                .or_else(default_store_path),
            fetch_parallelism: env::var("FETCH_PARALLELISM")
                .ok()
                .and_then(|val| val.parse::<usize>().ok())
                .unwrap_or(6)
                .clamp(2, 32),
            store_max_age_hours: env::var("STORE_MAX_AGE_HOURS")
                .ok()
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(24),
            xlsx: None,
            refresh: false,
            verbose: false,
        }
    }

    /// Applies `--flag value` / `--flag=value` overrides.
    pub fn apply_args(&mut self, args: &[String]) {
        if let Some(path) = arg_value(args, "--links") {
            self.links_file = PathBuf::from(path);
        }
        if let Some(path) = arg_value(args, "--store") {
            self.store_path = Some(PathBuf::from(path));
        }
        if let Some(location) = arg_value(args, "--snapshot") {
            self.snapshot = location;
        }
        if let Some(path) = arg_value(args, "--xlsx") {
            self.xlsx = Some(PathBuf::from(path));
        }
        self.refresh |= args.iter().any(|a| a == "--refresh");
        self.verbose |= args.iter().any(|a| a == "--verbose" || a == "-v");
    }

    pub fn store_max_age_ms(&self) -> i64 {
        i64::try_from(self.store_max_age_hours.saturating_mul(3_600_000)).unwrap_or(i64::MAX)
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}
