use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pipeline::SourceRecord;

const STORE_DIR: &str = "volley_rank";
const STORE_FILE: &str = "snapshot.json";

/// Fetched documents plus the time (unix ms) they were captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub age: i64,
    #[serde(rename = "data")]
    pub records: Vec<SourceRecord>,
}

impl Snapshot {
    pub fn now(records: Vec<SourceRecord>) -> Self {
        Self {
            age: Utc::now().timestamp_millis(),
            records,
        }
    }

    pub fn is_stale(&self, now_ms: i64, max_age_ms: i64) -> bool {
        now_ms.saturating_sub(self.age) > max_age_ms
    }
}

pub trait SnapshotStore {
    /// `Ok(None)` when nothing usable is stored.
    fn load(&self) -> Result<Option<Snapshot>>;
    fn save(&self, snapshot: &Snapshot) -> Result<()>;
}

pub fn open_store(path: &Path) -> Box<dyn SnapshotStore> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("sqlite") | Some("db") => Box::new(SqliteStore::new(path)),
        _ => Box::new(JsonFileStore::new(path)),
    }
}

pub fn default_store_path() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(STORE_DIR).join(STORE_FILE));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".cache")
            .join(STORE_DIR)
            .join(STORE_FILE),
    )
}

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return Ok(None);
        };
        let Ok(value) = serde_json::from_str::<Value>(&raw) else {
            log::warn!("ignoring unreadable snapshot {}", self.path.display());
            return Ok(None);
        };
        if !has_named_first_record(&value) {
            return Ok(None);
        }
        match serde_json::from_value::<Snapshot>(value) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(err) => {
                log::warn!("ignoring snapshot {}: {err}", self.path.display());
                Ok(None)
            }
        }
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).ok();
        }
        let tmp = self.path.with_extension("json.tmp");
        let json = serde_json::to_string(snapshot).context("serialize snapshot")?;
        fs::write(&tmp, json).context("write snapshot")?;
        fs::rename(&tmp, &self.path).context("swap snapshot")?;
        Ok(())
    }
}

// Payloads written by older layouts have no `name` on their records.
fn has_named_first_record(value: &Value) -> bool {
    let Some(first) = value
        .get("data")
        .and_then(|d| d.as_array())
        .and_then(|arr| arr.first())
    else {
        return false;
    };
    first.get("name").is_some_and(Value::is_string)
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    fn open(&self) -> Result<Connection> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(&self.path)
            .with_context(|| format!("open sqlite db {}", self.path.display()))?;
        init_schema(&conn)?;
        Ok(conn)
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS records (
            position INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            data TEXT NOT NULL,
            url TEXT NOT NULL,
            date TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

impl SnapshotStore for SqliteStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let conn = self.open()?;
        let age = conn
            .query_row("SELECT value FROM meta WHERE key = 'age'", [], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .context("query snapshot age")?
            .and_then(|raw| raw.parse::<i64>().ok());
        let Some(age) = age else {
            return Ok(None);
        };

        let mut stmt = conn
            .prepare("SELECT name, data, url, date FROM records ORDER BY position ASC")
            .context("prepare load records query")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(SourceRecord {
                    name: row.get(0)?,
                    data: row.get(1)?,
                    url: row.get(2)?,
                    date: row.get(3)?,
                })
            })
            .context("query load records")?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.context("decode record row")?);
        }
        if records.first().is_none_or(|r| r.name.trim().is_empty()) {
            return Ok(None);
        }
        Ok(Some(Snapshot { age, records }))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let mut conn = self.open()?;
        let tx = conn.transaction().context("begin snapshot transaction")?;
        tx.execute("DELETE FROM records", [])
            .context("clear records")?;
        for (position, record) in snapshot.records.iter().enumerate() {
            tx.execute(
                "INSERT INTO records(position, name, data, url, date) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    position as i64,
                    record.name,
                    record.data,
                    record.url,
                    record.date
                ],
            )
            .context("insert record")?;
        }
        tx.execute(
            "INSERT INTO meta(key, value) VALUES ('age', ?1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![snapshot.age.to_string()],
        )
        .context("update snapshot age")?;
        tx.commit().context("commit snapshot transaction")?;
        Ok(())
    }
}
