use std::fs;

use anyhow::{Context, Result};
use chrono::DateTime;
use rayon::prelude::*;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::{DATE, HeaderMap, LAST_MODIFIED};
use serde::Deserialize;

use crate::http_client::http_client;
use crate::pipeline::{SourceRecord, sort_records};
use crate::store::Snapshot;

/// Age stamp carried by the consolidated snapshot (2024-02-05).
pub const BUNDLED_SNAPSHOT_AGE: i64 = 1_707_129_537_787;
pub const UNKNOWN_DATE: &str = "?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLink {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Fetched {
        text: String,
        url: String,
        captured: String,
    },
    Failed {
        reason: String,
    },
}

impl FetchOutcome {
    pub fn is_fetched(&self) -> bool {
        matches!(self, FetchOutcome::Fetched { .. })
    }

    /// Persisted form; a failure becomes an empty document.
    pub fn into_record(self, link: &SourceLink) -> SourceRecord {
        match self {
            FetchOutcome::Fetched {
                text,
                url,
                captured,
            } => SourceRecord {
                name: link.name.clone(),
                data: text,
                url,
                date: captured,
            },
            FetchOutcome::Failed { .. } => SourceRecord::new(
                &link.name,
                "",
                &viewer_url(&link.address),
                UNKNOWN_DATE,
            ),
        }
    }
}

/// `name address` per line; blank lines and `#` comments are ignored.
pub fn parse_link_list(text: &str) -> Vec<SourceLink> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let name = parts.next()?;
            let address = parts.next()?;
            Some(SourceLink {
                name: name.to_string(),
                address: address.to_string(),
            })
        })
        .collect()
}

/// Fetches every link on a bounded pool. Output order follows `links`;
/// failures are reported per item and never abort the batch.
pub fn fetch_all(links: &[SourceLink], parallelism: usize) -> Vec<(SourceLink, FetchOutcome)> {
    let client = match http_client() {
        Ok(client) => client,
        Err(err) => {
            log::warn!("no http client: {err:#}");
            return links
                .iter()
                .map(|link| {
                    let reason = format!("{err:#}");
                    (link.clone(), FetchOutcome::Failed { reason })
                })
                .collect();
        }
    };

    let pool = build_fetch_pool(parallelism);
    with_fetch_pool(&pool, || {
        links
            .par_iter()
            .map(|link| {
                let outcome = fetch_one(client, &link.address);
                if let FetchOutcome::Failed { reason } = &outcome {
                    log::warn!("failed to fetch {} using {}: {reason}", link.name, link.address);
                }
                (link.clone(), outcome)
            })
            .collect()
    })
}

pub fn fetch_records(links: &[SourceLink], parallelism: usize) -> Vec<SourceRecord> {
    let results = fetch_all(links, parallelism);
    let ok = results.iter().filter(|(_, o)| o.is_fetched()).count();
    log::info!("fetched {ok}/{} sources", results.len());
    let mut records: Vec<SourceRecord> = results
        .into_iter()
        .map(|(link, outcome)| outcome.into_record(&link))
        .collect();
    sort_records(&mut records);
    records
}

pub fn fetch_one(client: &Client, address: &str) -> FetchOutcome {
    match try_fetch(client, address) {
        Ok(outcome) => outcome,
        Err(err) => FetchOutcome::Failed {
            reason: format!("{err:#}"),
        },
    }
}

fn try_fetch(client: &Client, address: &str) -> Result<FetchOutcome> {
    let resp = client.get(address).send().context("request failed")?;
    let status = resp.status();
    if status.as_u16() >= 400 {
        return Ok(FetchOutcome::Failed {
            reason: format!("http {status}"),
        });
    }
    let captured = capture_date(resp.headers());
    let text = resp.text().context("failed reading body")?;
    Ok(FetchOutcome::Fetched {
        text,
        url: viewer_url(address),
        captured,
    })
}

fn capture_date(headers: &HeaderMap) -> String {
    [LAST_MODIFIED, DATE]
        .iter()
        .filter_map(|name| headers.get(name)?.to_str().ok())
        .find_map(parse_capture_date)
        .unwrap_or_else(|| UNKNOWN_DATE.to_string())
}

pub fn format_capture_date(raw: &str) -> String {
    parse_capture_date(raw).unwrap_or_else(|| UNKNOWN_DATE.to_string())
}

fn parse_capture_date(raw: &str) -> Option<String> {
    DateTime::parse_from_rfc2822(raw.trim())
        .ok()
        .map(|dt| dt.format("%Y-%m-%d").to_string())
}

/// Maps a spreadsheet export link to the page a person would open.
pub fn viewer_url(address: &str) -> String {
    let Ok(url) = Url::parse(address) else {
        return address.to_string();
    };
    if url.host_str() != Some("docs.google.com") {
        return address.to_string();
    }
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.collect())
        .unwrap_or_default();
    let gid = url
        .query_pairs()
        .find(|(key, _)| key == "gid")
        .map(|(_, value)| value.into_owned());

    match segments.as_slice() {
        ["spreadsheets", "d", "e", key, "pub"] => match gid {
            Some(gid) => format!("https://docs.google.com/spreadsheets/d/e/{key}/pubhtml?gid={gid}"),
            None => format!("https://docs.google.com/spreadsheets/d/e/{key}/pubhtml"),
        },
        ["spreadsheets", "d", id, "export"] => match gid {
            Some(gid) => format!("https://docs.google.com/spreadsheets/d/{id}/edit#gid={gid}"),
            None => format!("https://docs.google.com/spreadsheets/d/{id}/edit"),
        },
        _ => address.to_string(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BundledEntry {
    Record(SourceRecord),
    // Older snapshots stored bare `[name, data]` pairs.
    Pair(String, String),
}

pub fn fetch_bundled_snapshot(location: &str) -> Result<Snapshot> {
    let body = if location.starts_with("http://") || location.starts_with("https://") {
        let client = http_client()?;
        client
            .get(location)
            .send()
            .context("snapshot request failed")?
            .error_for_status()
            .context("snapshot request rejected")?
            .text()
            .context("failed reading snapshot body")?
    } else {
        fs::read_to_string(location).with_context(|| format!("read snapshot {location}"))?
    };
    parse_bundled_snapshot(&body)
}

pub fn parse_bundled_snapshot(body: &str) -> Result<Snapshot> {
    let entries: Vec<BundledEntry> =
        serde_json::from_str(body.trim()).context("invalid snapshot json")?;
    let mut records: Vec<SourceRecord> = entries
        .into_iter()
        .map(|entry| match entry {
            BundledEntry::Record(record) => record,
            BundledEntry::Pair(name, data) => SourceRecord::new(&name, &data, "", UNKNOWN_DATE),
        })
        .collect();
    sort_records(&mut records);
    Ok(Snapshot {
        age: BUNDLED_SNAPSHOT_AGE,
        records,
    })
}

fn build_fetch_pool(parallelism: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(parallelism.max(1))
        .build()
        .ok()
}

fn with_fetch_pool<T>(pool: &Option<rayon::ThreadPool>, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    if let Some(pool) = pool.as_ref() {
        pool.install(action)
    } else {
        action()
    }
}
