use std::fs;

use anyhow::{Context, Result};
use chrono::Utc;

use volley_rank::config::AppConfig;
use volley_rank::export::{export_rankings, render_table};
use volley_rank::pipeline::{Session, sort_records};
use volley_rank::season::aggregate;
use volley_rank::source::{fetch_bundled_snapshot, fetch_records, parse_link_list};
use volley_rank::store::{Snapshot, SnapshotStore, open_store};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut config = AppConfig::from_env();
    config.apply_args(&args);

    let log_level = if config.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let store = config.store_path.as_deref().map(open_store);
    let snapshot = obtain_snapshot(&config, store.as_deref())?;
    log::info!(
        "using {} sources captured at {}",
        snapshot.records.len(),
        chrono::DateTime::from_timestamp_millis(snapshot.age)
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| snapshot.age.to_string())
    );

    let mut session = Session::new();
    let rounds = session.build_rounds(&snapshot.records);
    let tables = aggregate(&rounds);

    for table in &tables {
        println!("{}", render_table(table));
    }

    if let Some(path) = config.xlsx.as_deref() {
        let report = export_rankings(path, &tables, &rounds)?;
        println!(
            "Exported {} tables ({} rows) and {} games to {}",
            report.tables,
            report.ranking_rows,
            report.games,
            path.display()
        );
    }

    Ok(())
}

fn obtain_snapshot(config: &AppConfig, store: Option<&dyn SnapshotStore>) -> Result<Snapshot> {
    if !config.refresh
        && let Some(store) = store
    {
        match store.load() {
            Ok(Some(mut snapshot))
                if !snapshot.is_stale(Utc::now().timestamp_millis(), config.store_max_age_ms()) =>
            {
                sort_records(&mut snapshot.records);
                return Ok(snapshot);
            }
            Ok(Some(_)) => log::info!("stored snapshot is stale"),
            Ok(None) => log::info!("no stored snapshot"),
            Err(err) => log::warn!("failed to load stored snapshot: {err:#}"),
        }
    }

    if !config.links_file.exists() {
        log::info!("no link list, loading snapshot from {}", config.snapshot);
        return fetch_bundled_snapshot(&config.snapshot);
    }

    let raw = fs::read_to_string(&config.links_file)
        .with_context(|| format!("read link list {}", config.links_file.display()))?;
    let links = parse_link_list(&raw);
    log::info!("fetching {} sources", links.len());
    let snapshot = Snapshot::now(fetch_records(&links, config.fetch_parallelism));

    if let Some(store) = store
        && let Err(err) = store.save(&snapshot)
    {
        log::warn!("failed to save snapshot: {err:#}");
    }
    Ok(snapshot)
}
