//! One invocation, end to end: read the snapshot, make the caches as fresh
//! as latency allows, print two lines, log the session.

use anyhow::Result;
use chrono::{Local, Utc};
use tracing::debug;

use ccline_core::cache::{default_cache_dir, CacheStore, ResourceKey};
use ccline_core::config::Settings;
use ccline_core::refresh::{self, background, fetchers};
use ccline_core::session::SessionLogger;
use ccline_core::snapshot::Snapshot;

use crate::cli::{Command, Config};
use crate::render::{self, width, Tier};
use crate::stats;

pub async fn run(cli: Config) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref());
    let store = CacheStore::new(default_cache_dir());

    match &cli.command {
        Some(Command::Stats) => return stats::print_report(&store),
        Some(Command::Refresh { key }) => {
            let key: ResourceKey = key.parse()?;
            background::run_worker(&store, key).await;
            return Ok(());
        }
        None => {}
    }

    let snapshot = match Snapshot::from_reader(std::io::stdin().lock()) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            // Degraded render beats no render: emit a bare model name so
            // the invoking surface still has a line to show.
            debug!("unreadable snapshot: {e:#}");
            println!("Claude");
            return Ok(());
        }
    };

    // Cold start: fill missing caches in parallel before the tier render.
    refresh::prewarm(&store, &settings).await;

    let tier = Tier::from_columns(width::detect_columns(), &settings.thresholds);
    let cache = &settings.cache;

    // Limits block briefly when stale: the first paint after expiry should
    // carry data. Usage and pricing prefer staleness over latency.
    let limits = refresh::ensure(
        &store,
        ResourceKey::Limits,
        ResourceKey::Limits.ttl(cache),
        || fetchers::refresh_limits(&store),
        None,
    )
    .await;

    let bg_usage = || background::request(&store, ResourceKey::Usage);
    let usage = refresh::ensure(
        &store,
        ResourceKey::Usage,
        ResourceKey::Usage.ttl(cache),
        || fetchers::refresh_usage(&store),
        Some(&bg_usage),
    )
    .await;

    let bg_pricing = || background::request(&store, ResourceKey::Pricing);
    let pricing = refresh::ensure(
        &store,
        ResourceKey::Pricing,
        ResourceKey::Pricing.ttl(cache),
        || fetchers::refresh_pricing(&store),
        Some(&bg_pricing),
    )
    .await;

    let line1 = render::context_line(&snapshot, tier, limits.as_ref(), pricing.as_ref(), &settings);
    let line2 = render::limits_line(
        tier,
        limits.as_ref(),
        usage.as_ref(),
        &settings,
        Utc::now(),
        Local::now().date_naive(),
    );
    println!("{line1}");
    println!("{line2}");

    SessionLogger::new(store.dir(), &settings.session_log).record(&snapshot, Utc::now());

    Ok(())
}
