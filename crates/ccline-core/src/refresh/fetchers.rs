//! Per-resource fetch functions.
//!
//! Contract with the orchestration layer: a fetch either atomically
//! replaces the cached payload or leaves it untouched. It never reports
//! an error upward. Network calls carry their own connect/read timeouts;
//! the `ccusage` subprocess is bounded and killed on drop so an outer
//! deadline can reap it.

use std::process::Stdio;
use std::time::Duration;

use once_cell::sync::Lazy;
use tokio::process::Command;
use tracing::debug;
use ureq::Agent;

use super::credentials;
use crate::cache::{CacheStore, ResourceKey};

const LIMITS_URL: &str = "https://api.anthropic.com/api/oauth/usage";
const OAUTH_BETA: &str = "oauth-2025-04-20";
const PRICING_URL: &str =
    "https://raw.githubusercontent.com/BerriAI/litellm/main/model_prices_and_context_window.json";

/// Outer bound on the `ccusage` subprocess.
const CCUSAGE_TIMEOUT: Duration = Duration::from_secs(30);

static HTTP: Lazy<Agent> = Lazy::new(|| {
    Agent::config_builder()
        .timeout_connect(Some(Duration::from_secs(5)))
        .timeout_global(Some(Duration::from_secs(10)))
        .build()
        .into()
});

/// Run the fetch function for `key`.
pub async fn fetch_resource(store: &CacheStore, key: ResourceKey) {
    match key {
        ResourceKey::Limits => refresh_limits(store).await,
        ResourceKey::Usage => refresh_usage(store).await,
        ResourceKey::Pricing => refresh_pricing(store).await,
    }
}

/// Fetch OAuth usage limits from the Anthropic API.
pub async fn refresh_limits(store: &CacheStore) {
    let Some(token) = credentials::oauth_token().await else {
        debug!("no OAuth token available, skipping limits refresh");
        return;
    };

    let body = tokio::task::spawn_blocking(move || {
        let auth = format!("Bearer {token}");
        let mut response = HTTP
            .get(LIMITS_URL)
            .header("Authorization", auth.as_str())
            .header("anthropic-beta", OAUTH_BETA)
            .call()
            .ok()?;
        response.body_mut().read_to_string().ok()
    })
    .await
    .ok()
    .flatten();

    if let Some(body) = body {
        commit(store, ResourceKey::Limits, &body);
    } else {
        debug!("limits fetch produced no payload");
    }
}

/// Fetch daily usage accounting from the `ccusage` CLI.
pub async fn refresh_usage(store: &CacheStore) {
    let path = widened_path();
    let Some(argv) = locate_ccusage(&path) else {
        debug!("ccusage not found on PATH, skipping usage refresh");
        return;
    };

    let today = chrono::Local::now().date_naive();
    let since = (today - chrono::Duration::days(30)).format("%Y%m%d").to_string();
    let until = today.format("%Y%m%d").to_string();

    let output = tokio::time::timeout(
        CCUSAGE_TIMEOUT,
        Command::new(&argv[0])
            .args(&argv[1..])
            .args([
                "daily",
                "--json",
                "--instances",
                "--since",
                since.as_str(),
                "--until",
                until.as_str(),
                "--mode",
                "calculate",
            ])
            .env("PATH", &path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output(),
    )
    .await;

    match output {
        Ok(Ok(out)) if out.status.success() => {
            commit(store, ResourceKey::Usage, &String::from_utf8_lossy(&out.stdout));
        }
        Ok(Ok(out)) => debug!("ccusage exited with {}", out.status),
        Ok(Err(e)) => debug!("ccusage failed to run: {e}"),
        Err(_) => debug!("ccusage timed out after {}s", CCUSAGE_TIMEOUT.as_secs()),
    }
}

/// Fetch the LiteLLM model pricing table.
pub async fn refresh_pricing(store: &CacheStore) {
    let body = tokio::task::spawn_blocking(|| {
        let mut response = HTTP.get(PRICING_URL).call().ok()?;
        response.body_mut().read_to_string().ok()
    })
    .await
    .ok()
    .flatten();

    if let Some(body) = body {
        commit(store, ResourceKey::Pricing, &body);
    } else {
        debug!("pricing fetch produced no payload");
    }
}

/// Validate and atomically commit a fetched payload.
///
/// Empty or non-JSON bodies are dropped: a bad fetch must never replace a
/// good cache.
fn commit(store: &CacheStore, key: ResourceKey, body: &str) {
    if body.trim().is_empty() {
        debug!("empty payload for {key}, keeping previous cache");
        return;
    }
    if serde_json::from_str::<serde_json::Value>(body).is_err() {
        debug!("non-JSON payload for {key}, keeping previous cache");
        return;
    }
    if let Err(e) = store.write_atomic(key, body.as_bytes()) {
        debug!("cache write for {key} failed: {e:#}");
    }
}

/// PATH widened with the usual bun/node install locations, so `ccusage`
/// resolves even when the invoking shell has a minimal environment.
fn widened_path() -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(home) = dirs::home_dir() {
        for sub in [".bun/bin", ".local/bin", ".nvm/current/bin"] {
            parts.push(home.join(sub).to_string_lossy().into_owned());
        }
    }
    parts.push("/usr/local/bin".to_string());
    if let Ok(env_path) = std::env::var("PATH") {
        if !env_path.is_empty() {
            parts.push(env_path);
        }
    }
    parts.join(":")
}

/// Resolve the ccusage invocation: a direct install, else bunx, else npx.
fn locate_ccusage(path: &str) -> Option<Vec<String>> {
    let candidates: [&[&str]; 3] = [&["ccusage"], &["bunx", "ccusage"], &["npx", "-y", "ccusage"]];
    for argv in candidates {
        if which::which_in(argv[0], Some(path), "/").is_ok() {
            return Some(argv.iter().map(|s| s.to_string()).collect());
        }
    }
    None
}
