//! OAuth credential lookup: env override first, then the platform secret
//! store (`security` on macOS, `secret-tool`/libsecret on Linux).

use std::time::Duration;

use serde_json::Value;
use tokio::process::Command;
use tracing::debug;

/// Environment override, works everywhere (CI, containers, headless).
pub const TOKEN_ENV: &str = "CLAUDE_OAUTH_TOKEN";

/// Keychain service name keytar stores Claude Code credentials under.
const SERVICE_NAME: &str = "Claude Code-credentials";

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolve the OAuth access token, if any.
pub async fn oauth_token() -> Option<String> {
    if let Some(token) = env_token() {
        return Some(token);
    }
    lookup_secret_store().await
}

fn env_token() -> Option<String> {
    std::env::var(TOKEN_ENV)
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

async fn lookup_secret_store() -> Option<String> {
    let argv: &[&str] = if cfg!(target_os = "macos") {
        &["security", "find-generic-password", "-s", SERVICE_NAME, "-w"]
    } else if cfg!(target_os = "linux") {
        &["secret-tool", "lookup", "service", SERVICE_NAME]
    } else {
        return None;
    };

    let output = tokio::time::timeout(
        LOOKUP_TIMEOUT,
        Command::new(argv[0]).args(&argv[1..]).output(),
    )
    .await
    .ok()?
    .ok()?;

    if !output.status.success() {
        debug!("secret store lookup exited with {}", output.status);
        return None;
    }

    let raw = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if raw.is_empty() {
        return None;
    }
    parse_credentials(&raw)
}

/// Extract the access token from a keytar credential blob.
///
/// The store holds either a JSON document (`accessToken` at the top level
/// or nested under `claudeAiOauth`) or, in older setups, the bare token.
fn parse_credentials(raw: &str) -> Option<String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(creds) => creds
            .get("accessToken")
            .and_then(Value::as_str)
            .or_else(|| {
                creds
                    .get("claudeAiOauth")
                    .and_then(|o| o.get("accessToken"))
                    .and_then(Value::as_str)
            })
            .map(str::to_string),
        Err(_) => Some(raw.to_string()),
    }
}
