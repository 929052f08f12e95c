//! Best-effort usage tracking against the external user store.
//!
//! Runs fully detached from the request that spawned it: one read-then-upsert
//! attempt, every failure logged and swallowed, no retry and no backoff.
//! Concurrent requests for the same email race read-then-write; last write
//! wins, which the store's consumers accept.

use std::sync::Arc;

use serde::Deserialize;

use crate::prelude::Error;
use crate::serve::App;

#[derive(Debug, Deserialize)]
struct UserRow {
    id: String,
    usage_count: u64,
}

/// Upsert the usage record for `email`. Never fails the caller.
pub async fn record_usage(
    http: reqwest::Client,
    config: Arc<App>,
    email: String,
    username: String,
    os_info: String,
) {
    if email.is_empty() || config.store_url.is_empty() || config.store_api_key.is_empty() {
        log::info!("Skipping usage update - store not configured");
        return;
    }

    match upsert_user(&http, &config, &email, &username, &os_info).await {
        Ok(()) => log::info!("Updated user {username} ({email})"),
        Err(err) => log::warn!("Usage tracking failed for {email}: {err}"),
    }
}

async fn upsert_user(
    http: &reqwest::Client,
    config: &App,
    email: &str,
    username: &str,
    os_info: &str,
) -> Result<(), Error> {
    let get_url = format!(
        "{}/rest/v1/active_users?email=eq.{}&select=id,usage_count",
        config.store_url,
        urlencoding::encode(email)
    );

    let rows: Vec<UserRow> = http
        .get(&get_url)
        .header("apikey", &config.store_api_key)
        .bearer_auth(&config.store_api_key)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| Error::Store(format!("user lookup failed: {e}")))?
        .json()
        .await
        .map_err(|e| Error::Store(format!("malformed user lookup response: {e}")))?;

    if let Some(row) = rows.first() {
        let mut update = serde_json::json!({ "usage_count": row.usage_count + 1 });
        if !os_info.trim().is_empty() {
            update["osInfo"] = serde_json::Value::String(os_info.to_string());
        }

        http.patch(format!(
            "{}/rest/v1/active_users?id=eq.{}",
            config.store_url,
            urlencoding::encode(&row.id)
        ))
        .header("apikey", &config.store_api_key)
        .bearer_auth(&config.store_api_key)
        .json(&update)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| Error::Store(format!("usage update failed: {e}")))?;
    } else {
        let insert = serde_json::json!([{
            "id": uuid::Uuid::new_v4().to_string(),
            "username": username,
            "email": email,
            "osInfo": os_info,
            "usage_count": 1,
        }]);

        http.post(format!("{}/rest/v1/active_users", config.store_url))
            .header("apikey", &config.store_api_key)
            .bearer_auth(&config.store_api_key)
            .header("Prefer", "return=minimal")
            .json(&insert)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Store(format!("user insert failed: {e}")))?;
    }

    Ok(())
}
