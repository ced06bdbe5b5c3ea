//! Record fetching from the remote tabular endpoint.
//!
//! One GET request, one JSON array of row objects back. There is no
//! pagination contract; the endpoint returns every row in a single
//! response. Any transport or decode failure is fatal to the run.

use crate::config::SourceConfig;
use crate::models::RawRecord;
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, info};

/// Fetch all records from the configured endpoint.
pub async fn fetch_records(config: &SourceConfig) -> Result<Vec<RawRecord>> {
    anyhow::ensure!(
        !config.url.is_empty(),
        "No source URL configured (set --source or [source].url in .arrmap.toml)"
    );

    info!("Fetching records from {}", config.url);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .build()
        .context("Failed to create HTTP client")?;

    let mut request = client.get(&config.url);
    if let Some(ref token) = config.api_token {
        request = request.bearer_auth(token);
    }

    let response = request
        .send()
        .await
        .with_context(|| format!("Failed to fetch records from {}", config.url))?;

    let status = response.status();
    anyhow::ensure!(
        status.is_success(),
        "Record source returned {} for {}",
        status,
        config.url
    );

    let records: Vec<RawRecord> = response
        .json()
        .await
        .context("Record source response is not a JSON array of row objects")?;

    debug!("Fetched {} raw records", records.len());

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;

    #[tokio::test]
    async fn test_empty_url_rejected() {
        let config = SourceConfig::default();
        let err = fetch_records(&config).await.unwrap_err();
        assert!(err.to_string().contains("No source URL"));
    }

    #[test]
    fn test_rows_decode_as_raw_records() {
        // The shape the fetcher expects from the endpoint.
        let body = r#"[
            {"Name": "A", "Address": "1 Main St", "Latitude": 40.0,
             "Longitude": -120.0, "ARR Total": 5000},
            {"Name": "B", "ARR Total": "30000", "Notes": "vip"}
        ]"#;

        let records: Vec<RawRecord> = serde_json::from_str(body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["Name"], serde_json::json!("A"));
        assert_eq!(records[1]["ARR Total"], serde_json::json!("30000"));
    }
}
