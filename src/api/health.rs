use std::collections::BTreeMap;

use reqwest::Method;
use serde::Deserialize;

use super::{ApiClient, ApiError, RawResponse};

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub checks: Vec<HealthCheck>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct HealthCheck {
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub data: BTreeMap<String, serde_json::Value>,
}

impl HealthReport {
    pub fn is_up(&self) -> bool {
        self.status.eq_ignore_ascii_case("UP")
    }
}

impl HealthCheck {
    pub fn is_up(&self) -> bool {
        self.status.eq_ignore_ascii_case("UP")
    }

    pub fn data_summary(&self) -> String {
        self.data
            .iter()
            .map(|(k, v)| match v {
                serde_json::Value::String(s) => format!("{k}={s}"),
                other => format!("{k}={other}"),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Reads the readiness report.
pub async fn readiness(client: &ApiClient, path: &str) -> Result<HealthReport, ApiError> {
    let raw = client.execute::<()>(Method::GET, path, None).await?;
    decode_readiness(raw, &crate::utils::join_url(client.base_url(), path))
}

/// A DOWN service answers 503 with the same JSON document, so that status
/// is decoded rather than treated as failure.
pub fn decode_readiness(raw: RawResponse, url: &str) -> Result<HealthReport, ApiError> {
    if raw.status == 503 {
        if let Ok(report) = serde_json::from_str::<HealthReport>(&raw.body) {
            return Ok(report);
        }
    }
    let body = raw.into_result()?;
    serde_json::from_str(&body).map_err(|e| ApiError::Decode {
        url: url.to_string(),
        source: e,
    })
}
