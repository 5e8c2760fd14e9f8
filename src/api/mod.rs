pub mod collection;
pub mod error;
pub mod health;

use std::time::Duration;

use log::{debug, trace};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use collection::{Collection, PatchProducts, RestCollection};
pub use error::ApiError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const PRODUCTS_PATH: &str = "/com.microprofile/api/productos";
pub const USERS_PATH: &str = "/api/usuarios";
pub const HEALTH_PATH: &str = "/health/ready";

#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub proxy: Option<String>,
    pub header: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: 10,
            proxy: None,
            header: None,
        }
    }
}

/// Raw response after the status check has been deferred to the caller.
#[derive(Clone, Debug)]
pub struct RawResponse {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn into_result(self) -> Result<String, ApiError> {
        if self.is_success() {
            return Ok(self.body);
        }
        let body = if self.body.trim().is_empty() {
            None
        } else {
            Some(self.body)
        };
        Err(ApiError::Status {
            status: self.status,
            reason: self.reason,
            body,
        })
    }
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(options: &ClientOptions) -> Result<Self, ApiError> {
        let base_url = options.base_url.trim().trim_end_matches('/').to_string();
        if reqwest::Url::parse(&base_url).is_err() {
            return Err(ApiError::InvalidUrl {
                url: options.base_url.clone(),
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("catalogctl/", env!("CARGO_PKG_VERSION"))),
        );
        if let Some(raw) = options.header.as_deref().filter(|h| !h.trim().is_empty()) {
            let (name, value) =
                crate::utils::parse_header(raw).map_err(|_| ApiError::InvalidHeader {
                    header: raw.to_string(),
                })?;
            headers.insert(name, value);
        }

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(options.timeout_seconds.max(1)));

        if let Some(proxy) = options.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            let proxy_cfg = reqwest::Proxy::all(proxy).map_err(|e| ApiError::ProxySetup {
                proxy: proxy.to_string(),
                source: e,
            })?;
            builder = builder.proxy(proxy_cfg);
        }

        let http = builder
            .build()
            .map_err(|e| ApiError::HttpClientBuild { source: e })?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> Result<reqwest::Url, ApiError> {
        let url = crate::utils::join_url(&self.base_url, path);
        reqwest::Url::parse(&url).map_err(|_| ApiError::InvalidUrl { url })
    }

    /// Sends a request and returns the response without judging its status.
    pub async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<RawResponse, ApiError> {
        let url = self.endpoint(path)?;
        debug!("{} {}", method, url);

        let mut request = self.http.request(method, url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::transport(url.as_str(), e))?;
        let status = response.status();
        let reason = status.canonical_reason().unwrap_or_default().to_string();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::transport(url.as_str(), e))?;
        trace!("{} {} -> {} ({} bytes)", url, reason, status.as_u16(), text.len());

        Ok(RawResponse {
            status: status.as_u16(),
            reason,
            body: text,
        })
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let body = self
            .execute::<()>(Method::GET, path, None)
            .await?
            .into_result()?;
        decode(&self.base_url, path, &body)
    }

    /// Mutating request; success bodies are returned as text since the
    /// backend answers some of them with plain strings or nothing at all.
    pub async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<String, ApiError> {
        self.execute(method, path, Some(body)).await?.into_result()
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute::<()>(Method::DELETE, path, None)
            .await?
            .into_result()
            .map(|_| ())
    }
}

fn decode<T: DeserializeOwned>(base_url: &str, path: &str, body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Decode {
        url: crate::utils::join_url(base_url, path),
        source: e,
    })
}
