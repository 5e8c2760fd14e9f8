use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received (connection refused, DNS, timeout).
    #[error("network error while requesting {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// The server answered with a non-2xx status.
    #[error("Error {status}: {reason}")]
    Status {
        status: u16,
        reason: String,
        body: Option<String>,
    },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("invalid header '{header}', expected 'Key: Value'")]
    InvalidHeader { header: String },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    pub fn transport(
        url: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        ApiError::Transport {
            url: url.into(),
            source: source.into(),
        }
    }

    pub fn status_only(status: u16, reason: impl Into<String>) -> Self {
        ApiError::Status {
            status,
            reason: reason.into(),
            body: None,
        }
    }

    /// HTTP status code, or `None` for failures where no response arrived.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport { .. })
    }

    /// Message shown to the user: the server's error body when it sent one,
    /// otherwise the generic description.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status {
                body: Some(body), ..
            } if !body.trim().is_empty() => body.trim().to_string(),
            other => other.to_string(),
        }
    }
}
