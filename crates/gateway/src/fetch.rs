//! Remote settings fetch.

use std::time::Duration;

use thiserror::Error;

/// How long a settings download may take before it is abandoned.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a settings download failed. The `Display` form is the reply sent to
/// the member who requested the reload.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request itself failed (connection, timeout, bad URL).
    #[error("Request error: {0}")]
    Request(String),

    /// The server answered with a non-success status.
    #[error("Request from {url} failed with status code {status}")]
    Status { url: String, status: u16 },
}

/// Downloads the settings document from a fixed URL.
pub struct SettingsFetcher {
    client: reqwest::Client,
    url: String,
}

impl SettingsFetcher {
    /// Create a fetcher for the given URL.
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// The configured URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Download the settings document body.
    pub async fn fetch(&self) -> Result<String, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = response.status();
        if status.as_u16() != 200 {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_texts_are_verbatim() {
        let err = FetchError::Request("connection refused".to_string());
        assert_eq!(err.to_string(), "Request error: connection refused");

        let err = FetchError::Status {
            url: "https://example.org/settings.json".to_string(),
            status: 503,
        };
        assert_eq!(
            err.to_string(),
            "Request from https://example.org/settings.json failed with status code 503"
        );
    }
}
