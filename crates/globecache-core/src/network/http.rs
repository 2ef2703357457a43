//! HTTP fetcher backed by reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::Fetcher;
use crate::error::FetchError;
use crate::models::{Request, Response};

/// HTTP request timeout in seconds.
/// The worker defines no timeouts of its own, so this is the only bound on
/// how long a network leg can stay pending.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(FetchError::ClientBuild)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        let url = request.url.to_string();
        let network_error = |source| FetchError::Network {
            url: url.clone(),
            source,
        };

        let mut builder = self.client.request(request.method.clone(), request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let reply = builder.send().await.map_err(network_error)?;
        let status = reply.status().as_u16();
        let headers = reply
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = reply.bytes().await.map_err(network_error)?.to_vec();

        debug!(url = %url, status, bytes = body.len(), "Fetched");
        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Url;

    #[test]
    fn test_new_builds_client() {
        assert!(HttpFetcher::new().is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let fetcher = HttpFetcher::new().unwrap();
        // Port 9 (discard) on localhost is closed on any sane test machine
        let request = Request::get(Url::parse("http://127.0.0.1:9/index.html").unwrap());
        match fetcher.fetch(&request).await {
            Err(FetchError::Network { url, .. }) => {
                assert_eq!(url, "http://127.0.0.1:9/index.html")
            }
            other => panic!("expected network error, got {:?}", other.map(|r| r.status)),
        }
    }
}
