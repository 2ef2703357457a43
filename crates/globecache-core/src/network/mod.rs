//! Network access for the worker.
//!
//! The `Fetcher` trait is the worker's network boundary. `HttpFetcher`
//! implements it on top of a shared `reqwest::Client`.

pub mod http;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::{Request, Response};

pub use http::HttpFetcher;

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform the request. Any HTTP status is a successful fetch; only
    /// transport failures are errors.
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError>;
}
