use std::fmt;

use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};

/// An outbound request as seen by the worker.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// A top-level page load, which accepts HTML
    pub fn navigate(url: Url) -> Self {
        Self::get(url).with_header("Accept", "text/html,application/xhtml+xml,*/*;q=0.8")
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Header lookup, case-insensitive on the name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether the declared accept type includes HTML.
    /// A request without an Accept header does not.
    pub fn accepts_html(&self) -> bool {
        self.header("accept")
            .map(|accept| accept.contains("text/html"))
            .unwrap_or(false)
    }

    /// Only GET requests over http(s) are answered from the cache
    pub fn is_interceptable(&self) -> bool {
        self.method == Method::GET && matches!(self.url.scheme(), "http" | "https")
    }

    pub fn cache_key(&self) -> RequestKey {
        RequestKey::new(&self.method, &self.url)
    }
}

/// Identity a request is stored under: method plus URL without fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    pub fn new(method: &Method, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self {
            method: method.as_str().to_string(),
            url: url.to_string(),
        }
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_is_interceptable() {
        assert!(Request::get(url("https://example.com/a.js")).is_interceptable());
        assert!(Request::get(url("http://example.com/a.js")).is_interceptable());
        assert!(!Request::new(Method::POST, url("https://example.com/api")).is_interceptable());
        assert!(!Request::get(url("chrome-extension://abcdef/script.js")).is_interceptable());
        assert!(!Request::get(url("data:text/plain,hello")).is_interceptable());
    }

    #[test]
    fn test_accepts_html() {
        assert!(Request::navigate(url("https://example.com/")).accepts_html());
        assert!(Request::get(url("https://example.com/"))
            .with_header("ACCEPT", "text/html")
            .accepts_html());
        assert!(!Request::get(url("https://example.com/data.json"))
            .with_header("Accept", "application/json")
            .accepts_html());
        assert!(!Request::get(url("https://example.com/data.json")).accepts_html());
    }

    #[test]
    fn test_cache_key_ignores_fragment() {
        let a = Request::get(url("https://example.com/index.html#europe")).cache_key();
        let b = Request::get(url("https://example.com/index.html")).cache_key();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "GET https://example.com/index.html");
    }

    #[test]
    fn test_cache_key_keeps_query() {
        let a = Request::get(url("https://example.com/battles.json?v=1")).cache_key();
        let b = Request::get(url("https://example.com/battles.json?v=2")).cache_key();
        assert_ne!(a, b);
    }
}
