//! Response value returned by a transport attempt.

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::time::Duration;

/// A received response. A non-success status is still a `Response`, never an error.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: u16,
    headers: HeaderMap,
    body: Vec<u8>,
    elapsed: Duration,
    retries: u32,
}

impl Response {
    pub fn new(status: u16, headers: HeaderMap, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            elapsed: Duration::ZERO,
            retries: 0,
        }
    }

    /// Response with no headers, handy for stub transports.
    pub fn from_status(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::new(status, HeaderMap::new(), body)
    }

    pub(crate) fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub(crate) fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// Time spent on the attempt that produced this response.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Retries performed before this response was accepted.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        id: u64,
        name: String,
    }

    #[test]
    fn test_json_decode() {
        let resp = Response::from_status(200, r#"{"id":7,"name":"ada"}"#);
        assert!(resp.is_success());
        assert_eq!(
            resp.json::<User>().unwrap(),
            User {
                id: 7,
                name: "ada".into()
            }
        );
        assert!(Response::from_status(200, "nope").json::<User>().is_err());
    }

    #[test]
    fn test_status_helpers() {
        let resp = Response::from_status(503, "busy");
        assert!(!resp.is_success());
        assert_eq!(resp.text(), "busy");
        assert_eq!(resp.elapsed(), Duration::ZERO);
        assert_eq!(resp.with_elapsed(Duration::from_millis(3)).elapsed(), Duration::from_millis(3));
    }
}
