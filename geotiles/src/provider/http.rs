//! HTTP client abstraction for testability

use std::time::Duration;

use reqwest::Url;

use super::types::ProviderError;

/// Query parameters that carry credentials and must never be logged.
const SECRET_PARAMS: &[&str] = &["key"];

/// Trait for HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request and returns the body.
    fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError>;

    /// Performs an HTTP HEAD request and returns the reported content length.
    fn content_length(&self, url: &str) -> Result<Option<u64>, ProviderError>;
}

/// Real HTTP client implementation using reqwest.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with a 30 second timeout.
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_timeout(30)
    }

    /// Creates a new ReqwestClient with custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                ProviderError::HttpError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ProviderError::HttpError(format!("Request failed: {}", e.without_url())))?;

        if !response.status().is_success() {
            return Err(ProviderError::Status {
                status: response.status().as_u16(),
                url: redact_url(url),
            });
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| ProviderError::HttpError(format!("Failed to read response: {}", e.without_url())))
    }

    fn content_length(&self, url: &str) -> Result<Option<u64>, ProviderError> {
        let response = self
            .client
            .head(url)
            .send()
            .map_err(|e| ProviderError::HttpError(format!("HEAD failed: {}", e.without_url())))?;

        if !response.status().is_success() {
            return Err(ProviderError::Status {
                status: response.status().as_u16(),
                url: redact_url(url),
            });
        }

        Ok(response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok()))
    }
}

/// Replaces the values of credential query parameters with `***`.
pub fn redact_url(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    if !parsed
        .query_pairs()
        .any(|(k, _)| SECRET_PARAMS.contains(&k.as_ref()))
    {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| {
            let value = if SECRET_PARAMS.contains(&k.as_ref()) {
                "***".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), value)
        })
        .collect();
    parsed.query_pairs_mut().clear().extend_pairs(pairs);
    parsed.to_string()
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::HashMap;

    use parking_lot::Mutex;

    use crate::tileset::uri::strip_query;

    /// Mock HTTP client for testing.
    ///
    /// Responses are keyed by URL without its query string; unknown URLs
    /// answer 404. Every requested URL is recorded.
    #[derive(Default)]
    pub struct MockHttpClient {
        pub responses: HashMap<String, Result<Vec<u8>, ProviderError>>,
        pub calls: Mutex<Vec<String>>,
    }

    impl MockHttpClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_response(mut self, url: &str, body: &[u8]) -> Self {
            self.responses.insert(url.to_string(), Ok(body.to_vec()));
            self
        }

        pub fn with_error(mut self, url: &str, error: ProviderError) -> Self {
            self.responses.insert(url.to_string(), Err(error));
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().len()
        }

        fn lookup(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
            self.calls.lock().push(url.to_string());
            self.responses
                .get(strip_query(url))
                .cloned()
                .unwrap_or_else(|| {
                    Err(ProviderError::Status {
                        status: 404,
                        url: redact_url(url),
                    })
                })
        }
    }

    impl HttpClient for MockHttpClient {
        fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
            self.lookup(url)
        }

        fn content_length(&self, url: &str) -> Result<Option<u64>, ProviderError> {
            self.lookup(url).map(|body| Some(body.len() as u64))
        }
    }

    #[test]
    fn test_mock_client_success() {
        let mock = MockHttpClient::new().with_response("http://example.com/a", &[1, 2, 3, 4]);

        let result = mock.get("http://example.com/a?key=secret");
        assert_eq!(result.unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn test_mock_client_error() {
        let mock = MockHttpClient::new();

        let result = mock.get("http://example.com");
        assert!(result.is_err());
    }

    #[test]
    fn test_redact_url_hides_key() {
        let redacted = redact_url("https://tile.example.com/root.json?key=secret&session=s1");
        assert!(!redacted.contains("secret"));
        assert!(redacted.contains("key=***") || redacted.contains("key=%2A%2A%2A"));
        assert!(redacted.contains("session=s1"));
    }

    #[test]
    fn test_redact_url_leaves_other_urls() {
        assert_eq!(redact_url("not a url"), "not a url");
        assert_eq!(
            redact_url("https://example.com/a.glb?session=s1"),
            "https://example.com/a.glb?session=s1"
        );
    }
}
