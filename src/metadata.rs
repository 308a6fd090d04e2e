//! Per-request target description.

use crate::header::HttpHeader;
use http::{HeaderName, HeaderValue, Method};

/// Where and how to send a single request.
///
/// Holds the method, the absolute URL, the request headers and the query
/// parameters. Body and [`RequestSettings`](crate::RequestSettings) are passed
/// separately to the [`RestService`](crate::RestService) entry points.
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    /// The HTTP method (GET, POST, etc.).
    pub method: Method,

    /// The absolute request URL, possibly already carrying a query string.
    pub url: String,

    /// Headers for this request, in the order they are sent.
    pub headers: Vec<HttpHeader>,

    /// Query parameters appended to `url`, in insertion order.
    pub query_params: Vec<(String, String)>,
}

impl RequestMetadata {
    /// Creates a new `RequestMetadata` with the given method and URL.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query_params: Vec::new(),
        }
    }

    /// Shorthand for a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Shorthand for a POST request.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Adds a header to the request.
    ///
    /// Repeating a key sends the header more than once.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn with_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self, crate::Error> {
        validate_header(name.as_ref(), value.as_ref())?;
        self.headers
            .push(HttpHeader::new(name.as_ref(), value.as_ref()));
        Ok(self)
    }

    /// Adds a query parameter to the request.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push((key.into(), value.into()));
        self
    }

    /// Adds multiple query parameters to the request.
    pub fn with_query_params(
        mut self,
        params: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.query_params.extend(params);
        self
    }

    /// Checks every header, including ones pushed directly onto `headers`.
    pub(crate) fn validate(&self) -> Result<(), crate::Error> {
        self.headers
            .iter()
            .try_for_each(|header| validate_header(&header.key, &header.value))
    }
}

impl Default for RequestMetadata {
    fn default() -> Self {
        Self::new(Method::GET, "")
    }
}

pub(crate) fn validate_header(name: &str, value: &str) -> Result<(), crate::Error> {
    HeaderName::try_from(name)
        .map_err(|e| crate::Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
    HeaderValue::try_from(value)
        .map_err(|e| crate::Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_header_keeps_duplicates() {
        let metadata = RequestMetadata::get("http://x/")
            .with_header("x-trace", "1")
            .unwrap()
            .with_header("x-trace", "2")
            .unwrap();

        assert_eq!(
            metadata.headers,
            vec![HttpHeader::new("x-trace", "1"), HttpHeader::new("x-trace", "2")]
        );
    }

    #[test]
    fn test_with_header_rejects_invalid_name() {
        let result = RequestMetadata::get("http://x/").with_header("bad header", "v");
        assert!(matches!(result, Err(crate::Error::ConfigurationError(_))));
    }

    #[test]
    fn test_validate_catches_directly_pushed_headers() {
        let mut metadata = RequestMetadata::post("http://x/");
        metadata.headers.push(HttpHeader::new("x-ok", "line\nbreak"));
        assert!(metadata.validate().is_err());
    }

    #[test]
    fn test_query_params_in_order() {
        let metadata = RequestMetadata::get("http://x/")
            .with_query_param("b", "2")
            .with_query_params(vec![("a".to_string(), "1".to_string())]);
        assert_eq!(
            metadata.query_params,
            vec![
                ("b".to_string(), "2".to_string()),
                ("a".to_string(), "1".to_string())
            ]
        );
    }
}
