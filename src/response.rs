//! Uniform response envelope for every completed attempt.
//!
//! A [`Response`] is built once per attempt from whatever the transport
//! returned, including 4xx and 5xx replies, and is never mutated afterwards.
//! [`TypedResponse`] adds the deserialized payload.

use crate::header::HttpHeader;
use crate::transport::RawResponse;
use http::StatusCode;
use std::ops::Deref;

/// The status, headers and raw body of a completed HTTP exchange.
///
/// # Examples
///
/// ```
/// use simplerest::{HttpHeader, Response};
/// use http::StatusCode;
///
/// let response = Response::new(
///     StatusCode::NOT_FOUND,
///     vec![HttpHeader::new("content-type", "text/plain")],
///     "no such widget",
/// );
///
/// assert_eq!(response.status(), "Not Found");
/// assert_eq!(response.header("Content-Type"), Some("text/plain"));
/// assert!(!response.is_success());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status_code: StatusCode,
    status: String,
    headers: Vec<HttpHeader>,
    raw_body: String,
}

impl Response {
    /// Creates a response whose display status is the canonical reason phrase.
    pub fn new(
        status_code: StatusCode,
        headers: Vec<HttpHeader>,
        raw_body: impl Into<String>,
    ) -> Self {
        let status = status_code
            .canonical_reason()
            .unwrap_or("Unknown")
            .to_string();
        Self::with_status(status_code, status, headers, raw_body)
    }

    /// Creates a response with an explicit display status.
    pub fn with_status(
        status_code: StatusCode,
        status: impl Into<String>,
        headers: Vec<HttpHeader>,
        raw_body: impl Into<String>,
    ) -> Self {
        Self {
            status_code,
            status: status.into(),
            headers,
            raw_body: raw_body.into(),
        }
    }

    /// The HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    /// The display form of the status.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// All response headers in the order they were received.
    pub fn headers(&self) -> &[HttpHeader] {
        &self.headers
    }

    /// The response body as text. Empty when the server sent no body.
    pub fn raw_body(&self) -> &str {
        &self.raw_body
    }

    /// Returns the first header value named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.key.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Returns `true` for statuses below 300.
    pub fn is_success(&self) -> bool {
        self.status_code.as_u16() < 300
    }
}

/// A [`Response`] together with its deserialized body.
///
/// `data` is `None` when the body was empty or could not be deserialized;
/// the metadata is always intact. Derefs to [`Response`].
///
/// # Examples
///
/// ```
/// use simplerest::{Response, TypedResponse};
/// use http::StatusCode;
///
/// let response = TypedResponse::new(
///     Response::new(StatusCode::OK, Vec::new(), "42"),
///     Some(42),
/// );
///
/// let doubled = response.map(|n| n * 2);
/// assert_eq!(doubled.data, Some(84));
/// assert_eq!(doubled.status_code(), StatusCode::OK);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedResponse<T> {
    /// The underlying response.
    pub response: Response,

    /// The deserialized body, if any.
    pub data: Option<T>,
}

impl<T> TypedResponse<T> {
    /// Creates a new `TypedResponse`.
    pub fn new(response: Response, data: Option<T>) -> Self {
        Self { response, data }
    }

    /// Maps the payload while keeping the response metadata.
    pub fn map<U, F>(self, f: F) -> TypedResponse<U>
    where
        F: FnOnce(T) -> U,
    {
        TypedResponse {
            response: self.response,
            data: self.data.map(f),
        }
    }

    /// Splits into the response and the payload.
    pub fn into_parts(self) -> (Response, Option<T>) {
        (self.response, self.data)
    }
}

impl<T> Deref for TypedResponse<T> {
    type Target = Response;

    fn deref(&self) -> &Self::Target {
        &self.response
    }
}

impl<T> From<TypedResponse<T>> for Response {
    fn from(typed: TypedResponse<T>) -> Self {
        typed.response
    }
}

/// Turns a raw transport reply into a [`Response`].
///
/// Injected once into a [`RestService`](crate::RestService).
/// `is_error` is `true` when the transport reported the reply as a protocol
/// error (4xx/5xx) rather than a plain completion.
pub trait ResponseBuilder: Send + Sync {
    /// Builds the response for one attempt.
    fn build(&self, raw: RawResponse, is_error: bool) -> Response;
}

/// Decodes the body as UTF-8 (lossily) and flattens the headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardResponseBuilder;

impl ResponseBuilder for StandardResponseBuilder {
    fn build(&self, raw: RawResponse, _is_error: bool) -> Response {
        let headers = HttpHeader::from_header_map(&raw.headers);
        let body = String::from_utf8_lossy(&raw.body).into_owned();
        Response::new(raw.status, headers, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{HeaderMap, HeaderValue};

    #[test]
    fn test_status_text() {
        let response = Response::new(StatusCode::SERVICE_UNAVAILABLE, Vec::new(), "");
        assert_eq!(response.status(), "Service Unavailable");

        let odd = StatusCode::from_u16(599).unwrap();
        let response = Response::new(odd, Vec::new(), "");
        assert_eq!(response.status(), "Unknown");
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = Response::new(
            StatusCode::OK,
            vec![
                HttpHeader::new("X-Id", "1"),
                HttpHeader::new("x-id", "2"),
            ],
            "",
        );
        assert_eq!(response.header("x-ID"), Some("1"));
        assert_eq!(response.header("missing"), None);
    }

    #[test]
    fn test_standard_builder() {
        let mut headers = HeaderMap::new();
        headers.append("link", HeaderValue::from_static("<a>"));
        headers.append("link", HeaderValue::from_static("<b>"));

        let raw = RawResponse {
            status: StatusCode::CREATED,
            headers,
            body: Bytes::from_static(b"{\"id\":1}"),
        };

        let response = StandardResponseBuilder.build(raw, false);

        assert_eq!(response.status_code(), StatusCode::CREATED);
        assert_eq!(response.status(), "Created");
        assert_eq!(response.raw_body(), "{\"id\":1}");
        assert_eq!(response.headers().len(), 2);
    }

    #[test]
    fn test_standard_builder_invalid_utf8_body() {
        let raw = RawResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::from_static(b"ok\xff"),
        };
        let response = StandardResponseBuilder.build(raw, false);
        assert_eq!(response.raw_body(), "ok\u{fffd}");
    }

    #[test]
    fn test_typed_response_derefs_to_response() {
        let typed: TypedResponse<u32> =
            TypedResponse::new(Response::new(StatusCode::ACCEPTED, Vec::new(), ""), None);
        assert_eq!(typed.status_code(), StatusCode::ACCEPTED);
        assert!(typed.is_success());

        let (response, data) = typed.into_parts();
        assert_eq!(response.raw_body(), "");
        assert_eq!(data, None);
    }
}
