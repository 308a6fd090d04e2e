//! The HTTP exchange boundary.
//!
//! A [`Transport`] sends one fully described [`OutboundRequest`] and hands
//! back the raw reply. Everything around it (retries, logging, response
//! actions, deserialization) lives in [`RestService`](crate::RestService).

use crate::header::HttpHeader;
use crate::settings::Credentials;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use http::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE, USER_AGENT};
use http::{HeaderMap, Method, StatusCode};
use std::fmt;
use std::pin::Pin;
use std::time::Duration;
use url::Url;

/// Boxed error used for failures the transport cannot classify further.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A request body produced chunk by chunk while it is being sent.
pub type BodyStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// The body of an outbound request.
pub enum OutboundBody {
    /// No body.
    Empty,
    /// A body fully held in memory, sent with a content length.
    Buffered(Bytes),
    /// A body sent with chunked transfer as the stream produces it.
    Streaming(BodyStream),
}

impl fmt::Debug for OutboundBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutboundBody::Empty => f.write_str("Empty"),
            OutboundBody::Buffered(bytes) => write!(f, "Buffered({} bytes)", bytes.len()),
            OutboundBody::Streaming(_) => f.write_str("Streaming"),
        }
    }
}

/// Everything needed to send one attempt.
#[derive(Debug)]
pub struct OutboundRequest {
    /// The HTTP method.
    pub method: Method,
    /// The final URL, query string included.
    pub url: Url,
    /// Caller-supplied headers, duplicates allowed.
    pub headers: Vec<HttpHeader>,
    /// `Content-Type` header value.
    pub content_type: Option<String>,
    /// `Accept` header value.
    pub accept: Option<String>,
    /// Explicit `Content-Length` for an empty body.
    pub content_length: Option<u64>,
    /// Timeout for the whole exchange.
    pub timeout: Option<Duration>,
    /// `User-Agent` header value.
    pub user_agent: Option<String>,
    /// Credentials to authenticate with.
    pub credentials: Option<Credentials>,
    /// The request body.
    pub body: OutboundBody,
}

/// The status, headers and body bytes of a reply.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The full response body.
    pub body: Bytes,
}

/// Ways a transport can fail.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    /// The server answered with a protocol-level error. The reply is still
    /// available and becomes an ordinary response.
    #[error("HTTP error {}", .0.status)]
    Status(RawResponse),

    /// The exchange did not finish within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// No response was received at all (connection refused, DNS failure,
    /// TLS failure, broken body stream, ...).
    #[error("Connection failed: {0}")]
    Connection(#[source] BoxError),
}

impl TransportError {
    /// Wraps any error as a connection failure.
    pub fn connection(err: impl Into<BoxError>) -> Self {
        TransportError::Connection(err.into())
    }
}

/// Sends a single HTTP request.
///
/// Implementations must not retry; retry policy belongs to the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the reply.
    ///
    /// A reply the transport treats as a protocol error is returned as
    /// [`TransportError::Status`] so that it still reaches the caller.
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, TransportError>;
}

/// [`Transport`] backed by a `reqwest` client.
///
/// Replies with a 4xx or 5xx status are reported as
/// [`TransportError::Status`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with a default `reqwest` client.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new() -> crate::Result<Self> {
        let http_client = reqwest::Client::builder().build().map_err(|e| {
            crate::Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;
        Ok(Self { http_client })
    }

    /// Wraps an existing `reqwest` client.
    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self.http_client.request(request.method, request.url);

        if let Some(content_type) = &request.content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        if let Some(accept) = &request.accept {
            builder = builder.header(ACCEPT, accept);
        }
        if let Some(user_agent) = &request.user_agent {
            builder = builder.header(USER_AGENT, user_agent);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        match &request.credentials {
            Some(Credentials::Basic { username, password }) => {
                builder = builder.basic_auth(username, password.as_ref());
            }
            Some(Credentials::Bearer(token)) => {
                builder = builder.bearer_auth(token);
            }
            None => {}
        }
        for header in &request.headers {
            builder = builder.header(header.key.as_str(), header.value.as_str());
        }

        builder = match request.body {
            OutboundBody::Empty => match request.content_length {
                Some(len) => builder.header(CONTENT_LENGTH, len),
                None => builder,
            },
            OutboundBody::Buffered(bytes) => builder.body(bytes),
            OutboundBody::Streaming(stream) => builder.body(reqwest::Body::wrap_stream(stream)),
        };

        let response = builder.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        let raw = RawResponse {
            status,
            headers,
            body,
        };

        if status.is_client_error() || status.is_server_error() {
            Err(TransportError::Status(raw))
        } else {
            Ok(raw)
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::connection(err)
    }
}
