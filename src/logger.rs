//! Per-attempt request logging.

use crate::header::HttpHeader;
use crate::response::Response;
use http::Method;
use std::collections::HashMap;
use std::time::{Duration, SystemTime};
use url::Url;

/// Everything recorded about one completed attempt.
#[derive(Debug, Clone, Copy)]
pub struct RequestLogEntry<'a> {
    /// The HTTP method.
    pub method: &'a Method,
    /// The final URL, query string included.
    pub url: &'a Url,
    /// The caller-supplied request headers.
    pub request_headers: &'a [HttpHeader],
    /// The request body text, if one was sent.
    pub request_body: Option<&'a str>,
    /// The response built for this attempt.
    pub response: &'a Response,
    /// When the attempt started.
    pub started_at: SystemTime,
    /// When the response was built.
    pub finished_at: SystemTime,
    /// Caller-supplied data from
    /// [`RequestSettings::extended_logging_data`](crate::RequestSettings::extended_logging_data).
    pub extended_data: &'a HashMap<String, String>,
}

impl RequestLogEntry<'_> {
    /// Wall-clock time between start and finish.
    pub fn elapsed(&self) -> Duration {
        self.finished_at
            .duration_since(self.started_at)
            .unwrap_or_default()
    }
}

/// Sink for per-attempt request records.
///
/// Called exactly once for every attempt that produced a response. Logging
/// is fire-and-forget: implementations report their own failures and must
/// not panic.
pub trait RequestLogger: Send + Sync {
    /// Records one attempt.
    fn log(&self, entry: &RequestLogEntry<'_>);
}

/// Emits every attempt as a `tracing` event.
///
/// Successful responses are logged at `INFO`, 4xx/5xx at `WARN`.
///
/// # Examples
///
/// ```no_run
/// use simplerest::{JsonStringSerializer, ReqwestTransport, RestService, TracingRequestLogger};
/// use std::sync::Arc;
///
/// # fn example() -> Result<(), simplerest::Error> {
/// let service = RestService::builder()
///     .transport(ReqwestTransport::new()?)
///     .serializer(JsonStringSerializer)
///     .logger(Arc::new(TracingRequestLogger::new().with_bodies(true)))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRequestLogger {
    include_bodies: bool,
}

impl TracingRequestLogger {
    /// Creates a logger that omits request and response bodies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Includes request and response bodies in the events.
    pub fn with_bodies(mut self, include_bodies: bool) -> Self {
        self.include_bodies = include_bodies;
        self
    }
}

impl RequestLogger for TracingRequestLogger {
    fn log(&self, entry: &RequestLogEntry<'_>) {
        let status = entry.response.status_code();
        let elapsed_ms = entry.elapsed().as_millis();
        let extended = format!("{:?}", entry.extended_data);
        let (request_body, response_body) = if self.include_bodies {
            (entry.request_body.unwrap_or(""), entry.response.raw_body())
        } else {
            ("", "")
        };

        if status.is_client_error() || status.is_server_error() {
            tracing::warn!(
                method = %entry.method,
                url = %entry.url,
                status = status.as_u16(),
                elapsed_ms = elapsed_ms,
                request_headers = entry.request_headers.len(),
                request_body = request_body,
                response_body = response_body,
                extended = %extended,
                "REST request failed"
            );
        } else {
            tracing::info!(
                method = %entry.method,
                url = %entry.url,
                status = status.as_u16(),
                elapsed_ms = elapsed_ms,
                request_headers = entry.request_headers.len(),
                request_body = request_body,
                response_body = response_body,
                extended = %extended,
                "REST request completed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_elapsed() {
        let started_at = SystemTime::now();
        let response = Response::new(StatusCode::OK, Vec::new(), "");
        let url = Url::parse("http://x/").unwrap();
        let extended = HashMap::new();

        let entry = RequestLogEntry {
            method: &Method::GET,
            url: &url,
            request_headers: &[],
            request_body: None,
            response: &response,
            started_at,
            finished_at: started_at + Duration::from_millis(15),
            extended_data: &extended,
        };

        assert_eq!(entry.elapsed(), Duration::from_millis(15));

        // Clock skew must not panic.
        let skewed = RequestLogEntry {
            finished_at: started_at - Duration::from_millis(1),
            ..entry
        };
        assert_eq!(skewed.elapsed(), Duration::ZERO);

        TracingRequestLogger::new().with_bodies(true).log(&entry);
    }
}
