//! Per-call request configuration.

use crate::metadata::validate_header;
use crate::response::Response;
use crate::retry::is_success_status;
use http::StatusCode;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Side effect run for every completed attempt whose status code it is
/// registered for.
pub type ResponseAction = Arc<dyn Fn(&Response) + Send + Sync>;

/// Credentials attached to outgoing requests.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// HTTP basic authentication.
    Basic {
        /// The user name.
        username: String,
        /// The password, if any.
        password: Option<String>,
    },
    /// A bearer token sent in the `Authorization` header.
    Bearer(String),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Credentials::Bearer(_) => f.debug_tuple("Bearer").field(&"<redacted>").finish(),
        }
    }
}

/// Options that shape how a single logical call is sent and retried.
///
/// Settings are read-only for the duration of a call. When a call passes no
/// settings, the service uses
/// [`RestService::default_settings`](crate::RestService::default_settings),
/// which takes its media types from the bound serializer.
///
/// # Examples
///
/// ```
/// use simplerest::RequestSettings;
/// use http::StatusCode;
/// use std::time::Duration;
///
/// let settings = RequestSettings::new("application/json")
///     .with_retry_count(3)
///     .with_retry_delay(Duration::from_millis(250))
///     .with_success_code(StatusCode::NOT_FOUND)
///     .with_response_action(StatusCode::CONFLICT, |response| {
///         eprintln!("conflict: {}", response.raw_body());
///     });
///
/// assert_eq!(settings.retry_count, 3);
/// assert!(settings.is_success(StatusCode::NOT_FOUND));
/// ```
#[derive(Clone)]
pub struct RequestSettings {
    /// Value of the `Content-Type` header.
    pub content_type: String,

    /// Value of the `Accept` header.
    pub accept: String,

    /// Number of retries after the first attempt. `0` means a single attempt.
    pub retry_count: u32,

    /// Pause between attempts.
    pub retry_delay: Duration,

    /// Status codes of 300 and above that still end the retry loop as a
    /// success.
    pub non_success_codes_to_treat_as_success: HashSet<StatusCode>,

    /// Callbacks run after each completed attempt with a matching status.
    pub response_actions: HashMap<StatusCode, ResponseAction>,

    /// Value of the `User-Agent` header.
    pub user_agent: Option<String>,

    /// Credentials to authenticate with.
    pub credentials: Option<Credentials>,

    /// Per-attempt transport timeout.
    pub timeout: Option<Duration>,

    /// Send streamed bodies with chunked transfer encoding.
    pub chunk_request: bool,

    /// Explicit `Content-Length` for requests without a body. `None` leaves
    /// framing to the transport.
    pub content_length: Option<u64>,

    /// Send `content_length` even when it is zero.
    pub allow_zero_content_length: bool,

    /// Passed through untouched to the [`RequestLogger`](crate::RequestLogger).
    pub extended_logging_data: HashMap<String, String>,
}

impl RequestSettings {
    /// Creates settings that send and accept `content_type`, with no retries.
    pub fn new(content_type: impl Into<String>) -> Self {
        let content_type = content_type.into();
        Self {
            accept: content_type.clone(),
            content_type,
            retry_count: 0,
            retry_delay: Duration::ZERO,
            non_success_codes_to_treat_as_success: HashSet::new(),
            response_actions: HashMap::new(),
            user_agent: None,
            credentials: None,
            timeout: None,
            chunk_request: false,
            content_length: None,
            allow_zero_content_length: false,
            extended_logging_data: HashMap::new(),
        }
    }

    /// Sets the `Accept` header value.
    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = accept.into();
        self
    }

    /// Sets the number of retries.
    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    /// Sets the pause between attempts.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Treats `status` as a success even though it is 300 or above.
    pub fn with_success_code(mut self, status: StatusCode) -> Self {
        self.non_success_codes_to_treat_as_success.insert(status);
        self
    }

    /// Registers a callback for `status`, replacing any previous one.
    pub fn with_response_action<F>(mut self, status: StatusCode, action: F) -> Self
    where
        F: Fn(&Response) + Send + Sync + 'static,
    {
        self.response_actions.insert(status, Arc::new(action));
        self
    }

    /// Sets the `User-Agent` header value.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sets the credentials.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Sets the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enables chunked transfer for streamed bodies.
    pub fn with_chunk_request(mut self, chunk_request: bool) -> Self {
        self.chunk_request = chunk_request;
        self
    }

    /// Sets an explicit content length for requests without a body.
    pub fn with_content_length(mut self, content_length: u64) -> Self {
        self.content_length = Some(content_length);
        self
    }

    /// Allows sending a zero content length.
    pub fn with_allow_zero_content_length(mut self, allow: bool) -> Self {
        self.allow_zero_content_length = allow;
        self
    }

    /// Adds an entry handed to the request logger.
    pub fn with_logging_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extended_logging_data.insert(key.into(), value.into());
        self
    }

    /// Returns `true` if `status` ends the retry loop.
    pub fn is_success(&self, status: StatusCode) -> bool {
        is_success_status(status, &self.non_success_codes_to_treat_as_success)
    }

    /// The content length to send for a request without a body.
    pub(crate) fn explicit_content_length(&self) -> Option<u64> {
        self.content_length
            .filter(|&len| len > 0 || self.allow_zero_content_length)
    }

    /// Checks that every header-bound value can actually be sent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`](crate::Error::ConfigurationError)
    /// naming the offending value.
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_header("content-type", &self.content_type)?;
        validate_header("accept", &self.accept)?;
        if let Some(user_agent) = &self.user_agent {
            validate_header("user-agent", user_agent)?;
        }
        if let Some(Credentials::Bearer(token)) = &self.credentials {
            validate_header("authorization", &format!("Bearer {}", token))?;
        }
        Ok(())
    }
}

impl fmt::Debug for RequestSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut actions: Vec<u16> = self.response_actions.keys().map(|s| s.as_u16()).collect();
        actions.sort_unstable();

        f.debug_struct("RequestSettings")
            .field("content_type", &self.content_type)
            .field("accept", &self.accept)
            .field("retry_count", &self.retry_count)
            .field("retry_delay", &self.retry_delay)
            .field(
                "non_success_codes_to_treat_as_success",
                &self.non_success_codes_to_treat_as_success,
            )
            .field("response_actions", &actions)
            .field("user_agent", &self.user_agent)
            .field("credentials", &self.credentials)
            .field("timeout", &self.timeout)
            .field("chunk_request", &self.chunk_request)
            .field("content_length", &self.content_length)
            .field("allow_zero_content_length", &self.allow_zero_content_length)
            .field("extended_logging_data", &self.extended_logging_data)
            .finish()
    }
}
