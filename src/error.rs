//! Error types for REST calls.
//!
//! Only failures that leave the caller without an HTTP response are errors.
//! A 404 or a 503 is returned as an ordinary [`Response`](crate::Response)
//! so that status, headers and body stay inspectable; see
//! [`RestService`](crate::RestService) for the full contract.

use crate::serializer::SerializationError;
use crate::transport::TransportError;

/// The main error type for REST calls.
///
/// # Examples
///
/// ```no_run
/// use simplerest::{
///     Error, JsonStringSerializer, ReqwestTransport, RequestMetadata, RestService,
/// };
///
/// # async fn example() -> Result<(), Error> {
/// let service = RestService::builder()
///     .transport(ReqwestTransport::new()?)
///     .serializer(JsonStringSerializer)
///     .build()?;
///
/// match service
///     .execute(RequestMetadata::get("https://api.example.com/items"), None, None)
///     .await
/// {
///     Ok(response) => println!("HTTP {}: {}", response.status_code(), response.raw_body()),
///     Err(e) if e.is_connection_failure() => eprintln!("Could not reach the server: {}", e),
///     Err(e) => eprintln!("Request was not sent: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The transport failed without producing a response.
    ///
    /// Connection refused, DNS failures and timeouts end up here. These are
    /// never retried.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The request body could not be serialized.
    #[error("Failed to serialize request: {0}")]
    Serialization(#[from] SerializationError),

    /// Invalid configuration was provided.
    ///
    /// Raised before any network activity, for example when a header value
    /// contains control characters or a required collaborator is missing.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// An invalid URL was provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The streaming body source could not be read or rewound.
    #[error("Failed to read request body: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` if the transport could not complete the exchange at all.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            Error::Transport(TransportError::Connection(_) | TransportError::Timeout)
        )
    }

    /// Returns `true` if the call was rejected before touching the network.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Error::ConfigurationError(_) | Error::InvalidUrl(_))
    }
}

/// A specialized `Result` type for REST calls.
pub type Result<T> = std::result::Result<T, Error>;
