//! # simplerest - A retrying REST client
//!
//! simplerest wraps a single HTTP request/response exchange in a small policy
//! layer: it builds the URL, encodes the body through a pluggable serializer,
//! retries on status codes, logs every attempt and hands back a uniform
//! response envelope. HTTP-level failures (404, 503, ...) are returned as
//! data, not errors.
//!
//! ## Quick Start
//!
//! ```no_run
//! use simplerest::{JsonStringSerializer, RequestMetadata, ReqwestTransport, RestService};
//! use serde::{Deserialize, Serialize};
//! use std::time::Duration;
//!
//! #[derive(Serialize)]
//! struct CreateUser {
//!     name: String,
//!     email: String,
//! }
//!
//! #[derive(Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), simplerest::Error> {
//!     let service = RestService::builder()
//!         .transport(ReqwestTransport::new()?)
//!         .serializer(JsonStringSerializer)
//!         .build()?;
//!
//!     // Retry up to three times; a 404 is a final answer.
//!     let settings = service
//!         .default_settings()
//!         .with_retry_count(3)
//!         .with_retry_delay(Duration::from_millis(250))
//!         .with_success_code(http::StatusCode::NOT_FOUND);
//!
//!     let user = service
//!         .execute_typed::<User>(
//!             RequestMetadata::get("https://api.example.com/users/123"),
//!             None,
//!             Some(&settings),
//!         )
//!         .await?;
//!
//!     match &user.data {
//!         Some(user) => println!("User: {}", user.name),
//!         None => println!("HTTP {}: {}", user.status_code(), user.raw_body()),
//!     }
//!
//!     let new_user = CreateUser {
//!         name: "Alice".to_string(),
//!         email: "alice@example.com".to_string(),
//!     };
//!     let created = service
//!         .post::<_, User>("https://api.example.com/users", &new_user)
//!         .await?;
//!     println!("Created: {:?}", created.data.map(|u| u.id));
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Uniform responses** - status, ordered headers and raw body for every reply, 4xx/5xx included
//! - **Typed bodies** - request and response bodies through a [`StringSerializer`] (JSON built in)
//! - **Status-code retries** - fixed count and delay, extra codes can count as success
//! - **Per-attempt hooks** - a [`RequestLogger`] record and a per-status response action after every attempt
//! - **Streaming uploads** - chunked bodies with progress reporting and a length cap
//! - **Pluggable transport** - [`Transport`] trait with a `reqwest` implementation
//!
//! ## Error Handling
//!
//! ```no_run
//! use simplerest::{Error, JsonRestService, RequestMetadata};
//!
//! # async fn example(service: JsonRestService) {
//! match service.execute(RequestMetadata::get("https://api.example.com/x"), None, None).await {
//!     Ok(response) if response.is_success() => println!("{}", response.raw_body()),
//!     Ok(response) => eprintln!("HTTP {}", response.status_code()),
//!     Err(Error::Transport(e)) => eprintln!("No response: {}", e),
//!     Err(e) => eprintln!("Not sent: {}", e),
//! }
//! # }
//! ```

mod error;
pub mod header;
pub mod logger;
pub mod metadata;
pub mod response;
pub mod retry;
pub mod serializer;
mod service;
pub mod settings;
pub mod stream;
pub mod transport;
mod url_builder;

pub use error::{Error, Result};
pub use header::HttpHeader;
pub use http::Method as HttpMethod;
pub use logger::{RequestLogEntry, RequestLogger, TracingRequestLogger};
pub use metadata::RequestMetadata;
pub use response::{Response, ResponseBuilder, StandardResponseBuilder, TypedResponse};
pub use retry::{RetryLogic, Retryable};
pub use serializer::{JsonStringSerializer, SerializationError, StringSerializer};
pub use service::{JsonRestService, RestService, RestServiceBuilder};
pub use settings::{Credentials, RequestSettings, ResponseAction};
pub use stream::{ProgressCallback, StreamOptions};
pub use transport::{
    OutboundBody, OutboundRequest, RawResponse, ReqwestTransport, Transport, TransportError,
};
pub use url_builder::UrlBuilder;
