//! REST service with status-code driven retries and per-attempt logging.
//!
//! The [`RestService`] type is the main entry point for making requests.
//! Use [`RestServiceBuilder`] to inject its collaborators.

use crate::{
    logger::{RequestLogEntry, RequestLogger},
    metadata::RequestMetadata,
    response::{ResponseBuilder, StandardResponseBuilder, TypedResponse},
    retry::RetryLogic,
    serializer::{JsonStringSerializer, StringSerializer},
    settings::RequestSettings,
    stream::{BodyCopier, SharedSource, StreamOptions, STREAM_BODY_PLACEHOLDER},
    transport::{OutboundBody, OutboundRequest, Transport, TransportError},
    url_builder::UrlBuilder,
    Error, Response, Result,
};
use bytes::Bytes;
use http::Method;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::{Instant, SystemTime};
use tokio::io::{AsyncRead, AsyncSeek};
use url::Url;

/// A [`RestService`] bound to JSON bodies.
pub type JsonRestService = RestService<JsonStringSerializer>;

/// A REST client that retries on status codes and logs every attempt.
///
/// The service is bound at construction to one [`StringSerializer`], which
/// decides the default content type and how typed bodies are encoded. It
/// holds no mutable state, so one instance can be cloned and shared freely.
///
/// HTTP-level failures are data: a 404 or a 503 comes back as an ordinary
/// [`Response`] with that status once the retries are used up. Only
/// failures that leave no response at all (connection refused, timeouts,
/// invalid configuration) are returned as [`Error`].
///
/// # Examples
///
/// ```no_run
/// use simplerest::{JsonStringSerializer, RequestSettings, ReqwestTransport, RestService};
/// use serde::{Deserialize, Serialize};
/// use std::time::Duration;
///
/// #[derive(Serialize)]
/// struct CreateUser {
///     name: String,
/// }
///
/// #[derive(Deserialize)]
/// struct User {
///     id: u64,
///     name: String,
/// }
///
/// # async fn example() -> Result<(), simplerest::Error> {
/// let service = RestService::builder()
///     .transport(ReqwestTransport::new()?)
///     .serializer(JsonStringSerializer)
///     .build()?;
///
/// // GET request
/// let user = service.get::<User>("https://api.example.com/users/123").await?;
/// if let Some(user) = &user.data {
///     println!("User: {}", user.name);
/// }
///
/// // POST request with retries
/// let settings = service
///     .default_settings()
///     .with_retry_count(3)
///     .with_retry_delay(Duration::from_millis(200));
/// let created = service
///     .call::<_, User>(
///         simplerest::RequestMetadata::post("https://api.example.com/users"),
///         Some(&CreateUser { name: "Alice".to_string() }),
///         Some(&settings),
///     )
///     .await?;
/// println!("HTTP {}", created.status_code());
/// # Ok(())
/// # }
/// ```
pub struct RestService<S> {
    inner: Arc<ServiceInner<S>>,
}

struct ServiceInner<S> {
    transport: Arc<dyn Transport>,
    serializer: S,
    retry_logic: RetryLogic,
    url_builder: UrlBuilder,
    response_builder: Arc<dyn ResponseBuilder>,
    logger: Option<Arc<dyn RequestLogger>>,
}

impl<S> Clone for RestService<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: StringSerializer> RestService<S> {
    /// Creates a new `RestServiceBuilder`.
    pub fn builder() -> RestServiceBuilder<S> {
        RestServiceBuilder::new()
    }

    /// The settings used when a call passes none: the serializer's media
    /// type for both `Content-Type` and `Accept`, no retries.
    pub fn default_settings(&self) -> RequestSettings {
        RequestSettings::new(self.inner.serializer.content_type())
    }

    /// The serializer this service is bound to.
    pub fn serializer(&self) -> &S {
        &self.inner.serializer
    }

    /// Sends a request with a raw string body.
    ///
    /// Blank bodies are not sent. This is the entry point every other
    /// buffered-body method funnels into.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid configuration, a malformed URL, or a
    /// transport failure that produced no response.
    pub async fn execute(
        &self,
        metadata: RequestMetadata,
        body: Option<&str>,
        settings: Option<&RequestSettings>,
    ) -> Result<Response> {
        let payload = body
            .filter(|text| !text.trim().is_empty())
            .map(|text| Bytes::copy_from_slice(text.as_bytes()));

        let write_body = move || {
            let body = match &payload {
                Some(bytes) => OutboundBody::Buffered(bytes.clone()),
                None => OutboundBody::Empty,
            };
            std::future::ready(Ok::<_, Error>(body))
        };

        self.execute_request(&metadata, settings, body, write_body)
            .await
    }

    /// Serializes `body` with the bound serializer and sends it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the body cannot be encoded, plus
    /// everything [`execute`](Self::execute) can return.
    pub async fn execute_with<B>(
        &self,
        metadata: RequestMetadata,
        body: Option<&B>,
        settings: Option<&RequestSettings>,
    ) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let raw_body = self.inner.serializer.serialize(body)?;
        self.execute(metadata, raw_body.as_deref(), settings).await
    }

    /// Sends a request with a raw string body and deserializes the reply.
    ///
    /// A reply that cannot be deserialized yields `data: None`; the status,
    /// headers and raw body are still returned.
    pub async fn execute_typed<T>(
        &self,
        metadata: RequestMetadata,
        body: Option<&str>,
        settings: Option<&RequestSettings>,
    ) -> Result<TypedResponse<T>>
    where
        T: DeserializeOwned,
    {
        let response = self.execute(metadata, body, settings).await?;
        Ok(self.deserialize(response))
    }

    /// Makes a typed request: serializes `body`, sends it with retries and
    /// deserializes the reply.
    ///
    /// # Type Parameters
    ///
    /// * `B` - The request body type (must implement `Serialize`)
    /// * `T` - The response body type (must implement `DeserializeOwned`)
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use simplerest::{JsonRestService, RequestMetadata};
    /// use serde::{Deserialize, Serialize};
    ///
    /// #[derive(Serialize)]
    /// struct Search { query: String }
    ///
    /// #[derive(Deserialize)]
    /// struct Results { items: Vec<String> }
    ///
    /// # async fn example(service: JsonRestService) -> Result<(), simplerest::Error> {
    /// let metadata = RequestMetadata::post("https://api.example.com/search")
    ///     .with_query_param("limit", "10");
    /// let request = Search { query: "rust".to_string() };
    ///
    /// let response = service.call::<_, Results>(metadata, Some(&request), None).await?;
    /// match &response.data {
    ///     Some(results) => println!("Found {} results", results.items.len()),
    ///     None => println!("HTTP {}: {}", response.status_code(), response.raw_body()),
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn call<B, T>(
        &self,
        metadata: RequestMetadata,
        body: Option<&B>,
        settings: Option<&RequestSettings>,
    ) -> Result<TypedResponse<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.execute_with(metadata, body, settings).await?;
        Ok(self.deserialize(response))
    }

    /// Sends a body read from `source`.
    ///
    /// The source is read in `options.buffer_size` chunks. With
    /// `settings.chunk_request` or a non-zero `options.max_read_length`, the
    /// chunks are handed to the transport as they are read (chunked
    /// transfer); otherwise the body is collected first and sent with a
    /// content length. Every attempt reads from where the source started, so
    /// retries resend the same bytes; a body still held by the transport from
    /// an earlier attempt stops reading once a retry begins.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] for a zero buffer size and
    /// [`Error::Io`] if the source cannot be read or rewound, plus
    /// everything [`execute`](Self::execute) can return.
    pub async fn stream<R>(
        &self,
        metadata: RequestMetadata,
        source: R,
        options: StreamOptions,
        settings: Option<&RequestSettings>,
    ) -> Result<Response>
    where
        R: AsyncRead + AsyncSeek + Unpin + Send + 'static,
    {
        if options.buffer_size == 0 {
            return Err(Error::ConfigurationError(
                "Stream buffer size must be greater than zero".to_string(),
            ));
        }

        let source = Arc::new(SharedSource::new(source).await?);
        let chunked = settings.is_some_and(|s| s.chunk_request) || options.is_capped();

        let write_body = move || {
            let source = Arc::clone(&source);
            let generation = source.next_generation();
            let copier = BodyCopier::new(&options);
            async move {
                let body = if chunked {
                    OutboundBody::Streaming(copier.into_stream(source, generation))
                } else {
                    OutboundBody::Buffered(source.read_all(generation, copier).await?)
                };
                Ok::<_, Error>(body)
            }
        };

        self.execute_request(&metadata, settings, Some(STREAM_BODY_PLACEHOLDER), write_body)
            .await
    }

    /// Like [`stream`](Self::stream), then deserializes the reply.
    pub async fn stream_typed<T, R>(
        &self,
        metadata: RequestMetadata,
        source: R,
        options: StreamOptions,
        settings: Option<&RequestSettings>,
    ) -> Result<TypedResponse<T>>
    where
        T: DeserializeOwned,
        R: AsyncRead + AsyncSeek + Unpin + Send + 'static,
    {
        let response = self.stream(metadata, source, options, settings).await?;
        Ok(self.deserialize(response))
    }

    /// Makes a GET request with default settings.
    pub async fn get<T>(&self, url: impl Into<String>) -> Result<TypedResponse<T>>
    where
        T: DeserializeOwned,
    {
        self.execute_typed(RequestMetadata::new(Method::GET, url), None, None)
            .await
    }

    /// Makes a POST request with a serialized body and default settings.
    pub async fn post<B, T>(&self, url: impl Into<String>, body: &B) -> Result<TypedResponse<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call(RequestMetadata::new(Method::POST, url), Some(body), None)
            .await
    }

    /// Makes a PUT request with a serialized body and default settings.
    pub async fn put<B, T>(&self, url: impl Into<String>, body: &B) -> Result<TypedResponse<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call(RequestMetadata::new(Method::PUT, url), Some(body), None)
            .await
    }

    /// Makes a DELETE request with default settings.
    pub async fn delete<T>(&self, url: impl Into<String>) -> Result<TypedResponse<T>>
    where
        T: DeserializeOwned,
    {
        self.execute_typed(RequestMetadata::new(Method::DELETE, url), None, None)
            .await
    }

    /// Makes a PATCH request with a serialized body and default settings.
    pub async fn patch<B, T>(&self, url: impl Into<String>, body: &B) -> Result<TypedResponse<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call(RequestMetadata::new(Method::PATCH, url), Some(body), None)
            .await
    }

    /// Resolves settings, builds the URL and runs the attempts under the
    /// retry logic.
    async fn execute_request<F, Fut>(
        &self,
        metadata: &RequestMetadata,
        settings: Option<&RequestSettings>,
        request_body: Option<&str>,
        write_body: F,
    ) -> Result<Response>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<OutboundBody>>,
    {
        let defaults;
        let settings = match settings {
            Some(settings) => settings,
            None => {
                defaults = self.default_settings();
                &defaults
            }
        };

        settings.validate()?;
        metadata.validate()?;

        let url = self.inner.url_builder.build_url(
            &metadata.url,
            metadata
                .query_params
                .iter()
                .map(|(key, value)| (key.as_str(), value.as_str())),
        )?;

        let url = &url;
        let write_body = &write_body;
        let mut attempt = 0;

        self.inner
            .retry_logic
            .execute(
                move || {
                    attempt += 1;
                    self.attempt(metadata, url, settings, request_body, write_body, attempt)
                },
                &settings.non_success_codes_to_treat_as_success,
                settings.retry_count,
                settings.retry_delay,
            )
            .await
    }

    /// Sends one attempt, then logs it and runs the matching response action.
    async fn attempt<F, Fut>(
        &self,
        metadata: &RequestMetadata,
        url: &Url,
        settings: &RequestSettings,
        request_body: Option<&str>,
        write_body: &F,
        attempt: u32,
    ) -> Result<Response>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<OutboundBody>>,
    {
        let started_at = SystemTime::now();
        let timer = Instant::now();

        tracing::debug!(
            method = %metadata.method,
            url = %url,
            attempt = attempt,
            "Executing HTTP request"
        );

        let body = write_body().await?;
        let content_length = match &body {
            OutboundBody::Empty => settings.explicit_content_length(),
            OutboundBody::Buffered(bytes) => Some(bytes.len() as u64),
            OutboundBody::Streaming(_) => None,
        };

        let request = OutboundRequest {
            method: metadata.method.clone(),
            url: url.clone(),
            headers: metadata.headers.clone(),
            content_type: non_empty(&settings.content_type),
            accept: non_empty(&settings.accept),
            content_length,
            timeout: settings.timeout,
            user_agent: settings.user_agent.clone(),
            credentials: settings.credentials.clone(),
            body,
        };

        let response = match self.inner.transport.send(request).await {
            Ok(raw) => self.inner.response_builder.build(raw, false),
            Err(TransportError::Status(raw)) => self.inner.response_builder.build(raw, true),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    method = %metadata.method,
                    url = %url,
                    "Request failed without a response"
                );
                return Err(e.into());
            }
        };
        let finished_at = SystemTime::now();

        tracing::info!(
            status = response.status_code().as_u16(),
            latency_ms = timer.elapsed().as_millis(),
            attempt = attempt,
            "Received HTTP response"
        );

        if let Some(logger) = &self.inner.logger {
            logger.log(&RequestLogEntry {
                method: &metadata.method,
                url,
                request_headers: &metadata.headers,
                request_body,
                response: &response,
                started_at,
                finished_at,
                extended_data: &settings.extended_logging_data,
            });
        }

        if let Some(action) = settings.response_actions.get(&response.status_code()) {
            action(&response);
        }

        Ok(response)
    }

    fn deserialize<T>(&self, response: Response) -> TypedResponse<T>
    where
        T: DeserializeOwned,
    {
        let data = match self.inner.serializer.deserialize(response.raw_body()) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!(
                    error = %e,
                    status = response.status_code().as_u16(),
                    "Failed to deserialize response body"
                );
                None
            }
        };
        TypedResponse::new(response, data)
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Builder for configuring and creating a [`RestService`].
///
/// Transport and serializer are required. Retry logic, URL builder and
/// response builder fall back to [`RetryLogic`], [`UrlBuilder`] and
/// [`StandardResponseBuilder`] when not set; the logger is optional.
///
/// # Examples
///
/// ```no_run
/// use simplerest::{
///     JsonStringSerializer, ReqwestTransport, RestServiceBuilder, RetryLogic,
///     TracingRequestLogger, UrlBuilder,
/// };
/// use std::sync::Arc;
///
/// # fn example() -> Result<(), simplerest::Error> {
/// let service = RestServiceBuilder::new()
///     .transport(ReqwestTransport::new()?)
///     .serializer(JsonStringSerializer)
///     .retry_logic(RetryLogic::new())
///     .url_builder(UrlBuilder::new())
///     .logger(Arc::new(TracingRequestLogger::new()))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct RestServiceBuilder<S> {
    transport: Option<Arc<dyn Transport>>,
    serializer: Option<S>,
    retry_logic: Option<RetryLogic>,
    url_builder: Option<UrlBuilder>,
    response_builder: Option<Arc<dyn ResponseBuilder>>,
    logger: Option<Arc<dyn RequestLogger>>,
}

impl<S: StringSerializer> RestServiceBuilder<S> {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            transport: None,
            serializer: None,
            retry_logic: None,
            url_builder: None,
            response_builder: None,
            logger: None,
        }
    }

    /// Sets the transport used for every attempt.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Sets the serializer the service is bound to.
    pub fn serializer(mut self, serializer: S) -> Self {
        self.serializer = Some(serializer);
        self
    }

    /// Sets the retry logic.
    pub fn retry_logic(mut self, retry_logic: RetryLogic) -> Self {
        self.retry_logic = Some(retry_logic);
        self
    }

    /// Sets the URL builder.
    pub fn url_builder(mut self, url_builder: UrlBuilder) -> Self {
        self.url_builder = Some(url_builder);
        self
    }

    /// Sets the strategy that turns transport replies into responses.
    pub fn response_builder(mut self, response_builder: impl ResponseBuilder + 'static) -> Self {
        self.response_builder = Some(Arc::new(response_builder));
        self
    }

    /// Sets the per-attempt request logger.
    pub fn logger(mut self, logger: Arc<dyn RequestLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Builds the configured `RestService`.
    ///
    /// # Errors
    ///
    /// Returns an error if no transport or no serializer was provided.
    pub fn build(self) -> Result<RestService<S>> {
        let transport = self
            .transport
            .ok_or_else(|| Error::ConfigurationError("Transport is required".to_string()))?;
        let serializer = self
            .serializer
            .ok_or_else(|| Error::ConfigurationError("Serializer is required".to_string()))?;

        Ok(RestService {
            inner: Arc::new(ServiceInner {
                transport,
                serializer,
                retry_logic: self.retry_logic.unwrap_or_default(),
                url_builder: self.url_builder.unwrap_or_default(),
                response_builder: self
                    .response_builder
                    .unwrap_or_else(|| Arc::new(StandardResponseBuilder)),
                logger: self.logger,
            }),
        })
    }
}

impl<S: StringSerializer> Default for RestServiceBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}
