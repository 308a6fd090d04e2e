//! Streams a file to an echo endpoint with progress reporting.
//!
//! Run with: `cargo run --example streaming_upload -- <path>`

use simplerest::{
    Error, JsonStringSerializer, RequestMetadata, ReqwestTransport, RestService, StreamOptions,
    TracingRequestLogger,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("simplerest=debug,streaming_upload=info")
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Cargo.toml".to_string());
    let file = tokio::fs::File::open(&path).await?;

    let service = RestService::builder()
        .transport(ReqwestTransport::new()?)
        .serializer(JsonStringSerializer)
        .logger(Arc::new(TracingRequestLogger::new()))
        .build()?;

    let settings = service
        .default_settings()
        .with_retry_count(1)
        .with_chunk_request(true);
    let options = StreamOptions::new(8 * 1024)
        .max_read_length(1024 * 1024)
        .on_progress(|written| println!("{} bytes sent", written));

    let response = service
        .stream_typed::<serde_json::Value, _>(
            RequestMetadata::post("https://httpbin.org/post").with_query_param("file", &path),
            file,
            options,
            Some(&settings),
        )
        .await?;

    println!("Status: {}", response.status_code());
    if let Some(echo) = &response.data {
        println!("Echoed headers: {}", echo["headers"]);
    }

    Ok(())
}
