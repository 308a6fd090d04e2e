//! Basic example demonstrating simple GET and POST requests.
//!
//! This example shows how to:
//! - Build a service with a transport, a serializer and a logger
//! - Make GET requests to fetch data
//! - Make POST requests with retries
//! - Inspect the response envelope when a body does not deserialize
//!
//! Run with: `cargo run --example basic_call`

use serde::{Deserialize, Serialize};
use simplerest::{
    Error, JsonStringSerializer, RequestMetadata, ReqwestTransport, RestService,
    TracingRequestLogger,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Post {
    #[serde(rename = "userId")]
    user_id: u32,
    id: u32,
    title: String,
    body: String,
}

#[derive(Debug, Serialize)]
struct NewPost {
    title: String,
    body: String,
    #[serde(rename = "userId")]
    user_id: u32,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("simplerest=debug,basic_call=info")
        .init();

    let service = RestService::builder()
        .transport(ReqwestTransport::new()?)
        .serializer(JsonStringSerializer)
        .logger(Arc::new(TracingRequestLogger::new()))
        .build()?;

    println!("=== GET Request Example ===");
    let response = service
        .get::<Post>("https://jsonplaceholder.typicode.com/posts/1")
        .await?;

    println!("Status: {} {}", response.status_code(), response.status());
    if let Some(post) = &response.data {
        println!("Post ID: {}", post.id);
        println!("Title: {}", post.title);
    }
    println!();

    println!("=== POST Request Example ===");
    let new_post = NewPost {
        title: "My New Post".to_string(),
        body: "This is the content of my new post!".to_string(),
        user_id: 1,
    };

    // Retry twice on anything outside 2xx, a quarter second apart.
    let settings = service
        .default_settings()
        .with_retry_count(2)
        .with_retry_delay(Duration::from_millis(250))
        .with_logging_data("example", "basic_call");

    let response = service
        .call::<_, Post>(
            RequestMetadata::post("https://jsonplaceholder.typicode.com/posts"),
            Some(&new_post),
            Some(&settings),
        )
        .await?;

    match &response.data {
        Some(post) => println!("Created post ID: {}", post.id),
        None => println!("Unexpected reply: {}", response.raw_body()),
    }
    println!();

    println!("=== Accessing Response Metadata ===");
    println!("Raw response length: {} bytes", response.raw_body().len());
    println!("Content-Type: {:?}", response.header("content-type"));
    for header in response.headers().iter().take(5) {
        println!("  {}", header);
    }

    Ok(())
}
