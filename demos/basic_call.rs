//! Basic example demonstrating requests with timing breakdowns.
//!
//! This example shows how to:
//! - Send GET requests with query parameters
//! - Send form, multipart and JSON bodies
//! - Read the timeline, status and replayable command of a response
//!
//! Run with: `cargo run --example basic_call`

use curlstat::{Client, Error, FileAttachment, RequestSpec};
use serde_json::json;

fn main() -> Result<(), Error> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("curlstat=debug,basic_call=info")
        .init();

    let client = Client::builder().build();
    let base_url = "https://httpbin.org";

    println!("=== GET with query parameters ===");
    let spec = RequestSpec::builder(format!("{}/get", base_url))
        .query("name", "Django")
        .build();
    let record = client.send(&spec)?;
    println!("{}", record.timeline);
    println!("Status: {}", record.status);
    println!("Command: {}", record.command);
    println!();

    println!("=== POST form with file upload ===");
    let spec = RequestSpec::builder(format!("{}/post", base_url))
        .method("post")
        .form("name", "GGBond")
        .form("ages", vec!["1", "3"])
        .file(FileAttachment::new("file", "Cargo.toml").with_media_type("text/plain"))
        .build();
    let record = client.send(&spec)?;
    println!("{}", record.timeline);
    println!("Command: {}", record.command);
    println!();

    println!("=== POST JSON ===");
    let spec = RequestSpec::builder(format!("{}/post", base_url))
        .method("post")
        .json(json!({"name": "22"}))
        .build();
    let record = client.send(&spec)?;
    let echoed: serde_json::Value = record.json()?;
    println!("Echoed JSON: {}", echoed["json"]);
    println!("Content-Type: {:?}", record.header("content-type"));

    if let Some(err) = record.process_error() {
        println!("curl reported a failure: {}", err);
    }

    Ok(())
}
