//! services/dashboard/src/bin/openapi.rs
//!
//! Writes the dashboard's OpenAPI document to disk so client code can be
//! generated without starting the server.
//!
//! Usage: `openapi [OUTPUT]`, where OUTPUT defaults to `openapi.json`.

use dashboard_lib::{error::ApiError, web::ApiDoc};
use std::path::PathBuf;
use utoipa::OpenApi;

const DEFAULT_OUTPUT: &str = "openapi.json";

fn main() -> Result<(), ApiError> {
    let output = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    let spec = ApiDoc::openapi();
    let document = serde_json::to_string_pretty(&spec)?;
    std::fs::write(&output, document)?;

    let paths = spec.paths.paths.len();
    println!("Wrote {} paths to {}", paths, output.display());
    Ok(())
}
