//! Print the OpenAPI document as pretty JSON, for client generation.

use anyhow::Context;
use game_shelf_back::services::documentation::ApiDoc;
use utoipa::OpenApi;

fn main() -> anyhow::Result<()> {
    let doc = ApiDoc::openapi()
        .to_pretty_json()
        .context("serialising OpenAPI document")?;
    println!("{doc}");
    Ok(())
}
