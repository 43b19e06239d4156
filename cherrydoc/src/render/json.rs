//! JSON renderer — structured output for tooling integration.
//!
//! Serializes the scan result as-is, so consumers can deserialize it back
//! into `cherry_syntax::ScanOutput`.

use crate::render::Renderer;
use anyhow::{Context, Result};
use cherry_syntax::ScanOutput;

pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, file: &str, out: &ScanOutput) -> Result<String> {
        let mut json = serde_json::to_string_pretty(out)
            .with_context(|| format!("failed to serialize {}", file))?;
        json.push('\n');
        Ok(json)
    }

    fn file_extension(&self) -> &str {
        "json"
    }
}
