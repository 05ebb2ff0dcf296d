//! Serialization of loaded credentials for injection into an application.
//!
//! Output is stable: map keys are always emitted in sorted order, whatever
//! order the filesystem returned them in.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Supported output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// YAML document
    Yaml,
}

/// Render any loaded map (flattened or scoped) in the given format.
///
/// # Example
///
/// ```
/// use secret_tree::render::{render, OutputFormat};
/// use secret_tree::types::InstanceMap;
///
/// # fn main() -> anyhow::Result<()> {
/// let rendered = render(&InstanceMap::new(), OutputFormat::Json)?;
/// assert_eq!(rendered, "{}");
/// # Ok(())
/// # }
/// ```
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    // serde_json::Value keeps object keys sorted
    let value = serde_json::to_value(value).context("Failed to serialize credentials")?;

    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&value).context("Failed to render JSON output")
        }
        OutputFormat::Yaml => serde_yaml::to_string(&value).context("Failed to render YAML output"),
    }
}

/// Render a single `NAME=<compact json>` environment assignment.
pub fn render_env<T: Serialize>(name: &str, value: &T) -> Result<String> {
    if name.is_empty() || name.contains('=') {
        anyhow::bail!("Invalid environment variable name: '{}'", name);
    }

    let value = serde_json::to_value(value).context("Failed to serialize credentials")?;
    let json = serde_json::to_string(&value).context("Failed to render JSON output")?;

    Ok(format!("{}={}", name, json))
}
