use anyhow::{Result, Context as AnyhowContext};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use tracing::debug;
use crate::compiler::core::CompilerConfig;
use crate::dsl::{Document, Test};
use crate::environment::Environment;

/// Load a saved test. `.json` files are read as JSON, anything else as YAML.
pub fn load_document(file_path: impl AsRef<Path>) -> Result<Test> {
    let file_path = file_path.as_ref();
    let document: Document = load(file_path)?;
    let test = document
        .into_test()
        .with_context(|| format!("Unsupported document {}", file_path.display()))?;
    debug!("loaded {} root(s) from {}", test.roots.len(), file_path.display());
    Ok(test)
}

pub fn load_environment(file_path: impl AsRef<Path>) -> Result<Environment> {
    load(file_path.as_ref())
}

pub fn load_config(file_path: impl AsRef<Path>) -> Result<CompilerConfig> {
    load(file_path.as_ref())
}

fn load<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let content = fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read file from {}", file_path.display()))?;

    let is_json = file_path.extension().and_then(|ext| ext.to_str()) == Some("json");
    if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to deserialize JSON content from {}", file_path.display()))
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to deserialize YAML content from {}", file_path.display()))
    }
}
