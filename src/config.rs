use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::chat::provider_names;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub content: ContentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContentConfig {
    /// Root of the collection tree (e.g. `public/content`).
    pub root: PathBuf,
    /// Collection names to index, each a directory under `root`.
    pub collections: Vec<String>,
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_extension() -> String {
    "md".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    /// Directory where lookup files land (`<dir>/<collection>.json`).
    pub dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Empty string selects the provider's first available model.
    #[serde(default)]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// OpenRouter attribution headers.
    #[serde(default)]
    pub referer: String,
    #[serde(default = "default_chat_title")]
    pub title: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: String::new(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            referer: String::new(),
            title: default_chat_title(),
        }
    }
}

fn default_provider() -> String {
    "openrouter".to_string()
}
fn default_max_tokens() -> u32 {
    4000
}
fn default_temperature() -> f64 {
    0.7
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_chat_title() -> String {
    "Folio Chat".to_string()
}

impl Config {
    /// Config rooted at an explicit content tree. Used by tests and by
    /// callers that do not need the chat surface.
    pub fn for_content_tree(root: &Path, output_dir: &Path, collections: &[&str]) -> Self {
        Self {
            content: ContentConfig {
                root: root.to_path_buf(),
                collections: collections.iter().map(|s| s.to_string()).collect(),
                extension: default_extension(),
            },
            output: OutputConfig {
                dir: output_dir.to_path_buf(),
            },
            chat: ChatConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate content
    if config.content.collections.is_empty() {
        anyhow::bail!("content.collections must name at least one collection");
    }
    if config.content.extension.is_empty() {
        anyhow::bail!("content.extension must not be empty");
    }

    // Validate chat
    if config.chat.max_tokens == 0 {
        anyhow::bail!("chat.max_tokens must be >= 1");
    }
    if !(0.0..=2.0).contains(&config.chat.temperature) {
        anyhow::bail!("chat.temperature must be in [0.0, 2.0]");
    }
    let known = provider_names();
    if !known.contains(&config.chat.provider.as_str()) {
        anyhow::bail!(
            "Unknown chat provider: '{}'. Must be one of: {}",
            config.chat.provider,
            known.join(", ")
        );
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(body: &str) -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("folio.toml");
        fs::write(&path, body).unwrap();
        (tmp, path)
    }

    #[test]
    fn minimal_config_gets_chat_defaults() {
        let (_tmp, path) = write_config(
            r#"
[content]
root = "public/content"
collections = ["publications", "talks"]

[output]
dir = "public/data"
"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.content.extension, "md");
        assert_eq!(config.chat.provider, "openrouter");
        assert_eq!(config.chat.max_tokens, 4000);
        assert!((config.chat.temperature - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_collections_rejected() {
        let (_tmp, path) = write_config(
            r#"
[content]
root = "content"
collections = []

[output]
dir = "data"
"#,
        );
        let err = load_config(&path).unwrap_err().to_string();
        assert!(err.contains("collections"));
    }

    #[test]
    fn unknown_provider_rejected() {
        let (_tmp, path) = write_config(
            r#"
[content]
root = "content"
collections = ["talks"]

[output]
dir = "data"

[chat]
provider = "mystery"
"#,
        );
        let err = load_config(&path).unwrap_err().to_string();
        assert!(err.contains("Unknown chat provider"));
    }

    #[test]
    fn out_of_range_temperature_rejected() {
        let (_tmp, path) = write_config(
            r#"
[content]
root = "content"
collections = ["talks"]

[output]
dir = "data"

[chat]
temperature = 3.5
"#,
        );
        assert!(load_config(&path).is_err());
    }
}
