//! Configuration management
//!
//! Stores pipeline knobs in ~/.config/patchwright/config.json. Credentials
//! are never written to disk; they come from the environment. The loaded
//! config is passed into each component's constructor; there is no
//! process-wide mutable state.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Identifier recorded as `model_name_or_path` in the prediction log.
    #[serde(default = "default_generator_id")]
    pub generator_id: String,
    /// Approximate token budget per directory-description chunk.
    #[serde(default = "default_chunk_token_limit")]
    pub chunk_token_limit: usize,
    /// Average characters per token used for budget estimates.
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: f64,
    /// Iteration ceiling for the edit/syntax-check convergence loop.
    #[serde(default = "default_max_fix_iterations")]
    pub max_fix_iterations: usize,
    /// Delay between fix rounds, to respect external rate limits.
    #[serde(default = "default_fix_round_delay_secs")]
    pub fix_round_delay_secs: u64,
    /// Per-request timeout for external text-generation calls.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_generator_id() -> String {
    "patchwright".to_string()
}

fn default_chunk_token_limit() -> usize {
    512
}

fn default_chars_per_token() -> f64 {
    4.0
}

fn default_max_fix_iterations() -> usize {
    5
}

fn default_fix_round_delay_secs() -> u64 {
    60
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for Config {
    fn default() -> Self {
        Config {
            generator_id: default_generator_id(),
            chunk_token_limit: default_chunk_token_limit(),
            chars_per_token: default_chars_per_token(),
            max_fix_iterations: default_max_fix_iterations(),
            fix_round_delay_secs: default_fix_round_delay_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("patchwright"))
    }

    fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.json"))
    }

    /// Load config from disk, or return defaults.
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if let Ok(content) = fs::read_to_string(&path) {
                match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(err) => {
                        preserve_corrupt_config(&path, &content);
                        eprintln!(
                            "  Warning: Config file was corrupted ({err}). A backup was saved and defaults were loaded."
                        );
                    }
                }
            }
        }
        Self::default()
    }

    /// Save config to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        let dir = Self::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        fs::create_dir_all(&dir)?;
        let content = serde_json::to_string_pretty(self)?;
        fs::write(dir.join("config.json"), content)?;
        Ok(())
    }

    /// OpenRouter API key, environment only.
    pub fn openrouter_api_key() -> Option<String> {
        std::env::var("OPENROUTER_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
    }

    /// GitHub token used for issue metadata fetches.
    pub fn github_token() -> Option<String> {
        std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty())
    }
}

fn preserve_corrupt_config(path: &std::path::Path, content: &str) {
    let corrupt_path = path.with_extension("json.corrupt");
    if fs::rename(path, &corrupt_path).is_err() {
        let _ = fs::write(&corrupt_path, content);
    }
}
