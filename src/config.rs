//! Engine configuration.
//!
//! Every field has a default, so an empty YAML document (or no file at all)
//! yields the stock engine.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default debounce interval in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Default ceiling on accepted source size, in characters.
pub const DEFAULT_MAX_SOURCE_CHARS: usize = 100_000;

/// Top-level engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_max_source_chars")]
    pub max_source_chars: usize,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub ai: AiConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            max_source_chars: DEFAULT_MAX_SOURCE_CHARS,
            thresholds: Thresholds::default(),
            ai: AiConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse_str(&content)
    }

    /// Parse a configuration from YAML text. Empty text yields the defaults.
    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: EngineConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    pub fn debounce_interval(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Heuristic thresholds used by the analyzers.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Thresholds {
    /// Functions longer than this many lines are flagged.
    pub max_function_lines: usize,
    /// Complexity estimate above which the quality analyzer reports.
    pub max_complexity: usize,
    /// Complexity estimate above which the performance analyzer reports.
    pub heavy_computation_complexity: usize,
    /// Lines longer than this many characters are flagged by the quality and
    /// performance analyzers.
    pub max_line_length: usize,
    /// Line-length limit for languages without a dedicated rule set.
    pub generic_max_line_length: usize,
    /// Trimmed lines shorter than this are ignored for duplication.
    pub min_duplicate_line_length: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_function_lines: 50,
            max_complexity: 10,
            heavy_computation_complexity: 15,
            max_line_length: 120,
            generic_max_line_length: 100,
            min_duplicate_line_length: 30,
        }
    }
}

/// Settings for the remote completion service.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AiConfig {
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_ms: u64,
    /// Environment variable holding the bearer credential.
    pub api_key_env: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 1000,
            temperature: 0.3,
            timeout_ms: 30_000,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_max_source_chars() -> usize {
    DEFAULT_MAX_SOURCE_CHARS
}

/// Validate a configuration.
pub fn validate(config: &EngineConfig) -> anyhow::Result<()> {
    if config.max_source_chars == 0 {
        anyhow::bail!("max_source_chars must be greater than zero");
    }

    let t = &config.thresholds;
    for (name, value) in [
        ("max_function_lines", t.max_function_lines),
        ("max_complexity", t.max_complexity),
        ("heavy_computation_complexity", t.heavy_computation_complexity),
        ("max_line_length", t.max_line_length),
        ("generic_max_line_length", t.generic_max_line_length),
        ("min_duplicate_line_length", t.min_duplicate_line_length),
    ] {
        if value == 0 {
            anyhow::bail!("thresholds.{} must be greater than zero", name);
        }
    }

    if !(0.0..=2.0).contains(&config.ai.temperature) {
        anyhow::bail!(
            "ai.temperature {} out of range, must be between 0 and 2",
            config.ai.temperature
        );
    }
    if config.ai.endpoint.trim().is_empty() {
        anyhow::bail!("ai.endpoint must not be empty");
    }

    Ok(())
}
