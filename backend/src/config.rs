use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::services::plan_analyzer::AnalyzerLimits;
use crate::services::plan_analyzer::parser::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_LINES};

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub analyzer: AnalyzerConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

/// Input bounds for the plan analyzer (loaded from conf/config.toml)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Maximum plan lines accepted (default: 10k)
    #[serde(deserialize_with = "deserialize_count")]
    pub max_lines: usize,
    /// Maximum operator nesting depth (default: 128)
    #[serde(deserialize_with = "deserialize_count")]
    pub max_depth: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print JSON reports
    pub pretty: bool,
}

impl Config {
    /// Load configuration with environment variable override support
    ///
    /// Loading order:
    /// 1. Load from config.toml file
    /// 2. Override with environment variables (prefixed with APP_)
    /// 3. Validate the final configuration
    pub fn load() -> Result<Self, anyhow::Error> {
        // 1. Load from config file
        let mut config = if let Some(config_path) = Self::find_config_file() {
            Self::from_toml(&config_path)?
        } else {
            tracing::debug!("Configuration file not found, using defaults");
            Config::default()
        };

        // 2. Override with environment variables
        config.apply_env_overrides();

        // 3. Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Limits handed to the plan analyzer
    pub fn analyzer_limits(&self) -> AnalyzerLimits {
        AnalyzerLimits { max_lines: self.analyzer.max_lines, max_depth: self.analyzer.max_depth }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - APP_LOG_LEVEL: Logging level (e.g., "info,plan_insight=debug")
    /// - APP_LOG_FILE: Log file path; empty disables file logging
    /// - APP_ANALYZER_MAX_LINES: Maximum plan lines (accepts "10000", "10k")
    /// - APP_ANALYZER_MAX_DEPTH: Maximum nesting depth (accepts "128")
    /// - APP_OUTPUT_PRETTY: Pretty-print JSON output (true/false)
    fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("APP_LOG_LEVEL") {
            self.logging.level = level;
            tracing::info!("Override logging.level from env: {}", self.logging.level);
        }

        if let Ok(file) = std::env::var("APP_LOG_FILE") {
            self.logging.file = (!file.is_empty()).then_some(file);
            tracing::info!("Override logging.file from env: {:?}", self.logging.file);
        }

        if let Ok(lines) = std::env::var("APP_ANALYZER_MAX_LINES") {
            match parse_count(&lines) {
                Ok(val) => {
                    self.analyzer.max_lines = val;
                    tracing::info!("Override analyzer.max_lines from env: {}", val);
                },
                Err(e) => tracing::warn!(
                    "Invalid APP_ANALYZER_MAX_LINES '{}': {} (keep {})",
                    lines,
                    e,
                    self.analyzer.max_lines
                ),
            }
        }

        if let Ok(depth) = std::env::var("APP_ANALYZER_MAX_DEPTH") {
            match parse_count(&depth) {
                Ok(val) => {
                    self.analyzer.max_depth = val;
                    tracing::info!("Override analyzer.max_depth from env: {}", val);
                },
                Err(e) => tracing::warn!(
                    "Invalid APP_ANALYZER_MAX_DEPTH '{}': {} (keep {})",
                    depth,
                    e,
                    self.analyzer.max_depth
                ),
            }
        }

        if let Ok(pretty) = std::env::var("APP_OUTPUT_PRETTY")
            && let Ok(val) = pretty.parse()
        {
            self.output.pretty = val;
            tracing::info!("Override output.pretty from env: {}", self.output.pretty);
        }
    }

    /// Validate configuration
    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.analyzer.max_lines == 0 {
            anyhow::bail!("analyzer.max_lines must be > 0");
        }
        if self.analyzer.max_depth == 0 {
            anyhow::bail!("analyzer.max_depth must be > 0");
        }
        if self.logging.level.trim().is_empty() {
            anyhow::bail!("logging.level cannot be empty");
        }

        Ok(())
    }

    fn find_config_file() -> Option<String> {
        let possible_paths =
            ["conf/config.toml", "config.toml", "./conf/config.toml", "./config.toml"];

        for path in &possible_paths {
            if Path::new(path).exists() {
                return Some(path.to_string());
            }
        }
        None
    }

    fn from_toml(path: &str) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "warn,plan_insight=info".to_string(), file: None }
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self { max_lines: DEFAULT_MAX_LINES, max_depth: DEFAULT_MAX_DEPTH }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

// =========================
// Helpers for parsing values
// =========================

fn parse_count(input: &str) -> Result<usize, String> {
    // Accept plain numbers
    if let Ok(val) = input.trim().parse::<usize>() {
        return Ok(val);
    }

    let s = input.trim().to_lowercase();
    let (num_str, unit) = s.split_at(s.chars().take_while(|c| c.is_ascii_digit()).count());
    if num_str.is_empty() || unit.is_empty() {
        return Err("missing number or unit".into());
    }
    let n: usize = num_str.parse().map_err(|_| "invalid number".to_string())?;
    let multiplier = match unit {
        "k" => 1_000,
        "m" => 1_000_000,
        _ => return Err(format!("unsupported unit: {}", unit)),
    };
    n.checked_mul(multiplier).ok_or_else(|| "value too large".to_string())
}

// Custom serde deserializer to support numeric or human-friendly string values
fn deserialize_count<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct Visitor;
    impl<'de> serde::de::Visitor<'de> for Visitor {
        type Value = usize;
        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a count or a string like '500', '10k', '1m'")
        }
        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            usize::try_from(v).map_err(E::custom)
        }
        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            usize::try_from(v).map_err(|_| E::custom("negative not allowed"))
        }
        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            parse_count(v).map_err(E::custom)
        }
        fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            parse_count(&v).map_err(E::custom)
        }
    }
    deserializer.deserialize_any(Visitor)
}
