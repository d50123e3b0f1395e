use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub predictor: PredictorConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Endpoint returning the current visitor count as a plain text integer.
    /// No default; the operator must supply it.
    pub endpoint_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PredictorConfig {
    pub model_path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    pub title: String,
    pub capacity: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            title: "TÄFFÄ".to_string(),
            capacity: 200,
        }
    }
}

fn default_request_timeout() -> u64 {
    30
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
