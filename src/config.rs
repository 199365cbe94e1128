use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

pub const API_BASE_URL_ENV: &str = "CHAT_API_BASE_URL";
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
const CHAT_PATH: &str = "/api/chat";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_base_url: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let api_base_url = std::env::var(API_BASE_URL_ENV)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        Ok(Self { api_base_url })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            bail!(
                "Invalid {} '{}': expected http:// or https:// URL",
                API_BASE_URL_ENV,
                self.api_base_url
            );
        }
        Ok(())
    }

    pub fn chat_url(&self) -> String {
        format!("{}{CHAT_PATH}", self.api_base_url.trim_end_matches('/'))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}
