use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Nothing is required: a missing API key only disables generation.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub static_dir: PathBuf,
    pub scores_file: PathBuf,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let data_dir = PathBuf::from(optional_env("DATA_DIR").unwrap_or_else(|| ".".to_string()));
        let static_dir = optional_env("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.clone());
        let scores_file = optional_env("SCORES_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("provocations_scores.json"));

        Ok(Config {
            api_key: api_key_from_env(),
            host: optional_env("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: optional_env("PORT")
                .unwrap_or_else(|| "5001".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            data_dir,
            static_dir,
            scores_file,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

/// `GOOGLE_API_KEY`, falling back to `GEMINI_API_KEY`. Blank values count as unset.
pub fn api_key_from_env() -> Option<String> {
    optional_env("GOOGLE_API_KEY").or_else(|| optional_env("GEMINI_API_KEY"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
