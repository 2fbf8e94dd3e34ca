//! Application configuration

use std::env;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gateway::DEFAULT_MODEL;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Bearer credential for the completion service. Required: without it
    /// the session cannot proceed, so startup fails fast.
    pub xai_api_key: String,
    /// Optional base URL override for the completion endpoint.
    pub xai_base_url: Option<String>,
    pub model: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            xai_api_key: env::var("XAI_API_KEY")
                .map_err(|_| ConfigError::MissingVar("XAI_API_KEY"))?,
            xai_base_url: env::var("XAI_BASE_URL").ok(),
            model: env::var("XAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()),
        })
    }
}
