//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where the cart snapshot is kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CartStorageConfig {
    /// One JSON file per key under this directory.
    Directory(PathBuf),
    /// Session-only; nothing survives a restart.
    Memory,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub catalog_base_url: String,
    pub catalog_limit: u32,
    pub page_size: usize,
    pub cart_storage: CartStorageConfig,
    pub allowed_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to keep tests hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        // --- Server Settings ---
        let bind_address_str = var_or("BIND_ADDRESS", "127.0.0.1:3000");
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let allowed_origin = var_or("ALLOWED_ORIGIN", "http://localhost:8081");

        // --- Catalog Settings ---
        let catalog_base_url = var_or("CATALOG_BASE_URL", "https://dummyjson.com")
            .trim_end_matches('/')
            .to_string();
        if catalog_base_url.is_empty() {
            return Err(ConfigError::MissingVar("CATALOG_BASE_URL".to_string()));
        }

        let catalog_limit = parse_positive(&var_or("CATALOG_LIMIT", "100"), "CATALOG_LIMIT")?;
        let page_size = parse_positive(&var_or("PAGE_SIZE", "12"), "PAGE_SIZE")? as usize;

        // --- Cart Storage ---
        let cart_storage = match var_or("CART_STORAGE_DIR", "./data").as_str() {
            "memory" => CartStorageConfig::Memory,
            dir => CartStorageConfig::Directory(PathBuf::from(dir)),
        };

        Ok(Self {
            bind_address,
            log_level,
            catalog_base_url,
            catalog_limit,
            page_size,
            cart_storage,
            allowed_origin,
        })
    }
}

fn parse_positive(raw: &str, name: &str) -> Result<u32, ConfigError> {
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("'{}' is not a positive integer", raw),
        )),
    }
}
