/// Configuration management for Engagement Service
///
/// This module handles loading and managing configuration from environment variables.
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Engagement engine configuration
    pub engagement: EngagementConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
    /// Connections kept open while idle
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
}

/// Which `EntityStore` implementation backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

/// Engagement engine configuration (paging, leaderboards, author fallback)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
    /// Entries per dashboard leaderboard
    pub leaderboard_size: usize,
    /// Display name used when a post or comment author cannot be resolved
    pub placeholder_author_name: String,
    pub placeholder_avatar: String,
    pub store: StoreBackend,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
            leaderboard_size: 10,
            placeholder_author_name: "Unknown".to_string(),
            placeholder_avatar: "dummy.svg".to_string(),
            store: StoreBackend::Postgres,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let defaults = EngagementConfig::default();

        let engagement = EngagementConfig {
            default_page_size: parse_env_or_default(
                "ENGAGEMENT_DEFAULT_PAGE_SIZE",
                defaults.default_page_size,
            )?,
            max_page_size: parse_env_or_default("ENGAGEMENT_MAX_PAGE_SIZE", defaults.max_page_size)?,
            leaderboard_size: parse_env_or_default(
                "ENGAGEMENT_LEADERBOARD_SIZE",
                defaults.leaderboard_size,
            )?,
            placeholder_author_name: std::env::var("ENGAGEMENT_PLACEHOLDER_AUTHOR")
                .unwrap_or(defaults.placeholder_author_name),
            placeholder_avatar: std::env::var("ENGAGEMENT_PLACEHOLDER_AVATAR")
                .unwrap_or(defaults.placeholder_avatar),
            store: parse_env_or_default("ENGAGEMENT_STORE", defaults.store)?,
        };
        engagement.validate()?;

        Ok(Config {
            app: AppConfig {
                env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                host: std::env::var("ENGAGEMENT_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("ENGAGEMENT_SERVICE_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8085),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/engagement".to_string()),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(10),
                min_connections: std::env::var("DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(1),
                connect_timeout_secs: std::env::var("DATABASE_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(10),
            },
            engagement,
        })
    }
}

impl EngagementConfig {
    fn validate(&self) -> Result<(), String> {
        if self.default_page_size == 0 {
            return Err("ENGAGEMENT_DEFAULT_PAGE_SIZE must be at least 1".to_string());
        }
        if self.max_page_size < self.default_page_size {
            return Err(
                "ENGAGEMENT_MAX_PAGE_SIZE must not be below ENGAGEMENT_DEFAULT_PAGE_SIZE"
                    .to_string(),
            );
        }
        if self.leaderboard_size == 0 {
            return Err("ENGAGEMENT_LEADERBOARD_SIZE must be at least 1".to_string());
        }
        Ok(())
    }
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "ENGAGEMENT_DEFAULT_PAGE_SIZE",
        "ENGAGEMENT_MAX_PAGE_SIZE",
        "ENGAGEMENT_LEADERBOARD_SIZE",
        "ENGAGEMENT_STORE",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = Config::from_env().unwrap();
        assert_eq!(config.engagement.leaderboard_size, 10);
        assert_eq!(config.engagement.placeholder_avatar, "dummy.svg");
        assert_eq!(config.engagement.store, StoreBackend::Postgres);
    }

    #[test]
    #[serial]
    fn test_store_backend_from_env() {
        clear_env();
        std::env::set_var("ENGAGEMENT_STORE", "Memory");
        let config = Config::from_env().unwrap();
        assert_eq!(config.engagement.store, StoreBackend::Memory);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_values_are_rejected() {
        clear_env();
        std::env::set_var("ENGAGEMENT_DEFAULT_PAGE_SIZE", "ten");
        let err = Config::from_env().unwrap_err();
        assert!(err.contains("ENGAGEMENT_DEFAULT_PAGE_SIZE"));

        std::env::set_var("ENGAGEMENT_DEFAULT_PAGE_SIZE", "0");
        assert!(Config::from_env().is_err());

        clear_env();
        std::env::set_var("ENGAGEMENT_LEADERBOARD_SIZE", "0");
        assert!(Config::from_env().is_err());
        clear_env();
    }
}
