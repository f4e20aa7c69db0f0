use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Width of `orders.momo_number`.
pub const MAX_MOMO_NUMBER_LEN: usize = 20;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_pool_size: u32,
    pub upload_dir: PathBuf,
    pub merchant_momo_number: String,
    /// Carts untouched for this long are dropped.
    pub session_idle_ttl: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            None => 8080,
        };
        let db_pool_size = match lookup("DB_POOL_SIZE") {
            Some(raw) => match raw.parse() {
                Ok(size) if size > 0 => size,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "DB_POOL_SIZE",
                        value: raw,
                    })
                }
            },
            None => 10,
        };
        let upload_dir = lookup("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("uploads/payments"));
        let merchant_momo_number =
            lookup("MERCHANT_MOMO_NUMBER").unwrap_or_else(|| "+84123456789".to_string());
        let trimmed = merchant_momo_number.trim();
        if trimmed.is_empty() || trimmed.chars().count() > MAX_MOMO_NUMBER_LEN {
            return Err(ConfigError::Invalid {
                name: "MERCHANT_MOMO_NUMBER",
                value: merchant_momo_number,
            });
        }
        let merchant_momo_number = trimmed.to_string();
        let session_idle_minutes = match lookup("SESSION_IDLE_MINUTES") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(minutes) if minutes > 0 => minutes,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "SESSION_IDLE_MINUTES",
                        value: raw,
                    })
                }
            },
            None => 30,
        };

        Ok(AppConfig {
            database_url,
            host,
            port,
            db_pool_size,
            upload_dir,
            merchant_momo_number,
            session_idle_ttl: Duration::from_secs(session_idle_minutes * 60),
        })
    }
}
