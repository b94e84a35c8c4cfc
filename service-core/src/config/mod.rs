use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load `configuration.*` and `APP__*` variables. A plain `PORT` variable,
    /// as set by most container platforms, wins over `APP__PORT`.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let mut config: Config = config.try_deserialize()?;

        if let Ok(port) = std::env::var("PORT") {
            config.port = port.trim().parse().map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("PORT is not a valid port ({}): {}", port, e))
            })?;
        }

        Ok(config)
    }
}
