use std::time::Duration;

use clap::Args;
use serde::Deserialize;

use logcast_engine::DeliveryConfig;
use storage_file::FileStoreConfig;
use storage_memory::MemoryStoreConfig;

use crate::error::ServerError;

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Путь к TOML конфиг файлу. Без него действуют значения по умолчанию.
    #[arg(long, env = "LOGCAST_CONFIG")]
    pub config: Option<String>,
}

// ---- TOML Config ----

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub delivery: DeliverySection,
    /// Сколько ждать завершения API после сигнала, мс.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            bind_addr: default_bind_addr(),
            storage: StorageConfig::default(),
            delivery: DeliverySection::default(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

/// `[storage]`: выбор бэкенда по `kind`.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StorageConfig {
    Memory(MemoryStoreConfig),
    File(FileStoreConfig),
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Memory(MemoryStoreConfig::default())
    }
}

impl StorageConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            StorageConfig::Memory(_) => "memory",
            StorageConfig::File(_) => "file",
        }
    }
}

/// `[delivery]`: backpressure retry tuning.
#[derive(Debug, Deserialize)]
pub struct DeliverySection {
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
    #[serde(default = "default_warn_after_retries")]
    pub warn_after_retries: u32,
}

impl Default for DeliverySection {
    fn default() -> Self {
        Self {
            retry_interval_ms: default_retry_interval_ms(),
            warn_after_retries: default_warn_after_retries(),
        }
    }
}

impl DeliverySection {
    pub fn to_delivery_config(&self) -> DeliveryConfig {
        DeliveryConfig {
            retry_interval: Duration::from_millis(self.retry_interval_ms),
            warn_after_retries: self.warn_after_retries,
        }
    }
}

fn default_api_port() -> u16 {
    3000
}
fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}
fn default_shutdown_grace_ms() -> u64 {
    5000
}
fn default_retry_interval_ms() -> u64 {
    100
}
fn default_warn_after_retries() -> u32 {
    50
}

impl ServerConfig {
    pub fn load(path: &str) -> Result<Self, ServerError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config { context: "read", detail: format!("'{path}': {e}") })?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| ServerError::Config { context: "parse", detail: format!("'{path}': {e}") })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ServerError> {
        if self.delivery.retry_interval_ms == 0 {
            return Err(ServerError::Config {
                context: "delivery",
                detail: "retry_interval_ms must be greater than 0".into(),
            });
        }
        if let StorageConfig::Memory(m) = &self.storage {
            if m.max_records == 0 {
                return Err(ServerError::Config {
                    context: "storage",
                    detail: "max_records must be greater than 0".into(),
                });
            }
        }
        Ok(())
    }
}
