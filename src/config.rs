//! 予約サーバーの設定

use config::{Config, ConfigError, Environment, File, builder::DefaultState, ConfigBuilder};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    /// URLがなければ台帳はメモリ上に置く。
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BookingConfig {
    /// 使用中の枠を待つ最長時間。超えるとSlotUnavailableを返す
    pub lock_timeout_ms: u64,
    /// 店舗のUTCからのオフセット
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub booking: BookingConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// ファイルと環境変数から設定を読み込む
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // BARBERSHOP__BOOKING__LOCK_TIMEOUT_MS など
            .add_source(
                Environment::with_prefix("BARBERSHOP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .set_override_option("server.port", env::var("PORT").ok())?;

        Self::from_builder(builder)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl BookingConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn utc_offset_seconds(&self) -> i32 {
        self.utc_offset_minutes * 60
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: 2000,
            utc_offset_minutes: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "barbershop_booking=debug,tower_http=debug".to_string(),
        }
    }
}
