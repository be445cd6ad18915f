use std::net::SocketAddr;

/// Application configuration, read once at startup.
///
/// The upload directory is carried here and handed to the file store at
/// construction instead of being read from the environment at call sites.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub upload_dir: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let redis_url = std::env::var("REDIS_URL").ok();

        let upload_dir = std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());

        let port = match std::env::var("PORT") {
            Ok(p) => p.parse::<u16>().map_err(|_| ConfigError::Invalid("PORT"))?,
            Err(_) => 9500,
        };

        let max_connections = match std::env::var("DB_MAX_CONNECTIONS") {
            Ok(n) => n
                .parse::<u32>()
                .map_err(|_| ConfigError::Invalid("DB_MAX_CONNECTIONS"))?,
            Err(_) => 5,
        };

        Ok(Self {
            database_url,
            redis_url,
            upload_dir,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], port)),
            max_connections,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for environment variable {0}")]
    Invalid(&'static str),
}
