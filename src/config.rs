use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("DATABASE_URL is not set, the score store will stay disconnected")]
    MissingDatabaseUrl,
    #[error("invalid value {value:?} for {key}, using the default")]
    InvalidValue { key: &'static str, value: String },
}

/// Settings of the score store connection.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub database_url: Option<String>,
    pub max_connections: u32,
    /// Upper bound on the initial connection attempt,
    /// also used as the pool's acquire timeout.
    pub connect_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub store: StoreConfig,
    /// Problems found while reading the environment.
    /// Reported once the logger is up.
    pub issues: Vec<ConfigError>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            store: StoreConfig::default(),
            issues: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from the process environment and `.env`.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_vars(|key| dotenv::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut issues = Vec::new();

        let database_url = var("DATABASE_URL").filter(|url| !url.is_empty());
        if database_url.is_none() {
            issues.push(ConfigError::MissingDatabaseUrl);
        }

        let port = parse_var(&var, "PORT", &mut issues).unwrap_or(DEFAULT_PORT);
        let max_connections = parse_var(&var, "DATABASE_MAX_CONNECTIONS", &mut issues)
            .filter(|&count: &u32| count > 0)
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);
        let connect_timeout = parse_var(&var, "DATABASE_CONNECT_TIMEOUT_SECS", &mut issues)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT);

        Self {
            port,
            store: StoreConfig {
                database_url,
                max_connections,
                connect_timeout,
            },
            issues,
        }
    }
}

fn parse_var<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    issues: &mut Vec<ConfigError>,
) -> Option<T> {
    let value = var(key)?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            issues.push(ConfigError::InvalidValue { key, value });
            None
        }
    }
}
