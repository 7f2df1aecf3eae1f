use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub remote: RemoteConfig,
    pub sync: SyncConfig,
    pub network: NetworkConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    /// Bearer token for the signed-in user. Falls back to the api key when unset.
    pub access_token: Option<String>,
    pub request_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub auto_sync: bool,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    pub batch_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub probe_delay_ms: u64,
    pub health_check_timeout: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite:data/pondkeeper.db".to_string(),
                max_connections: 5,
                connection_timeout: 30,
            },
            remote: RemoteConfig {
                base_url: None,
                api_key: None,
                access_token: None,
                request_timeout: 30,
            },
            sync: SyncConfig {
                auto_sync: true,
                max_retries: 5,
                backoff_base_ms: 2_000,
                backoff_max_ms: 300_000, // 5 minutes
                batch_size: 100,
            },
            network: NetworkConfig {
                probe_delay_ms: 1_000,
                health_check_timeout: 5,
            },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("POND_DATABASE_URL") {
            if !v.trim().is_empty() {
                cfg.database.url = v.trim().to_string();
            }
        }
        if let Some(value) = env_u64("POND_DATABASE_MAX_CONNECTIONS") {
            cfg.database.max_connections = value as u32;
        }

        cfg.remote.base_url = env_string("POND_REMOTE_URL");
        cfg.remote.api_key = env_string("POND_REMOTE_KEY");
        cfg.remote.access_token = env_string("POND_ACCESS_TOKEN");
        if let Some(value) = env_u64("POND_REMOTE_TIMEOUT_SECS") {
            cfg.remote.request_timeout = value.max(1);
        }

        if let Ok(v) = std::env::var("POND_AUTO_SYNC") {
            cfg.sync.auto_sync = parse_bool(&v, cfg.sync.auto_sync);
        }
        if let Some(value) = env_u64("POND_SYNC_MAX_RETRIES") {
            cfg.sync.max_retries = value as u32;
        }
        if let Some(value) = env_u64("POND_SYNC_BACKOFF_BASE_MS") {
            cfg.sync.backoff_base_ms = value;
        }
        if let Some(value) = env_u64("POND_SYNC_BACKOFF_MAX_MS") {
            cfg.sync.backoff_max_ms = value;
        }
        if let Some(value) = env_u64("POND_SYNC_BATCH_SIZE") {
            cfg.sync.batch_size = value as u32;
        }

        if let Some(value) = env_u64("POND_PROBE_DELAY_MS") {
            cfg.network.probe_delay_ms = value;
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.sync.max_retries == 0 {
            return Err("Sync max_retries must be greater than 0".to_string());
        }
        if self.sync.batch_size == 0 {
            return Err("Sync batch_size must be greater than 0".to_string());
        }
        if self.sync.backoff_base_ms > self.sync.backoff_max_ms {
            return Err("Sync backoff_base_ms must not exceed backoff_max_ms".to_string());
        }
        if let Some(url) = &self.remote.base_url {
            reqwest::Url::parse(url).map_err(|e| format!("Invalid remote base_url: {e}"))?;
        }
        Ok(())
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| parse_u64(&v))
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}
