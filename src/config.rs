use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

/// Configuración del proceso, cargada de variables de entorno.
#[derive(Debug, Clone)]
pub struct Config {
    // Colas
    pub max_queue_size: usize,
    pub default_playlist_limit: usize,

    // Resolución
    pub cache_ttl_secs: u64,
    pub resolve_timeout_secs: u64,

    // Paths
    pub data_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            max_queue_size: std::env::var("MAX_QUEUE_SIZE")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()?,
            default_playlist_limit: std::env::var("PLAYLIST_LIMIT")
                .unwrap_or_else(|_| "50".to_string())
                .parse()?,
            cache_ttl_secs: std::env::var("CACHE_TTL")
                .unwrap_or_else(|_| "3600".to_string()) // 1 hora
                .parse()?,
            resolve_timeout_secs: std::env::var("RESOLVE_TIMEOUT")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
            data_dir: std::env::var("DATA_DIR")
                .unwrap_or_else(|_| "./data".to_string())
                .into(),
        };

        std::fs::create_dir_all(&config.data_dir)?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_queue_size == 0 {
            anyhow::bail!("Max queue size must be greater than 0");
        }

        if self.default_playlist_limit == 0 {
            anyhow::bail!("Playlist limit must be greater than 0");
        }

        if self.cache_ttl_secs == 0 {
            anyhow::bail!("Cache TTL must be greater than 0");
        }

        if self.resolve_timeout_secs == 0 || self.resolve_timeout_secs > 300 {
            anyhow::bail!(
                "Resolve timeout must be between 1 and 300 seconds, got: {}",
                self.resolve_timeout_secs
            );
        }

        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_secs)
    }

    /// Resumen apto para logs, sin datos sensibles.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Queues: {} max size, {} playlist limit\n  \
            Resolver: {}s cache TTL, {}s timeout\n  \
            Data: {}",
            self.max_queue_size,
            self.default_playlist_limit,
            self.cache_ttl_secs,
            self.resolve_timeout_secs,
            self.data_dir.display(),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_queue_size: 1000,
            default_playlist_limit: 50,
            cache_ttl_secs: 3600,   // 1 hora
            resolve_timeout_secs: 30,
            data_dir: "./data".into(),
        }
    }
}
