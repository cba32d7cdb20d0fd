use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serenity::model::id::GuildId;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs;
use tracing::info;

/// Configuración por guild almacenada en JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuildSettings {
    pub guild_id: u64,
    /// Máximo de tracks que se admiten de una playlist de la plataforma
    /// secundaria; por encima se muestrea.
    pub playlist_limit: usize,
}

impl Default for GuildSettings {
    fn default() -> Self {
        Self {
            guild_id: 0,
            playlist_limit: 50,
        }
    }
}

/// Proveedor de configuración por guild, de solo lectura para el resolver.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    async fn get_settings(&self, guild_id: GuildId) -> Result<GuildSettings>;
}

/// Almacenamiento de configuración basado en archivos JSON.
///
/// Un archivo `guild_<id>.json` por guild bajo el directorio de datos, con
/// cache en memoria. La configuración de un guild se crea con los valores
/// por defecto la primera vez que alguien la pide.
pub struct JsonSettingsStore {
    data_dir: PathBuf,
    cache: RwLock<HashMap<u64, GuildSettings>>,
}

impl JsonSettingsStore {
    pub async fn new(data_dir: PathBuf) -> Result<Self> {
        let guilds_dir = data_dir.join("guilds");
        fs::create_dir_all(&guilds_dir).await?;

        info!("📁 Configuración de guilds en: {}", guilds_dir.display());

        Ok(Self {
            data_dir,
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Actualiza el límite de playlist de un guild y lo persiste.
    pub async fn set_playlist_limit(&self, guild_id: GuildId, limit: usize) -> Result<()> {
        if limit == 0 {
            anyhow::bail!("el límite de playlist debe ser mayor que 0");
        }

        let mut settings = self.get_settings(guild_id).await?;
        settings.playlist_limit = limit;

        self.save_guild(&settings).await?;
        self.cache.write().insert(guild_id.get(), settings);

        info!("💾 Límite de playlist de guild {} actualizado a {}", guild_id, limit);
        Ok(())
    }

    async fn load_guild(&self, guild_id: u64) -> Result<GuildSettings> {
        let content = fs::read_to_string(self.file_path(guild_id)).await?;
        let settings: GuildSettings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    async fn save_guild(&self, settings: &GuildSettings) -> Result<()> {
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(self.file_path(settings.guild_id), content).await?;
        Ok(())
    }

    fn file_path(&self, guild_id: u64) -> PathBuf {
        self.data_dir
            .join("guilds")
            .join(format!("guild_{}.json", guild_id))
    }
}

#[async_trait]
impl SettingsProvider for JsonSettingsStore {
    async fn get_settings(&self, guild_id: GuildId) -> Result<GuildSettings> {
        let id = guild_id.get();

        if let Some(settings) = self.cache.read().get(&id) {
            return Ok(settings.clone());
        }

        match self.load_guild(id).await {
            Ok(settings) => {
                self.cache.write().insert(id, settings.clone());
                Ok(settings)
            }
            Err(_) => {
                let settings = GuildSettings {
                    guild_id: id,
                    ..GuildSettings::default()
                };

                self.save_guild(&settings).await?;
                self.cache.write().insert(id, settings.clone());

                info!("📝 Configuración por defecto creada para guild {}", id);
                Ok(settings)
            }
        }
    }
}
