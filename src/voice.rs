use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId};

use crate::error::Result;
use crate::track::QueueItem;

/// Transporte de voz: crea conexiones a canales de audio en tiempo real.
///
/// El cliente concreto (songbird u otro driver) vive fuera de este crate;
/// acá solo se fija el contrato que una sesión necesita.
#[async_trait]
pub trait VoiceTransport: Send + Sync {
    /// Adquiere una conexión al canal indicado.
    async fn connect(&self, guild_id: GuildId, channel_id: ChannelId)
        -> Result<Box<dyn VoiceConnection>>;
}

/// Conexión de voz en propiedad exclusiva de una sesión.
///
/// Se libera con `disconnect` o al ser reemplazada por una reconexión.
#[async_trait]
pub trait VoiceConnection: Send + Sync {
    /// Canal al que está conectada.
    fn channel_id(&self) -> ChannelId;

    /// Comienza a transmitir `item` desde `offset` (absoluto dentro del track).
    async fn play(&mut self, item: &QueueItem, offset: std::time::Duration) -> Result<()>;

    async fn pause(&mut self) -> Result<()>;

    async fn resume(&mut self) -> Result<()>;

    /// Detiene el stream actual sin soltar la conexión.
    async fn stop(&mut self) -> Result<()>;

    /// Posición transcurrida del stream actual.
    fn position(&self) -> std::time::Duration;

    /// Suelta la conexión.
    async fn disconnect(&mut self) -> Result<()>;
}
