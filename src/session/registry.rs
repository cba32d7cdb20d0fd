use dashmap::DashMap;
use serenity::model::id::GuildId;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::session::Session;
use crate::voice::VoiceTransport;

/// Registro de sesiones: exactamente una por guild, por toda la vida del
/// proceso.
///
/// Se construye al arrancar y se pasa por referencia a quien lo necesite;
/// las sesiones de guilds distintos no comparten estado mutable alguno.
/// El `Mutex` por sesión serializa las operaciones mutantes dentro de un
/// mismo guild.
pub struct SessionRegistry {
    sessions: DashMap<GuildId, Arc<Mutex<Session>>>,
    transport: Arc<dyn VoiceTransport>,
    max_queue_size: usize,
}

impl SessionRegistry {
    pub fn new(transport: Arc<dyn VoiceTransport>, max_queue_size: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            transport,
            max_queue_size,
        }
    }

    /// Devuelve la sesión del guild, creándola si es la primera vez.
    ///
    /// La creación es atómica: dos llamadas concurrentes para el mismo guild
    /// observan la misma instancia.
    pub fn get(&self, guild_id: GuildId) -> Arc<Mutex<Session>> {
        self.sessions
            .entry(guild_id)
            .or_insert_with(|| {
                info!("🆕 Sesión creada para guild {}", guild_id);
                Arc::new(Mutex::new(Session::new(
                    guild_id,
                    self.transport.clone(),
                    self.max_queue_size,
                )))
            })
            .clone()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn guilds(&self) -> Vec<GuildId> {
        self.sessions.iter().map(|e| *e.key()).collect()
    }

    /// Apagado del proceso: suelta la conexión de voz de toda sesión que
    /// siga conectada.
    pub async fn shutdown(&self) {
        let sessions: Vec<Arc<Mutex<Session>>> =
            self.sessions.iter().map(|e| e.value().clone()).collect();

        for session in sessions {
            let mut session = session.lock().await;
            if session.is_connected() {
                if let Err(e) = session.stop().await {
                    warn!(
                        "Error al desconectar la sesión de guild {}: {}",
                        session.guild_id(),
                        e
                    );
                }
            }
        }

        info!("👋 Registro apagado, {} sesiones desconectadas", self.sessions.len());
    }
}
