use rand::seq::SliceRandom;
use serenity::model::id::{ChannelId, GuildId, UserId};
use std::sync::Arc;
use tracing::info;

use crate::error::{PlaybackError, Result};
use crate::resolver::{QueryResolver, ResolveOptions};
use crate::session::{PlaybackStatus, SessionRegistry};
use crate::settings::SettingsProvider;
use crate::track::QueueItem;

/// Pedido de agregar una consulta a la cola de un guild.
#[derive(Debug, Clone)]
pub struct EnqueueRequest {
    pub guild_id: GuildId,
    /// Canal de voz al que conectarse si hace falta.
    pub voice_channel: ChannelId,
    /// Canal de texto donde se pidió, queda como procedencia del item.
    pub text_channel: ChannelId,
    pub requested_by: UserId,
    pub query: String,
    /// Insertar al frente de la cola en vez de al final.
    pub to_front: bool,
    /// Mezclar los items agregados.
    pub shuffle: bool,
    pub split_chapters: bool,
}

/// Lo que el caller necesita para armar su respuesta.
#[derive(Debug, Clone)]
pub struct EnqueueSummary {
    pub first_title: String,
    pub added: usize,
    /// Había una canción actual antes de agregar.
    pub was_playing: bool,
    /// Este pedido arrancó la reproducción.
    pub started_playback: bool,
    pub total_tracks: usize,
    pub sampled: bool,
    pub not_found: usize,
}

/// Orquesta el flujo completo: resolver la consulta, encolar en la sesión
/// del guild y arrancar la reproducción si estaba quieta.
pub struct EnqueueService {
    registry: Arc<SessionRegistry>,
    resolver: Arc<QueryResolver>,
    settings: Arc<dyn SettingsProvider>,
}

impl EnqueueService {
    pub fn new(
        registry: Arc<SessionRegistry>,
        resolver: Arc<QueryResolver>,
        settings: Arc<dyn SettingsProvider>,
    ) -> Self {
        Self {
            registry,
            resolver,
            settings,
        }
    }

    pub async fn add_to_queue(&self, request: EnqueueRequest) -> Result<EnqueueSummary> {
        let settings = self
            .settings
            .get_settings(request.guild_id)
            .await
            .map_err(|e| {
                PlaybackError::resource(format!("no se pudo leer la configuración del guild: {e}"))
            })?;

        let resolution = self
            .resolver
            .resolve(
                &request.query,
                ResolveOptions {
                    playlist_limit: settings.playlist_limit,
                    split_chapters: request.split_chapters,
                },
            )
            .await?;

        let mut songs = resolution.items;
        if request.shuffle {
            songs.shuffle(&mut rand::thread_rng());
        }

        let first_title = songs
            .first()
            .map(|song| song.title.clone())
            .unwrap_or_default();
        let added = songs.len();

        let session = self.registry.get(request.guild_id);
        let mut session = session.lock().await;

        let was_playing = session.current().is_some();

        for song in songs {
            session.add(
                QueueItem::new(song, request.text_channel, request.requested_by),
                request.to_front,
            )?;
        }

        let mut started_playback = false;
        if !session.is_connected() {
            session.connect(request.voice_channel).await?;
            session.play().await?;
            started_playback = true;
        } else if session.status() == PlaybackStatus::Idle {
            session.play().await?;
            started_playback = true;
        }

        info!(
            "✅ {} canciones agregadas en guild {} ({})",
            added, request.guild_id, first_title
        );

        Ok(EnqueueSummary {
            first_title,
            added,
            was_playing,
            started_playback,
            total_tracks: resolution.total_tracks,
            sampled: resolution.sampled,
            not_found: resolution.not_found,
        })
    }
}
