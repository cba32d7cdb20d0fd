//! Sesión de reproducción por guild: cola, historial y control de transporte.

pub mod queue;
pub mod registry;

pub use queue::TrackQueue;
pub use registry::SessionRegistry;

use serenity::model::id::{ChannelId, GuildId};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{PlaybackError, Result};
use crate::track::QueueItem;
use crate::voice::{VoiceConnection, VoiceTransport};

/// Estado de transporte de una sesión.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Idle,
    Playing,
    Paused,
}

/// Máquina de estados de reproducción de un guild.
///
/// Cada guild tiene exactamente una sesión, creada por el
/// [`SessionRegistry`]. La sesión es dueña exclusiva de su conexión de voz:
/// la adquiere en `connect`, la reemplaza al reconectar y la suelta en
/// `stop`. Toda operación mutante valida sus precondiciones completas antes
/// de tocar el estado.
pub struct Session {
    guild_id: GuildId,
    status: PlaybackStatus,
    queue: TrackQueue,
    loop_current: bool,
    position: Duration,
    connection: Option<Box<dyn VoiceConnection>>,
    transport: Arc<dyn VoiceTransport>,
}

impl Session {
    pub fn new(guild_id: GuildId, transport: Arc<dyn VoiceTransport>, max_queue_size: usize) -> Self {
        Self {
            guild_id,
            status: PlaybackStatus::Idle,
            queue: TrackQueue::new(max_queue_size),
            loop_current: false,
            position: Duration::ZERO,
            connection: None,
            transport,
        }
    }

    /// Conecta la sesión al canal de voz indicado.
    ///
    /// Idempotente para el mismo canal. Si hay una conexión a otro canal,
    /// se suelta primero y recién después se adquiere la nueva.
    pub async fn connect(&mut self, channel_id: ChannelId) -> Result<()> {
        if self.connected_channel() == Some(channel_id) {
            return Ok(());
        }

        if let Some(mut old) = self.connection.take() {
            info!("🔄 Cambiando de canal de voz en guild {}", self.guild_id);
            if let Err(e) = old.disconnect().await {
                warn!("Error al soltar la conexión anterior: {}", e);
            }
        }

        let conn = self.transport.connect(self.guild_id, channel_id).await?;
        info!("🔊 Conectado al canal {} en guild {}", channel_id, self.guild_id);
        self.connection = Some(conn);
        Ok(())
    }

    /// Comienza o reanuda la reproducción.
    pub async fn play(&mut self) -> Result<()> {
        if self.status == PlaybackStatus::Playing {
            return Err(PlaybackError::invalid("ya se está reproduciendo"));
        }

        if self.queue.current().is_none() {
            if self.queue.promote_next().is_none() {
                return Err(PlaybackError::invalid("no hay nada que reproducir"));
            }
            self.position = Duration::ZERO;
        }

        if self.status == PlaybackStatus::Paused {
            let conn = self.require_connection()?;
            conn.resume().await?;
        } else {
            self.stream_current_from(self.position).await?;
        }

        self.status = PlaybackStatus::Playing;
        if let Some(item) = self.queue.current() {
            info!("🎵 Reproduciendo: {}", item.title());
        }
        Ok(())
    }

    /// Pausa la reproducción actual.
    pub async fn pause(&mut self) -> Result<()> {
        if self.status != PlaybackStatus::Playing {
            return Err(PlaybackError::invalid("no se está reproduciendo nada"));
        }

        let position = {
            let conn = self.require_connection()?;
            conn.pause().await?;
            conn.position()
        };
        self.position = position;
        self.status = PlaybackStatus::Paused;
        info!("⏸️ Reproducción pausada");
        Ok(())
    }

    /// Suelta la conexión de voz y limpia cola, historial y estado.
    pub async fn stop(&mut self) -> Result<()> {
        let mut conn = self
            .connection
            .take()
            .ok_or_else(|| PlaybackError::invalid("no estoy conectado a un canal de voz"))?;

        self.queue.clear();
        self.loop_current = false;
        self.position = Duration::ZERO;
        self.status = PlaybackStatus::Idle;
        info!("⏹️ Reproducción detenida en guild {}", self.guild_id);

        conn.disconnect().await
    }

    /// Agrega un item al final de los pendientes, o al frente si `immediate`.
    pub fn add(&mut self, item: QueueItem, immediate: bool) -> Result<()> {
        self.queue.add(item, immediate)
    }

    /// Remueve `range` items desde la posición 1-indexada `position`.
    pub fn remove(&mut self, position: usize, range: usize) -> Result<Vec<QueueItem>> {
        self.queue.remove_range(position, range)
    }

    /// Mueve un item dentro de los pendientes; devuelve su título.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<String> {
        self.queue.move_item(from, to)
    }

    /// Reposiciona la reproducción en el offset absoluto `target`.
    ///
    /// Mantiene el estado: reproduciendo sigue reproduciendo desde ahí,
    /// pausado queda pausado en la nueva posición.
    pub async fn seek(&mut self, target: Duration) -> Result<()> {
        let current = self
            .queue
            .current()
            .ok_or_else(|| PlaybackError::invalid("no hay canción en reproducción"))?;

        if current.meta.is_live {
            return Err(PlaybackError::invalid(
                "no se puede hacer seek en un stream en vivo",
            ));
        }

        let length = current.meta.duration.ok_or_else(|| {
            PlaybackError::invalid("la canción no reporta duración, no admite seek")
        })?;

        if target > length {
            return Err(PlaybackError::invalid(
                "no se puede buscar más allá del final de la canción",
            ));
        }

        if self.status == PlaybackStatus::Playing {
            self.stream_current_from(target).await?;
        }
        self.position = target;
        Ok(())
    }

    /// Seek relativo hacia adelante desde la posición actual.
    pub async fn forward_seek(&mut self, delta: Duration) -> Result<()> {
        let target = self.position().saturating_add(delta);
        self.seek(target).await
    }

    /// Salta `n` canciones. Sin avance parcial si no alcanzan.
    ///
    /// Un salto explícito siempre gana sobre `loop`: avanza igual y el flag
    /// queda aplicado a la nueva canción actual.
    pub async fn forward(&mut self, n: usize) -> Result<()> {
        self.queue.forward(n)?;
        self.position = Duration::ZERO;

        if self.status == PlaybackStatus::Playing {
            self.stream_current_from(Duration::ZERO).await?;
        }
        Ok(())
    }

    /// Vuelve a la canción anterior del historial.
    pub async fn back(&mut self) -> Result<()> {
        self.queue.rewind()?;
        self.position = Duration::ZERO;

        if self.status == PlaybackStatus::Playing {
            self.stream_current_from(Duration::ZERO).await?;
        }
        Ok(())
    }

    /// Activa o desactiva la repetición de la canción actual.
    pub fn toggle_loop(&mut self) -> Result<bool> {
        if self.queue.current().is_none() {
            return Err(PlaybackError::invalid("no hay canción que repetir"));
        }

        self.loop_current = !self.loop_current;
        if self.loop_current {
            info!("🔂 Repetición activada");
        } else {
            info!("➡️ Repetición desactivada");
        }
        Ok(self.loop_current)
    }

    /// Fin natural del track actual.
    ///
    /// Con `loop` activo la canción no se descarta: se vuelve a reproducir
    /// desde el inicio. Sin loop, avanza al siguiente pendiente o queda
    /// Idle (conservando la conexión) si la cola se secó.
    pub async fn on_track_end(&mut self) -> Result<()> {
        if self.status != PlaybackStatus::Playing {
            return Ok(());
        }

        if self.loop_current && self.queue.current().is_some() {
            info!("🔂 Repitiendo la canción actual");
            return self.stream_current_from(Duration::ZERO).await;
        }

        if self.queue.advance_natural().is_some() {
            self.stream_current_from(Duration::ZERO).await?;
            if let Some(item) = self.queue.current() {
                info!("🎵 Reproduciendo: {}", item.title());
            }
        } else {
            self.position = Duration::ZERO;
            self.status = PlaybackStatus::Idle;
            info!("📭 Cola vacía, sesión en reposo");
        }
        Ok(())
    }

    // Lecturas puras

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn current(&self) -> Option<&QueueItem> {
        self.queue.current()
    }

    /// Pendientes en orden, sin la canción actual.
    pub fn queue_items(&self) -> Vec<QueueItem> {
        self.queue.pending()
    }

    pub fn queue_size(&self) -> usize {
        self.queue.len()
    }

    pub fn history_len(&self) -> usize {
        self.queue.history_len()
    }

    pub fn loop_enabled(&self) -> bool {
        self.loop_current
    }

    /// Posición transcurrida de la canción actual.
    pub fn position(&self) -> Duration {
        match (&self.connection, self.status) {
            (Some(conn), PlaybackStatus::Playing) => conn.position(),
            _ => self.position,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn connected_channel(&self) -> Option<ChannelId> {
        self.connection.as_ref().map(|c| c.channel_id())
    }

    // Internas

    fn require_connection(&mut self) -> Result<&mut Box<dyn VoiceConnection>> {
        self.connection
            .as_mut()
            .ok_or_else(|| PlaybackError::invalid("no estoy conectado a un canal de voz"))
    }

    async fn stream_current_from(&mut self, offset: Duration) -> Result<()> {
        let item = match self.queue.current().cloned() {
            Some(item) => item,
            None => return Ok(()),
        };

        let conn = self.require_connection()?;
        conn.play(&item, offset).await?;
        self.position = offset;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::{SongMetadata, SourceKind};
    use crate::voice::fake::{FakeEvent, FakeTransport};
    use pretty_assertions::assert_eq;
    use serenity::model::id::{ChannelId, UserId};

    const VOICE: ChannelId = ChannelId::new(100);
    const TEXT: ChannelId = ChannelId::new(200);

    fn item(title: &str) -> QueueItem {
        QueueItem::new(
            SongMetadata::new(title, format!("https://youtu.be/{title}"), SourceKind::YouTube)
                .with_duration(Duration::from_secs(180)),
            TEXT,
            UserId::new(1),
        )
    }

    fn live_item(title: &str) -> QueueItem {
        QueueItem::new(
            SongMetadata::new(title, "https://radio.example/live", SourceKind::DirectStream)
                .as_live(),
            TEXT,
            UserId::new(1),
        )
    }

    fn session() -> (Session, Arc<FakeTransport>) {
        let transport = FakeTransport::new();
        let session = Session::new(GuildId::new(1), transport.clone(), 100);
        (session, transport)
    }

    async fn playing_session(titles: &[&str]) -> (Session, Arc<FakeTransport>) {
        let (mut session, transport) = session();
        for title in titles {
            session.add(item(title), false).unwrap();
        }
        session.connect(VOICE).await.unwrap();
        session.play().await.unwrap();
        (session, transport)
    }

    fn last_play(transport: &FakeTransport) -> (String, Duration) {
        let state = transport.last_state();
        let events = &state.lock().events;
        events
            .iter()
            .rev()
            .find_map(|e| match e {
                FakeEvent::Play { title, offset } => Some((title.clone(), *offset)),
                _ => None,
            })
            .expect("sin evento Play")
    }

    #[tokio::test]
    async fn play_with_nothing_queued_fails() {
        let (mut session, _) = session();
        session.connect(VOICE).await.unwrap();

        let err = session.play().await.unwrap_err();
        assert!(matches!(err, PlaybackError::InvalidOperation(_)));
        assert_eq!(session.status(), PlaybackStatus::Idle);
    }

    #[tokio::test]
    async fn play_promotes_queue_head_and_streams() {
        let (session, transport) = playing_session(&["a"]).await;

        assert_eq!(session.status(), PlaybackStatus::Playing);
        assert_eq!(session.current().unwrap().title(), "a");
        assert_eq!(session.queue_size(), 0);
        assert_eq!(last_play(&transport), ("a".to_string(), Duration::ZERO));
    }

    #[tokio::test]
    async fn play_while_playing_fails() {
        let (mut session, _) = playing_session(&["a"]).await;

        let err = session.play().await.unwrap_err();
        assert!(matches!(err, PlaybackError::InvalidOperation(_)));
    }

    #[tokio::test]
    async fn pause_snapshots_position_and_resume_continues() {
        let (mut session, transport) = playing_session(&["a"]).await;
        transport.set_position(Duration::from_secs(42));

        session.pause().await.unwrap();
        assert_eq!(session.status(), PlaybackStatus::Paused);
        assert_eq!(session.position(), Duration::from_secs(42));

        session.play().await.unwrap();
        assert_eq!(session.status(), PlaybackStatus::Playing);
        let state = transport.last_state();
        assert!(state.lock().events.contains(&FakeEvent::Resume));
    }

    #[tokio::test]
    async fn pause_when_not_playing_fails() {
        let (mut session, _) = session();
        session.connect(VOICE).await.unwrap();

        assert!(matches!(
            session.pause().await.unwrap_err(),
            PlaybackError::InvalidOperation(_)
        ));
    }

    #[tokio::test]
    async fn seek_past_length_fails_and_preserves_state() {
        let (mut session, transport) = playing_session(&["a"]).await;
        transport.set_position(Duration::from_secs(30));

        let err = session.seek(Duration::from_secs(999)).await.unwrap_err();
        assert!(matches!(err, PlaybackError::InvalidOperation(_)));
        assert_eq!(session.status(), PlaybackStatus::Playing);
        assert_eq!(session.position(), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn seek_on_live_stream_fails() {
        let (mut session, _) = session();
        session.add(live_item("radio"), false).unwrap();
        session.connect(VOICE).await.unwrap();
        session.play().await.unwrap();

        let err = session.seek(Duration::from_secs(10)).await.unwrap_err();
        assert!(matches!(err, PlaybackError::InvalidOperation(_)));
    }

    #[tokio::test]
    async fn seek_while_playing_restreams_at_offset() {
        let (mut session, transport) = playing_session(&["a"]).await;

        session.seek(Duration::from_secs(90)).await.unwrap();

        assert_eq!(session.status(), PlaybackStatus::Playing);
        assert_eq!(last_play(&transport), ("a".to_string(), Duration::from_secs(90)));
    }

    #[tokio::test]
    async fn seek_while_paused_repositions_without_streaming() {
        let (mut session, transport) = playing_session(&["a"]).await;
        session.pause().await.unwrap();

        session.seek(Duration::from_secs(60)).await.unwrap();

        assert_eq!(session.status(), PlaybackStatus::Paused);
        assert_eq!(session.position(), Duration::from_secs(60));
        // Un solo Play: el del arranque.
        let state = transport.last_state();
        let plays = state
            .lock()
            .events
            .iter()
            .filter(|e| matches!(e, FakeEvent::Play { .. }))
            .count();
        assert_eq!(plays, 1);
    }

    #[tokio::test]
    async fn forward_seek_is_relative_to_current_position() {
        let (mut session, transport) = playing_session(&["a"]).await;
        transport.set_position(Duration::from_secs(30));

        session.forward_seek(Duration::from_secs(45)).await.unwrap();

        assert_eq!(last_play(&transport), ("a".to_string(), Duration::from_secs(75)));
    }

    #[tokio::test]
    async fn forward_streams_new_current_when_playing() {
        let (mut session, transport) = playing_session(&["a", "b", "c"]).await;

        session.forward(2).await.unwrap();

        assert_eq!(session.current().unwrap().title(), "c");
        assert_eq!(session.history_len(), 2);
        assert_eq!(last_play(&transport), ("c".to_string(), Duration::ZERO));
        assert_eq!(session.status(), PlaybackStatus::Playing);
    }

    #[tokio::test]
    async fn forward_too_far_fails_atomically() {
        let (mut session, _) = playing_session(&["a", "b"]).await;

        let err = session.forward(5).await.unwrap_err();
        assert!(matches!(err, PlaybackError::InvalidOperation(_)));
        assert_eq!(session.current().unwrap().title(), "a");
        assert_eq!(session.queue_size(), 1);
        assert_eq!(session.history_len(), 0);
    }

    #[tokio::test]
    async fn forward_then_back_scenario() {
        // Cola [A, B, C], actual implícito A tras play.
        let (mut session, _) = playing_session(&["A", "B", "C", "D"]).await;

        session.forward(2).await.unwrap();
        assert_eq!(session.current().unwrap().title(), "C");

        session.back().await.unwrap();
        assert_eq!(session.current().unwrap().title(), "B");
        assert_eq!(
            session
                .queue_items()
                .iter()
                .map(|i| i.title().to_string())
                .collect::<Vec<_>>(),
            vec!["C", "D"]
        );
        assert_eq!(session.history_len(), 1);
    }

    #[tokio::test]
    async fn back_with_empty_history_fails() {
        let (mut session, _) = playing_session(&["a"]).await;

        assert!(matches!(
            session.back().await.unwrap_err(),
            PlaybackError::InvalidOperation(_)
        ));
    }

    #[tokio::test]
    async fn stop_releases_connection_and_clears_everything() {
        let (mut session, transport) = playing_session(&["a", "b", "c"]).await;
        session.toggle_loop().unwrap();

        session.stop().await.unwrap();

        assert_eq!(session.status(), PlaybackStatus::Idle);
        assert!(session.current().is_none());
        assert_eq!(session.queue_size(), 0);
        assert_eq!(session.history_len(), 0);
        assert!(!session.loop_enabled());
        assert!(!session.is_connected());
        assert!(transport.last_state().lock().disconnected);

        // Sin conexión, stop vuelve a fallar.
        assert!(matches!(
            session.stop().await.unwrap_err(),
            PlaybackError::InvalidOperation(_)
        ));
    }

    #[tokio::test]
    async fn connect_is_idempotent_for_same_channel() {
        let (mut session, transport) = session();

        session.connect(VOICE).await.unwrap();
        session.connect(VOICE).await.unwrap();

        assert_eq!(transport.connect_count(), 1);
        assert_eq!(session.connected_channel(), Some(VOICE));
    }

    #[tokio::test]
    async fn reconnect_supersedes_previous_connection() {
        let (mut session, transport) = session();
        let other = ChannelId::new(999);

        session.connect(VOICE).await.unwrap();
        let first_state = transport.last_state();

        session.connect(other).await.unwrap();

        assert_eq!(transport.connect_count(), 2);
        assert!(first_state.lock().disconnected);
        assert_eq!(session.connected_channel(), Some(other));
    }

    #[tokio::test]
    async fn connect_failure_surfaces_as_resource_error() {
        let (mut session, transport) = session();
        transport
            .fail_connect
            .store(true, std::sync::atomic::Ordering::SeqCst);

        let err = session.connect(VOICE).await.unwrap_err();
        assert!(matches!(err, PlaybackError::Resource(_)));
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn track_end_with_loop_replays_current() {
        let (mut session, transport) = playing_session(&["a", "b"]).await;
        session.toggle_loop().unwrap();

        session.on_track_end().await.unwrap();

        assert_eq!(session.current().unwrap().title(), "a");
        assert_eq!(session.history_len(), 0);
        assert_eq!(session.queue_size(), 1);
        assert_eq!(last_play(&transport), ("a".to_string(), Duration::ZERO));
    }

    #[tokio::test]
    async fn track_end_advances_to_next_pending() {
        let (mut session, transport) = playing_session(&["a", "b"]).await;

        session.on_track_end().await.unwrap();

        assert_eq!(session.current().unwrap().title(), "b");
        assert_eq!(session.history_len(), 1);
        assert_eq!(last_play(&transport), ("b".to_string(), Duration::ZERO));
    }

    #[tokio::test]
    async fn track_end_on_dry_queue_goes_idle_but_stays_connected() {
        let (mut session, _) = playing_session(&["a"]).await;

        session.on_track_end().await.unwrap();

        assert_eq!(session.status(), PlaybackStatus::Idle);
        assert!(session.current().is_none());
        assert_eq!(session.history_len(), 1);
        assert!(session.is_connected());
    }

    #[tokio::test]
    async fn explicit_forward_overrides_loop() {
        let (mut session, _) = playing_session(&["a", "b"]).await;
        session.toggle_loop().unwrap();

        session.forward(1).await.unwrap();

        assert_eq!(session.current().unwrap().title(), "b");
        assert!(session.loop_enabled());
    }

    #[tokio::test]
    async fn back_is_allowed_while_looping() {
        let (mut session, _) = playing_session(&["a", "b"]).await;
        session.forward(1).await.unwrap();
        session.toggle_loop().unwrap();

        session.back().await.unwrap();

        assert_eq!(session.current().unwrap().title(), "a");
        assert!(session.loop_enabled());
    }

    #[tokio::test]
    async fn toggle_loop_without_current_fails() {
        let (mut session, _) = session();

        assert!(matches!(
            session.toggle_loop().unwrap_err(),
            PlaybackError::InvalidOperation(_)
        ));
    }
}
