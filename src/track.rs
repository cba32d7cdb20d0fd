use chrono::{DateTime, Utc};
use serenity::model::id::{ChannelId, UserId};
use std::time::Duration;

/// Plataforma de la que proviene un track resuelto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Video o playlist de YouTube.
    YouTube,
    /// Track de Spotify, resuelto a un video de YouTube.
    Spotify,
    /// Stream HTTP directo (radio, live).
    DirectStream,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::YouTube => "youtube",
            SourceKind::Spotify => "spotify",
            SourceKind::DirectStream => "direct",
        }
    }
}

/// Playlist de origen de un track, si vino de una.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistInfo {
    pub title: String,
}

/// Metadata de una canción resuelta, sin procedencia de solicitud.
///
/// Es lo que produce el resolver; se convierte en [`QueueItem`] al entrar
/// a la cola de una sesión.
#[derive(Debug, Clone, PartialEq)]
pub struct SongMetadata {
    pub title: String,
    pub artist: String,
    pub url: String,
    /// Duración total. `None` cuando la fuente no la reporta (streams en vivo).
    pub duration: Option<Duration>,
    /// Un stream en vivo no admite seek.
    pub is_live: bool,
    pub thumbnail: Option<String>,
    pub source: SourceKind,
    pub playlist: Option<PlaylistInfo>,
    /// Offset de inicio dentro de la fuente, para capítulos divididos.
    pub offset: Duration,
}

impl SongMetadata {
    pub fn new(title: impl Into<String>, url: impl Into<String>, source: SourceKind) -> Self {
        Self {
            title: title.into(),
            artist: String::new(),
            url: url.into(),
            duration: None,
            is_live: false,
            thumbnail: None,
            source,
            playlist: None,
            offset: Duration::ZERO,
        }
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = artist.into();
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    pub fn with_playlist(mut self, playlist: PlaylistInfo) -> Self {
        self.playlist = Some(playlist);
        self
    }

    pub fn with_offset(mut self, offset: Duration) -> Self {
        self.offset = offset;
        self
    }

    pub fn as_live(mut self) -> Self {
        self.is_live = true;
        self.duration = None;
        self
    }
}

/// Un elemento de cola: metadata más la procedencia de la solicitud.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueItem {
    pub meta: SongMetadata,
    /// Canal de texto donde se pidió.
    pub channel_id: ChannelId,
    pub requested_by: UserId,
    pub added_at: DateTime<Utc>,
}

impl QueueItem {
    pub fn new(meta: SongMetadata, channel_id: ChannelId, requested_by: UserId) -> Self {
        Self {
            meta,
            channel_id,
            requested_by,
            added_at: Utc::now(),
        }
    }

    pub fn title(&self) -> &str {
        &self.meta.title
    }

    /// `true` si se puede hacer seek dentro del track.
    pub fn is_seekable(&self) -> bool {
        !self.meta.is_live && self.meta.duration.is_some()
    }
}
