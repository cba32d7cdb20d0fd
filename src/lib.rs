//! Núcleo de colas de reproducción multi-guild.
//!
//! Cada guild tiene una [`session::Session`] aislada con su cola, historial
//! y conexión de voz; el [`session::SessionRegistry`] garantiza una sola
//! sesión por guild. Las consultas crudas (URLs o términos de búsqueda) se
//! clasifican y resuelven con el [`resolver::QueryResolver`], y el
//! [`enqueue::EnqueueService`] une todo: resolver, encolar y arrancar la
//! reproducción.
//!
//! El cliente de chat, el renderizado de respuestas y los clientes de red
//! concretos viven fuera de este crate; acá quedan sus contratos
//! ([`voice::VoiceTransport`], [`resolver::SongFetcher`],
//! [`settings::SettingsProvider`]).

pub mod cache;
pub mod config;
pub mod enqueue;
pub mod error;
pub mod resolver;
pub mod session;
pub mod settings;
pub mod track;
pub mod voice;

pub use config::Config;
pub use enqueue::{EnqueueRequest, EnqueueService, EnqueueSummary};
pub use error::{PlaybackError, Result};
pub use resolver::{QueryResolver, ResolveOptions, Resolution};
pub use session::{PlaybackStatus, Session, SessionRegistry};
pub use settings::{GuildSettings, SettingsProvider};
pub use track::{PlaylistInfo, QueueItem, SongMetadata, SourceKind};
pub use voice::{VoiceConnection, VoiceTransport};
