use async_trait::async_trait;

use crate::error::Result;
use crate::track::SongMetadata;

/// Un track del catálogo de la plataforma secundaria, todavía sin resolver
/// a nada reproducible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryTrack {
    pub title: String,
    pub artist: String,
}

/// Contrato de los clientes que consultan las plataformas de origen.
///
/// Los clientes concretos (red, yt-dlp, APIs) viven fuera de este crate.
/// `None` significa que la plataforma reporta el recurso como inexistente;
/// un `Err` es un fallo de la consulta en sí.
#[async_trait]
pub trait SongFetcher: Send + Sync {
    /// Un video puntual por URL, opcionalmente dividido en capítulos.
    async fn fetch_single(
        &self,
        url: &str,
        split_chapters: bool,
    ) -> Result<Option<Vec<SongMetadata>>>;

    /// Todos los videos de una playlist, en orden.
    async fn fetch_playlist(
        &self,
        playlist_id: &str,
        split_chapters: bool,
    ) -> Result<Vec<SongMetadata>>;

    /// Búsqueda por palabras clave; devuelve el mejor resultado.
    async fn search(&self, term: &str, split_chapters: bool)
        -> Result<Option<Vec<SongMetadata>>>;

    /// Listado crudo de tracks de una URL de la plataforma secundaria.
    async fn fetch_secondary_tracks(&self, url: &str) -> Result<Vec<SecondaryTrack>>;

    /// Stream HTTP directo (radio, live).
    async fn fetch_direct_stream(&self, url: &str) -> Result<Option<SongMetadata>>;
}
