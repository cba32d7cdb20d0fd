//! Resolución de consultas: clasifica un texto libre y lo convierte en una
//! lista ordenada de canciones reproducibles.

pub mod fetcher;
pub mod sampler;

pub use fetcher::{SecondaryTrack, SongFetcher};
pub use sampler::{PlaylistSampler, UniformSampler};

use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};
use url::Url;

use crate::cache::MetadataCache;
use crate::error::{PlaybackError, Result};
use crate::track::{SongMetadata, SourceKind};

/// Hosts de la plataforma primaria de video.
const PRIMARY_HOSTS: [&str; 5] = [
    "www.youtube.com",
    "youtu.be",
    "youtube.com",
    "music.youtube.com",
    "www.music.youtube.com",
];

const SECONDARY_HOST: &str = "open.spotify.com";
const SECONDARY_SCHEME: &str = "spotify";

#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions {
    /// Máximo de tracks admitidos de una playlist de la plataforma
    /// secundaria; por encima se toma una muestra uniforme.
    pub playlist_limit: usize,
    /// Dividir videos con capítulos en sub-items.
    pub split_chapters: bool,
}

/// Resultado de una resolución, con los datos que el caller necesita para
/// armar su respuesta.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub items: Vec<SongMetadata>,
    /// Tracks totales del origen (antes de muestrear).
    pub total_tracks: usize,
    /// `true` si hubo muestreo por exceder el límite.
    pub sampled: bool,
    /// Tracks del origen que no se pudieron resolver a nada reproducible.
    pub not_found: usize,
}

impl Resolution {
    fn plain(items: Vec<SongMetadata>) -> Self {
        Self {
            total_tracks: items.len(),
            sampled: false,
            not_found: 0,
            items,
        }
    }
}

/// Clasifica una consulta cruda y la despacha a la estrategia de fetch
/// que corresponda.
///
/// Las búsquedas por término pasan por el [`MetadataCache`], así dos guilds
/// pidiendo lo mismo a la vez generan una sola consulta externa.
pub struct QueryResolver {
    fetcher: Arc<dyn SongFetcher>,
    sampler: Arc<dyn PlaylistSampler>,
    cache: MetadataCache<Vec<SongMetadata>>,
    fetch_timeout: Duration,
    cache_ttl: Duration,
}

impl QueryResolver {
    pub fn new(fetcher: Arc<dyn SongFetcher>, sampler: Arc<dyn PlaylistSampler>) -> Self {
        Self {
            fetcher,
            sampler,
            cache: MetadataCache::new(),
            fetch_timeout: Duration::from_secs(30),
            cache_ttl: Duration::from_secs(3600),
        }
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn with_cache_ttl(mut self, cache_ttl: Duration) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }

    /// Resuelve `raw_query` a una lista de canciones.
    ///
    /// Toda rama que termina sin items se reporta como `NotFound`.
    pub async fn resolve(&self, raw_query: &str, opts: ResolveOptions) -> Result<Resolution> {
        let query = raw_query.trim();

        let resolution = match Url::parse(query) {
            Ok(url) if is_primary_host(&url) => self.resolve_primary(&url, opts).await?,
            Ok(url) if is_secondary_source(&url) => self.resolve_secondary(query, opts).await?,
            Ok(url) => self.resolve_direct(&url).await?,
            // No es una URL: búsqueda por palabras clave.
            Err(_) => self.resolve_search(query, opts).await?,
        };

        if resolution.items.is_empty() {
            return Err(PlaybackError::not_found("no se encontró ninguna canción"));
        }

        Ok(resolution)
    }

    async fn resolve_primary(&self, url: &Url, opts: ResolveOptions) -> Result<Resolution> {
        let playlist_id = url
            .query_pairs()
            .find(|(key, _)| key == "list")
            .map(|(_, value)| value.to_string());

        if let Some(playlist_id) = playlist_id {
            debug!("📃 Resolviendo playlist {}", playlist_id);
            let items = self
                .bounded(self.fetcher.fetch_playlist(&playlist_id, opts.split_chapters))
                .await?;
            return Ok(Resolution::plain(items));
        }

        debug!("🎬 Resolviendo video {}", url);
        let items = self
            .bounded(self.fetcher.fetch_single(url.as_str(), opts.split_chapters))
            .await?
            .ok_or_else(|| PlaybackError::not_found("el video no existe"))?;
        Ok(Resolution::plain(items))
    }

    async fn resolve_secondary(&self, raw_query: &str, opts: ResolveOptions) -> Result<Resolution> {
        let tracks = self
            .bounded(self.fetcher.fetch_secondary_tracks(raw_query))
            .await?;
        let total = tracks.len();

        if total == 0 {
            return Err(PlaybackError::not_found("la playlist está vacía"));
        }

        let (chosen, sampled) = if total > opts.playlist_limit {
            info!(
                "🎲 {} tracks superan el límite {}, tomando muestra aleatoria",
                total, opts.playlist_limit
            );
            let indices = self.sampler.sample(total, opts.playlist_limit);
            let picked: Vec<SecondaryTrack> = indices
                .into_iter()
                .filter_map(|i| tracks.get(i).cloned())
                .collect();
            (picked, true)
        } else {
            (tracks, false)
        };

        let searches = chosen.iter().map(|track| {
            let term = format!("{} {}", track.title, track.artist);
            async move { self.cached_search(&term, opts.split_chapters).await }
        });
        let results = join_all(searches).await;

        let mut items = Vec::new();
        let mut not_found = 0;
        for result in results {
            match result {
                Ok(songs) if !songs.is_empty() => {
                    for mut song in songs {
                        song.source = SourceKind::Spotify;
                        items.push(song);
                    }
                }
                _ => not_found += 1,
            }
        }

        if not_found > 0 {
            info!("🕳️ {} tracks no se pudieron resolver", not_found);
        }

        Ok(Resolution {
            items,
            total_tracks: total,
            sampled,
            not_found,
        })
    }

    async fn resolve_direct(&self, url: &Url) -> Result<Resolution> {
        debug!("📡 Resolviendo stream directo {}", url);
        let item = self
            .bounded(self.fetcher.fetch_direct_stream(url.as_str()))
            .await?
            .ok_or_else(|| PlaybackError::not_found("el stream no responde"))?;
        Ok(Resolution::plain(vec![item]))
    }

    async fn resolve_search(&self, term: &str, opts: ResolveOptions) -> Result<Resolution> {
        debug!("🔍 Buscando: {}", term);
        let items = self.cached_search(term, opts.split_chapters).await?;

        if items.is_empty() {
            return Err(PlaybackError::not_found("la búsqueda no arrojó resultados"));
        }

        Ok(Resolution::plain(items))
    }

    /// Búsqueda con memoización single-flight: consultas idénticas dentro
    /// del TTL comparten una sola llamada externa.
    async fn cached_search(&self, term: &str, split_chapters: bool) -> Result<Vec<SongMetadata>> {
        let key = format!("search:{}:{}", split_chapters, term.trim().to_lowercase());

        self.cache
            .wrap(&key, self.cache_ttl, || async {
                let found = self
                    .bounded(self.fetcher.search(term, split_chapters))
                    .await?;
                Ok(found.unwrap_or_default())
            })
            .await
    }

    /// Acota una consulta externa al timeout configurado; vencido el plazo
    /// se reporta como `NotFound` en vez de colgar al caller.
    async fn bounded<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match timeout(self.fetch_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(PlaybackError::not_found(
                "la consulta externa excedió el tiempo límite",
            )),
        }
    }
}

fn is_primary_host(url: &Url) -> bool {
    url.host_str()
        .map(|host| PRIMARY_HOSTS.contains(&host))
        .unwrap_or(false)
}

fn is_secondary_source(url: &Url) -> bool {
    url.scheme() == SECONDARY_SCHEME || url.host_str() == Some(SECONDARY_HOST)
}
