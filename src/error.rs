use thiserror::Error;

/// Errores del núcleo de reproducción.
///
/// Cada operación mutante valida todo antes de tocar el estado, así que un
/// error nunca deja una sesión a medio mutar.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Posiciones, rangos o límites mal formados. Sin mutación de estado.
    #[error("parámetro inválido: {0}")]
    Validation(String),

    /// La consulta, canción o elemento de cola/historial no existe.
    #[error("no encontrado: {0}")]
    NotFound(String),

    /// La operación no es válida en el estado actual de la sesión.
    #[error("operación inválida: {0}")]
    InvalidOperation(String),

    /// Fallo de la conexión de voz u otro recurso externo.
    #[error("error de recurso: {0}")]
    Resource(String),
}

impl PlaybackError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, PlaybackError>;
