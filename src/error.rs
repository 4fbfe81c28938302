use thiserror::Error;

/// Library error type for compositing operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller invoked the compositor without meeting its preconditions
    /// (no decoded source image, non-finite geometry). Nothing was drawn.
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// The settings snapshot failed validation.
    #[error("invalid settings: {0:#}")]
    InvalidSettings(anyhow::Error),

    /// An external raster (wallpaper, source image) could not be obtained or decoded.
    #[error("failed to load {what}: {source:#}")]
    Asset {
        what: String,
        #[source]
        source: anyhow::Error,
    },

    /// Compositing succeeded but extracting or encoding the pixels did not.
    #[error("export readback failed: {0}")]
    Readback(String),

    /// The render surface could not be allocated at the requested size.
    #[error("cannot allocate a {width}x{height} render surface")]
    SurfaceAlloc { width: u32, height: u32 },

    /// A blocking render or decode task panicked or was cancelled before it replied.
    #[error("render task did not complete: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    pub fn asset(what: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Asset {
            what: what.into(),
            source: source.into(),
        }
    }

    /// Whether the caller can retry (export) or keep showing the last good frame (preview).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Asset { .. } | Self::Readback(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
