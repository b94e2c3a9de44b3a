use std::time::Duration;

use thiserror::Error;

/// Errors returned to the caller of a turtle command.
#[derive(Debug, Error)]
pub enum TurtleError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("animation #{sequence} did not complete within {timeout:?}")]
    PlaybackTimeout { sequence: u64, timeout: Duration },
    #[error("playback worker has stopped")]
    PlaybackStopped,
    #[error("failed to start playback worker: {0}")]
    Spawn(#[from] std::io::Error),
}

impl TurtleError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

/// Failures reported by a [`RenderSurface`](crate::surface::RenderSurface).
///
/// These never reach the command caller; the sequencer logs them and moves on.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("render surface is disconnected")]
    Disconnected,
    #[error("render surface did not become ready within {0:?}")]
    OpenTimeout(Duration),
    #[error("render surface rejected the request: {0}")]
    Rejected(String),
}

/// Errors from the windowed viewer.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("pixel surface error: {0}")]
    Pixels(#[from] pixels::Error),
}
