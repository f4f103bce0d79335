//! Overlay module for SnapTag
//!
//! Interactive region selection over a captured image: the selection state
//! machine, the display-to-native coordinate transform, and the session
//! lifecycle that fetches the image and dispatches the confirmed region.

pub mod config;
pub mod geometry;
pub mod handle;
pub mod host;
pub mod registry;
pub mod selection;
pub mod session;
pub mod transform;

pub use config::{Addressing, EngineConfig, HANDLE_SIZE, MIN_SELECTION_SIZE};
pub use geometry::{DisplayRect, Point};
pub use handle::Handle;
pub use host::OverlayHost;
pub use registry::OverlayRegistry;
pub use selection::{Command, Hit, Key, Mode, ModeKind, PointerButton, PointerEvent, SelectionMachine};
pub use session::{OverlaySession, SessionEvent, SessionId, SessionStatus};
pub use transform::{map_to_native, ContainFit, Container};

use capture::Rect;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OverlayError {
    #[error("Capture source unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Source image has invalid size {width}x{height}")]
    InvalidSourceImage { width: u32, height: u32 },

    #[error("Container has invalid size {width}x{height}")]
    InvalidContainer { width: f32, height: f32 },

    #[error("Processing the selection failed: {0}")]
    DispatchFailed(String),

    #[error("Overlay not ready: {0}")]
    NotReady(&'static str),
}

impl OverlayError {
    /// Errors after which the session cannot continue
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            OverlayError::ProviderUnavailable(_) | OverlayError::InvalidSourceImage { .. }
        )
    }
}

pub type OverlayResult<T> = Result<T, OverlayError>;

/// How a session ended
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    /// Region dispatched and tagged
    Confirmed { region: Rect, tags: String },
    /// User closed the overlay, or another session closed them all
    Cancelled,
    /// Session aborted on a fatal error
    Failed(OverlayError),
}
