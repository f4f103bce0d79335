//! Host-side operations an overlay session depends on

use capture::{Rect, SourceImage};

/// Everything a session asks of the outside world
///
/// Calls may block; sessions issue `get_overlay_image`, `capture_screen` and
/// `process_selection` from worker threads and feed the results back through
/// their event queue.
pub trait OverlayHost: Send + Sync {
    /// Image of one monitor
    fn get_overlay_image(&self, screen_index: usize) -> anyhow::Result<SourceImage>;

    /// Image for single-capture mode
    fn capture_screen(&self) -> anyhow::Result<SourceImage>;

    /// Tear down every overlay
    fn close_all_overlays(&self) -> anyhow::Result<()>;

    /// Crop the native region and return its tags
    fn process_selection(&self, screen_index: Option<usize>, region: Rect) -> anyhow::Result<String>;

    /// Show a message to the user
    fn alert(&self, message: &str);
}
