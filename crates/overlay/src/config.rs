//! Engine configuration

/// Minimum selection edge in display pixels
pub const MIN_SELECTION_SIZE: f32 = 10.0;

/// Edge of the square hit box around each resize handle
pub const HANDLE_SIZE: f32 = 12.0;

/// How a session addresses its capture source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Addressing {
    /// One capture, no monitor index
    #[default]
    Single,
    /// One session per monitor, each dispatching its own index
    PerMonitor,
}

/// Feature set of one overlay engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Eight resize handles on a committed selection
    pub resize_handles: bool,
    /// Dragging inside a committed selection moves it
    pub movable: bool,
    pub addressing: Addressing,
    pub min_selection: f32,
    pub handle_size: f32,
}

impl EngineConfig {
    /// Handles and move enabled
    pub fn full() -> Self {
        Self {
            resize_handles: true,
            movable: true,
            addressing: Addressing::Single,
            min_selection: MIN_SELECTION_SIZE,
            handle_size: HANDLE_SIZE,
        }
    }

    /// Plain rubber-band selection, every press starts a new rectangle
    pub fn draw_only() -> Self {
        Self {
            resize_handles: false,
            movable: false,
            ..Self::full()
        }
    }

    pub fn per_monitor(mut self) -> Self {
        self.addressing = Addressing::PerMonitor;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::full()
    }
}
