//! Selection state machine
//!
//! One `Mode` value per session, replaced wholesale on every event. Drag
//! anchors and the active handle live inside the variants that need them,
//! so they exist exactly as long as the gesture does.

use crate::config::EngineConfig;
use crate::geometry::{DisplayRect, Point};
use crate::handle::Handle;

/// Pointer button of a press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Pointer input in display space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { pos: Point, button: PointerButton },
    Move { pos: Point },
    Up { pos: Point },
}

/// Keys the overlay reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
}

/// Pointer position and rectangle captured when a gesture starts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragAnchor {
    pub start: Point,
    pub rect: DisplayRect,
}

/// Interaction mode, carrying only the data valid in it
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Mode {
    #[default]
    None,
    Selecting { anchor: DragAnchor, rect: DisplayRect },
    Selected { rect: DisplayRect },
    Moving { anchor: DragAnchor, rect: DisplayRect },
    Resizing { handle: Handle, anchor: DragAnchor, rect: DisplayRect },
}

/// Discriminant of `Mode`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    None,
    Selecting,
    Selected,
    Moving,
    Resizing,
}

impl Mode {
    pub fn kind(&self) -> ModeKind {
        match self {
            Mode::None => ModeKind::None,
            Mode::Selecting { .. } => ModeKind::Selecting,
            Mode::Selected { .. } => ModeKind::Selected,
            Mode::Moving { .. } => ModeKind::Moving,
            Mode::Resizing { .. } => ModeKind::Resizing,
        }
    }

    pub fn rect(&self) -> Option<DisplayRect> {
        match *self {
            Mode::None => None,
            Mode::Selecting { rect, .. }
            | Mode::Selected { rect }
            | Mode::Moving { rect, .. }
            | Mode::Resizing { rect, .. } => Some(rect),
        }
    }

    pub fn anchor(&self) -> Option<DragAnchor> {
        match *self {
            Mode::Selecting { anchor, .. } | Mode::Moving { anchor, .. } | Mode::Resizing { anchor, .. } => {
                Some(anchor)
            }
            Mode::None | Mode::Selected { .. } => None,
        }
    }

    pub fn handle(&self) -> Option<Handle> {
        match *self {
            Mode::Resizing { handle, .. } => Some(handle),
            _ => None,
        }
    }
}

/// What a pointer position hits on the current selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Handle(Handle),
    Inside,
    Outside,
}

/// Request the machine hands back to its owner
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    None,
    /// Close the overlay
    Close,
    /// Dispatch the committed rectangle
    Confirm(DisplayRect),
}

/// Pointer/keyboard state machine of one overlay session
#[derive(Debug, Clone)]
pub struct SelectionMachine {
    mode: Mode,
    processing: bool,
    config: EngineConfig,
}

impl SelectionMachine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            mode: Mode::None,
            processing: false,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn kind(&self) -> ModeKind {
        self.mode.kind()
    }

    /// Current rectangle, in progress or committed
    pub fn rect(&self) -> Option<DisplayRect> {
        self.mode.rect()
    }

    /// Rectangle of a finished selection
    pub fn committed(&self) -> Option<DisplayRect> {
        match self.mode {
            Mode::Selected { rect } => Some(rect),
            _ => None,
        }
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Set while a confirm is in flight; blocks new gestures and confirms
    pub fn set_processing(&mut self, processing: bool) {
        self.processing = processing;
    }

    /// Hit-test against the committed selection; handles win over the interior
    pub fn hit_test(&self, pos: Point) -> Hit {
        let Mode::Selected { rect } = self.mode else {
            return Hit::Outside;
        };

        if self.config.resize_handles {
            if let Some(handle) = Handle::hit(&rect, pos, self.config.handle_size) {
                return Hit::Handle(handle);
            }
        }

        if rect.contains(pos) {
            Hit::Inside
        } else {
            Hit::Outside
        }
    }

    /// Feed a pointer event; returns true when the mode changed
    pub fn pointer(&mut self, event: PointerEvent) -> bool {
        let next = match event {
            PointerEvent::Down { pos, button } => self.on_down(pos, button),
            PointerEvent::Move { pos } => self.on_move(pos),
            PointerEvent::Up { .. } => self.on_up(),
        };

        match next {
            Some(mode) if mode != self.mode => {
                log::trace!("{:?} -> {:?}", self.mode.kind(), mode.kind());
                self.mode = mode;
                true
            }
            _ => false,
        }
    }

    /// Feed a key press
    pub fn key(&mut self, key: Key) -> Command {
        match key {
            Key::Escape => match self.mode {
                Mode::None | Mode::Selected { .. } => Command::Close,
                Mode::Selecting { .. } | Mode::Moving { .. } | Mode::Resizing { .. } => {
                    log::debug!("Gesture aborted from {:?}", self.mode.kind());
                    self.mode = Mode::None;
                    Command::None
                }
            },
            Key::Enter => self.confirm(),
        }
    }

    /// Explicit confirm; ignored while processing or without a committed rectangle
    pub fn confirm(&self) -> Command {
        if self.processing {
            log::debug!("Confirm ignored, dispatch already in flight");
            return Command::None;
        }
        match self.committed() {
            Some(rect) => Command::Confirm(rect),
            None => Command::None,
        }
    }

    /// Drop the committed selection without closing the overlay
    pub fn clear(&mut self) -> bool {
        if self.processing || !matches!(self.mode, Mode::Selected { .. }) {
            return false;
        }
        self.mode = Mode::None;
        true
    }

    fn on_down(&self, pos: Point, button: PointerButton) -> Option<Mode> {
        if self.processing || button != PointerButton::Primary {
            return None;
        }

        if let Mode::Selected { rect } = self.mode {
            let anchor = DragAnchor { start: pos, rect };
            match self.hit_test(pos) {
                Hit::Handle(handle) => return Some(Mode::Resizing { handle, anchor, rect }),
                Hit::Inside if self.config.movable => return Some(Mode::Moving { anchor, rect }),
                _ => {}
            }
        }

        let rect = DisplayRect::at(pos);
        Some(Mode::Selecting {
            anchor: DragAnchor { start: pos, rect },
            rect,
        })
    }

    fn on_move(&self, pos: Point) -> Option<Mode> {
        match self.mode {
            Mode::Selecting { anchor, .. } => Some(Mode::Selecting {
                anchor,
                rect: DisplayRect::from_corners(anchor.start, pos),
            }),
            Mode::Moving { anchor, .. } => Some(Mode::Moving {
                anchor,
                rect: anchor
                    .rect
                    .translated(pos.x - anchor.start.x, pos.y - anchor.start.y),
            }),
            Mode::Resizing { handle, anchor, .. } => Some(Mode::Resizing {
                handle,
                anchor,
                rect: handle.resize(
                    &anchor.rect,
                    pos.x - anchor.start.x,
                    pos.y - anchor.start.y,
                    self.config.min_selection,
                ),
            }),
            Mode::None | Mode::Selected { .. } => None,
        }
    }

    fn on_up(&self) -> Option<Mode> {
        match self.mode {
            Mode::Selecting { rect, .. } => {
                if rect.exceeds(self.config.min_selection) {
                    Some(Mode::Selected { rect })
                } else {
                    log::debug!("Selection {:?} too small, discarded", rect);
                    Some(Mode::None)
                }
            }
            Mode::Moving { rect, .. } | Mode::Resizing { rect, .. } => Some(Mode::Selected { rect }),
            Mode::None | Mode::Selected { .. } => None,
        }
    }
}

impl Default for SelectionMachine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
