//! Application state across all open overlays

use overlay::{SelectionOutcome, SessionStatus};

/// What the user is looking at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Waiting for screenshots
    Capturing,
    Selecting,
    /// A confirmed region is being tagged
    Tagging,
    /// Every overlay is closed
    Finished,
}

impl AppState {
    pub fn display_text(&self) -> &'static str {
        match self {
            AppState::Capturing => "Capturing screen...",
            AppState::Selecting => "Drag to select a region, Enter to tag, Esc to cancel",
            AppState::Tagging => "Tagging...",
            AppState::Finished => "Done",
        }
    }

    /// Overall state from the status of each session
    pub fn from_sessions(statuses: &[SessionStatus]) -> Self {
        let has = |wanted: SessionStatus| statuses.iter().any(|s| *s == wanted);

        if has(SessionStatus::Processing) {
            AppState::Tagging
        } else if has(SessionStatus::Interactive) {
            AppState::Selecting
        } else if has(SessionStatus::Loading) {
            AppState::Capturing
        } else {
            AppState::Finished
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, AppState::Finished)
    }
}

/// Single result for a run that may have had one overlay per monitor
///
/// A confirmed region wins over failures, failures win over cancels.
pub fn merge_outcomes<'a, I>(outcomes: I) -> SelectionOutcome
where
    I: IntoIterator<Item = &'a SelectionOutcome>,
{
    let mut merged = SelectionOutcome::Cancelled;
    for outcome in outcomes {
        match outcome {
            SelectionOutcome::Confirmed { .. } => return outcome.clone(),
            SelectionOutcome::Failed(_) if merged == SelectionOutcome::Cancelled => {
                merged = outcome.clone();
            }
            _ => {}
        }
    }
    merged
}
