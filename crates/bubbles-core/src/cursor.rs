//! Local cursor state and position authority.
//!
//! Two sources may move the local cursor: the user's touch and the engine's
//! autopilot. Touch always wins. While a touch is held, autopilot updates are
//! discarded so that no two authorities move the cursor in the same instant.

use serde::{Deserialize, Serialize};

use crate::transform::LogicalPoint;

/// Which input source currently owns the local cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Authority {
    /// No touch in progress; autopilot may move the cursor.
    #[default]
    Released,
    /// A touch is in progress.
    Held,
}

/// Touch gesture phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TouchPhase {
    Began,
    Moved,
    Ended,
    Cancelled,
}

/// A position change the controller must act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorChange {
    /// New local position.
    pub position: LogicalPoint,
    /// Whether the engine must be told about the move. False for changes the
    /// engine originated itself.
    pub notify_engine: bool,
}

/// Local cursor state for one canvas.
#[derive(Debug, Clone, Default)]
pub struct LocalCursor {
    position: LogicalPoint,
    authority: Authority,
}

impl LocalCursor {
    /// Create a released cursor at the canvas center.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a released cursor at the given position.
    pub fn at(position: LogicalPoint) -> Self {
        Self {
            position,
            authority: Authority::Released,
        }
    }

    pub fn position(&self) -> LogicalPoint {
        self.position
    }

    pub fn authority(&self) -> Authority {
        self.authority
    }

    /// Whether a touch currently owns the cursor.
    pub fn is_held(&self) -> bool {
        self.authority == Authority::Held
    }

    /// Process a touch event.
    ///
    /// `target` is the transformed touch position, or `None` when the transform
    /// failed for this event. Authority still changes in that case, the
    /// position does not.
    pub fn handle_touch(
        &mut self,
        phase: TouchPhase,
        target: Option<LogicalPoint>,
    ) -> Option<CursorChange> {
        match phase {
            TouchPhase::Began => {
                self.authority = Authority::Held;
                target.map(|position| self.apply_touch(position))
            }
            TouchPhase::Moved => {
                if !self.is_held() {
                    return None;
                }
                target.map(|position| self.apply_touch(position))
            }
            TouchPhase::Ended => {
                if !self.is_held() {
                    return None;
                }
                // Apply first, then release: the released position is where
                // the finger last was.
                let change = target.map(|position| self.apply_touch(position));
                self.authority = Authority::Released;
                change
            }
            TouchPhase::Cancelled => {
                self.authority = Authority::Released;
                None
            }
        }
    }

    /// Process an autopilot move reported by the engine.
    ///
    /// Discarded while a touch is held.
    pub fn handle_autopilot(&mut self, position: LogicalPoint) -> Option<CursorChange> {
        if self.is_held() {
            log::debug!(
                "Autopilot move to ({}, {}) discarded: touch holds the cursor",
                position.x,
                position.y
            );
            return None;
        }
        self.position = position;
        Some(CursorChange {
            position,
            notify_engine: false,
        })
    }

    fn apply_touch(&mut self, position: LogicalPoint) -> CursorChange {
        self.position = position;
        CursorChange {
            position,
            notify_engine: true,
        }
    }
}
