//! Session engine boundary.
//!
//! The engine is an external collaborator that owns networking, room
//! membership and peer state. The core drives it through the narrow calls
//! below: a one-time start, fire-and-forget moves, the per-frame plot protocol
//! and callback registration.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bridge::ControllerHandle;
use crate::config::SessionConfig;
use crate::transform::LogicalPoint;

/// Engine errors surfaced to the core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Engine start failed (status {code}): {reason}")]
    StartFailed { code: i32, reason: String },
    #[error("Engine has not been started")]
    NotStarted,
}

/// Called once when the session has permanently ended.
pub type ExitCallback = Arc<dyn Fn(ControllerHandle) + Send + Sync>;
/// Called when visual state changed and the canvas should be redrawn.
pub type RedrawCallback = Arc<dyn Fn(ControllerHandle) + Send + Sync>;
/// Called with the new logical position when autopilot moved the local cursor.
pub type AutopilotCallback = Arc<dyn Fn(ControllerHandle, i32, i32) + Send + Sync>;

/// A remote participant, materialized for a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePeer {
    pub position: LogicalPoint,
    /// Packed `0xRRGGBB`.
    pub color: u32,
}

/// The engine's per-frame peer enumeration protocol.
///
/// Calls must be bracketed: `plot_start`, any number of reads and
/// `plot_next` until `plot_end` reports true, then exactly one `plot_done`.
/// Use [`PlotSession`] rather than calling these directly.
pub trait PlotSource {
    /// Arm a snapshot of the current peers.
    fn plot_start(&mut self);
    /// True once the enumeration has no current peer.
    fn plot_end(&self) -> bool;
    /// Advance to the next peer.
    fn plot_next(&mut self);
    fn plot_x(&self) -> i32;
    fn plot_y(&self) -> i32;
    /// Packed `0xRRGGBB` color of the current peer.
    fn plot_color(&self) -> u32;
    /// Packed color the other participants see for the local cursor.
    fn plot_my_color(&self) -> u32;
    /// Release the snapshot armed by `plot_start`.
    fn plot_done(&mut self);
}

/// Full engine surface driven by a canvas controller.
///
/// Every call here must be issued from the rendering context. Callbacks
/// registered here may fire on any thread.
pub trait SessionEngine: PlotSource {
    /// Start the session. Called once; failures are not retried.
    fn start(&mut self, session: &SessionConfig) -> Result<(), EngineError>;

    /// Report the local cursor position.
    fn move_to(&mut self, x: i32, y: i32);

    fn register_on_exit(&mut self, handle: ControllerHandle, callback: ExitCallback);

    fn register_on_redraw(&mut self, handle: ControllerHandle, callback: RedrawCallback);

    fn register_on_autopilot_move(&mut self, handle: ControllerHandle, callback: AutopilotCallback);

    /// Stop delivering callbacks. No callback fires after this returns.
    fn stop(&mut self) {}
}

/// Scoped plot snapshot.
///
/// Starting a session calls `plot_start`; dropping it calls `plot_done`, on
/// every exit path.
pub struct PlotSession<'a, P: PlotSource + ?Sized> {
    source: &'a mut P,
}

impl<'a, P: PlotSource + ?Sized> PlotSession<'a, P> {
    /// Arm a snapshot on the given source.
    pub fn begin(source: &'a mut P) -> Self {
        source.plot_start();
        Self { source }
    }

    /// Color of the local cursor as the other participants see it.
    pub fn my_color(&self) -> u32 {
        self.source.plot_my_color()
    }

    pub fn is_finished(&self) -> bool {
        self.source.plot_end()
    }

    /// Read the current peer.
    pub fn current(&self) -> RemotePeer {
        RemotePeer {
            position: LogicalPoint::new(self.source.plot_x(), self.source.plot_y()),
            color: self.source.plot_color(),
        }
    }

    pub fn advance(&mut self) {
        self.source.plot_next();
    }
}

impl<P: PlotSource + ?Sized> Drop for PlotSession<'_, P> {
    fn drop(&mut self) {
        self.source.plot_done();
    }
}
