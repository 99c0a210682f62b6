//! Canvas controller.
//!
//! Owns the local cursor, the redraw flag and the engine for one canvas.
//! Every method runs on the rendering context. Engine callbacks never reach
//! the controller directly; they arrive through the [`Mailbox`] and are
//! applied in [`CanvasController::process_engine_events`].

use bubbles_core::bridge::{ControllerHandle, EngineEvent, Mailbox};
use bubbles_core::config::{CanvasConfig, ConfigError, SessionConfig};
use bubbles_core::cursor::{CursorChange, LocalCursor, TouchPhase};
use bubbles_core::engine::SessionEngine;
use bubbles_core::redraw::RedrawSignal;
use bubbles_core::transform::LogicalPoint;
use bubbles_render::{FrameRenderer, FrameReport, RenderContext, Renderer};
use kurbo::{Point, Rect};

use crate::error::{ClientError, ClientResult};

/// Controller for one canvas and its session.
pub struct CanvasController<E: SessionEngine> {
    engine: E,
    mailbox: Mailbox,
    cursor: LocalCursor,
    redraw: RedrawSignal,
    frames: FrameRenderer,
    started: bool,
    exited: bool,
}

impl<E: SessionEngine> CanvasController<E> {
    /// Create a controller and register its callbacks with the engine.
    pub fn new(mut engine: E, mailbox: Mailbox, canvas: &CanvasConfig) -> ClientResult<Self> {
        let frames = FrameRenderer::from_config(canvas)
            .map_err(|e| ConfigError::Invalid(format!("canvas: {}", e)))?;
        mailbox.registry().attach(mailbox.handle(), &mut engine);
        log::debug!("Created canvas controller {}", mailbox.handle());
        Ok(Self {
            engine,
            mailbox,
            cursor: LocalCursor::new(),
            redraw: RedrawSignal::new(),
            frames,
            started: false,
            exited: false,
        })
    }

    pub fn handle(&self) -> ControllerHandle {
        self.mailbox.handle()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn cursor(&self) -> &LocalCursor {
        &self.cursor
    }

    /// Current local position.
    pub fn position(&self) -> LogicalPoint {
        self.cursor.position()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Whether the engine reported the end of the session.
    pub fn has_exited(&self) -> bool {
        self.exited
    }

    /// Start the session.
    ///
    /// A failure is returned as-is and never retried. On success the current
    /// position is sent to the engine and a redraw is requested.
    pub fn start(&mut self, session: &SessionConfig) -> ClientResult<()> {
        if self.exited {
            return Err(ClientError::SessionEnded);
        }
        self.engine.start(session).map_err(|e| {
            log::error!("Failed to start session in room {}: {}", session.room, e);
            ClientError::Startup(e)
        })?;
        self.started = true;
        log::info!("Session started: room={} endpoint={}", session.room, session.endpoint);

        let position = self.cursor.position();
        self.engine.move_to(position.x, position.y);
        self.redraw.request();
        Ok(())
    }

    /// Feed a touch event in screen coordinates.
    ///
    /// Ignored once the session has ended.
    pub fn on_touch(&mut self, phase: TouchPhase, point: Point, viewport: Rect) {
        if self.exited {
            log::debug!("Ignoring {:?} touch: session has ended", phase);
            return;
        }
        let target = match phase {
            TouchPhase::Cancelled => None,
            _ => match self.frames.transform().screen_to_logical(point, viewport) {
                Ok(p) => Some(p),
                Err(e) => {
                    log::warn!("Ignoring touch position: {}", e);
                    None
                }
            },
        };
        if let Some(change) = self.cursor.handle_touch(phase, target) {
            self.apply(change);
        }
    }

    pub fn touch_begin(&mut self, point: Point, viewport: Rect) {
        self.on_touch(TouchPhase::Began, point, viewport);
    }

    pub fn touch_move(&mut self, point: Point, viewport: Rect) {
        self.on_touch(TouchPhase::Moved, point, viewport);
    }

    pub fn touch_end(&mut self, point: Point, viewport: Rect) {
        self.on_touch(TouchPhase::Ended, point, viewport);
    }

    pub fn touch_cancel(&mut self) {
        self.on_touch(TouchPhase::Cancelled, Point::ORIGIN, Rect::ZERO);
    }

    /// Apply an autopilot move. Discarded while a touch holds the cursor.
    pub fn autopilot_moved(&mut self, position: LogicalPoint) {
        if self.exited {
            return;
        }
        if let Some(change) = self.cursor.handle_autopilot(position) {
            self.apply(change);
        }
    }

    fn apply(&mut self, change: CursorChange) {
        if self.exited {
            return;
        }
        if change.notify_engine {
            self.engine.move_to(change.position.x, change.position.y);
        }
        self.redraw.request();
    }

    /// Drain and apply every pending engine event. Returns how many were applied.
    pub fn process_engine_events(&mut self) -> usize {
        let events = self.mailbox.poll_events();
        for &event in &events {
            match event {
                EngineEvent::SessionExited => {
                    log::info!("Session ended for {}", self.mailbox.handle());
                    self.exited = true;
                    // Nothing left to draw against.
                    self.redraw.take();
                }
                EngineEvent::RedrawRequested => {
                    self.redraw.request();
                }
                EngineEvent::AutopilotMoved(position) => {
                    self.autopilot_moved(position);
                }
            }
        }
        events.len()
    }

    /// Whether a redraw is pending.
    pub fn needs_redraw(&self) -> bool {
        self.redraw.is_pending()
    }

    /// Consume the pending redraw. Returns true if a frame should be drawn now.
    pub fn take_redraw(&mut self) -> bool {
        self.redraw.take()
    }

    /// Draw one frame.
    ///
    /// Fails with [`ClientError::SessionEnded`] once the session has ended,
    /// without touching the engine.
    pub fn render<R: Renderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        ctx: &RenderContext,
    ) -> ClientResult<FrameReport> {
        if self.exited {
            return Err(ClientError::SessionEnded);
        }
        Ok(self
            .frames
            .render(&mut self.engine, self.cursor.position(), ctx, renderer)?)
    }
}

impl<E: SessionEngine> Drop for CanvasController<E> {
    fn drop(&mut self) {
        // Silence the engine before the mailbox deregisters.
        self.engine.stop();
        log::debug!("Dropped canvas controller {}", self.mailbox.handle());
    }
}
