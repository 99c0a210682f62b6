//! Headless runner.
//!
//! Drives a [`CanvasController`] against the in-process loopback engine at a
//! fixed tick rate, replaying a scripted touch gesture and rendering into a
//! [`RecordingRenderer`]. Useful for exercising the whole client without a
//! window or a server.

use std::fmt;
use std::path::Path;
use std::thread;
use std::time::Duration;

use bubbles_core::bridge::CallbackRegistry;
use bubbles_core::config::{ClientConfig, HeadlessConfig};
use bubbles_core::cursor::TouchPhase;
use bubbles_core::loopback::LoopbackEngine;
use bubbles_render::{RecordingRenderer, RenderContext};
use kurbo::{Point, Rect, Vec2};
use peniko::Color;
use serde::Serialize;

use crate::controller::CanvasController;
use crate::error::ClientResult;

/// What a headless run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeadlessSummary {
    pub ticks: u32,
    pub frames_rendered: u32,
    /// Peers drawn in the last rendered frame.
    pub peers_drawn: usize,
    /// Frames whose peer enumeration hit the fuse.
    pub overruns: u32,
    pub moves_sent: usize,
    pub session_exited: bool,
}

impl fmt::Display for HeadlessSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ticks, {} frames rendered, {} peers, {} overruns, {} moves sent",
            self.ticks, self.frames_rendered, self.peers_drawn, self.overruns, self.moves_sent
        )
    }
}

/// Load the configuration at `path`, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> ClientResult<ClientConfig> {
    match path {
        Some(path) => {
            log::info!("Loading configuration from {}", path.display());
            Ok(ClientConfig::load(path)?)
        }
        None => {
            log::info!("No configuration given, using defaults");
            Ok(ClientConfig::default())
        }
    }
}

/// Touch event replayed at `tick` of a run of `total` ticks.
///
/// The gesture presses at the canvas center a quarter into the run, drags
/// towards the bottom-right corner, and lifts at the halfway mark.
pub fn scripted_touch(tick: u32, total: u32, viewport: Rect) -> Option<(TouchPhase, Point)> {
    let begin = total / 4;
    let end = total / 2;
    if end <= begin || tick < begin || tick > end {
        return None;
    }
    let progress = f64::from(tick - begin) / f64::from(end - begin);
    let reach = Vec2::new(viewport.width() / 4.0, viewport.height() / 4.0);
    let point = viewport.center() + reach * progress;
    let phase = if tick == begin {
        TouchPhase::Began
    } else if tick == end {
        TouchPhase::Ended
    } else {
        TouchPhase::Moved
    };
    Some((phase, point))
}

/// Run the client headless until `frames` ticks have passed or the session ends.
pub fn run(config: &ClientConfig) -> ClientResult<HeadlessSummary> {
    config.validate()?;
    let headless: &HeadlessConfig = &config.headless;

    let engine = LoopbackEngine::new(headless.local_color).with_peers(headless.peers.clone());
    let registry = CallbackRegistry::new();
    let mut controller = CanvasController::new(engine, registry.register(), &config.canvas)?;
    controller.start(&config.session)?;

    let viewport = Rect::new(0.0, 0.0, headless.viewport_width, headless.viewport_height);
    let ctx = RenderContext::new(viewport).with_background(Color::from_rgba8(250, 250, 250, 255));
    let mut renderer = RecordingRenderer::new();
    let interval = Duration::from_millis(headless.frame_interval_ms);
    let mut summary = HeadlessSummary::default();

    for tick in 0..headless.frames {
        controller.process_engine_events();
        if controller.has_exited() {
            break;
        }
        summary.ticks += 1;

        if headless.scripted_touch {
            if let Some((phase, point)) = scripted_touch(tick, headless.frames, viewport) {
                controller.on_touch(phase, point, viewport);
            }
        }

        if controller.take_redraw() {
            match controller.render(&mut renderer, &ctx) {
                Ok(report) => {
                    summary.frames_rendered += 1;
                    summary.peers_drawn = report.peers_drawn;
                    if report.overrun.is_some() {
                        summary.overruns += 1;
                    }
                    log::debug!(
                        "Tick {}: drew {} peers, local at {:?}",
                        tick,
                        report.peers_drawn,
                        controller.position()
                    );
                }
                Err(e) => log::warn!("Tick {}: frame skipped: {}", tick, e),
            }
        }

        if !interval.is_zero() {
            thread::sleep(interval);
        }
    }

    summary.moves_sent = controller.engine().stats().moves.len();
    controller.engine_mut().shutdown();
    controller.process_engine_events();
    summary.session_exited = controller.has_exited();

    log::info!("Headless run finished: {}", summary);
    Ok(summary)
}
