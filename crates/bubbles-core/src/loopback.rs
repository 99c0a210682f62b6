//! In-process session engine.
//!
//! Serves a fixed list of peers, records everything the core asks of it, and
//! optionally drives the local cursor from a background autopilot thread.
//! Used by the headless runner and by tests; it never touches the network.

use std::f64::consts::TAU;
use std::sync::mpsc::{RecvTimeoutError, Sender, channel};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::bridge::ControllerHandle;
use crate::config::SessionConfig;
use crate::engine::{
    AutopilotCallback, EngineError, ExitCallback, PlotSource, RedrawCallback, RemotePeer,
    SessionEngine,
};
use crate::transform::LogicalPoint;

/// Default delay between autopilot steps.
pub const DEFAULT_AUTOPILOT_INTERVAL: Duration = Duration::from_millis(50);

/// Radius of the autopilot orbit, in logical units.
const AUTOPILOT_RADIUS: f64 = 150.0;
/// Autopilot steps per full orbit.
const AUTOPILOT_STEPS: u32 = 120;

#[derive(Default)]
struct Callbacks {
    handle: Option<ControllerHandle>,
    on_exit: Option<ExitCallback>,
    on_redraw: Option<RedrawCallback>,
    on_autopilot: Option<AutopilotCallback>,
}

impl Callbacks {
    fn fire_redraw(&self) {
        if let (Some(handle), Some(cb)) = (self.handle, &self.on_redraw) {
            cb(handle);
        }
    }

    fn fire_autopilot(&self, position: LogicalPoint) {
        if let (Some(handle), Some(cb)) = (self.handle, &self.on_autopilot) {
            cb(handle, position.x, position.y);
        }
    }

    fn fire_exit(&self) {
        if let (Some(handle), Some(cb)) = (self.handle, &self.on_exit) {
            cb(handle);
        }
    }
}

type SharedCallbacks = Arc<Mutex<Callbacks>>;

fn lock(callbacks: &SharedCallbacks) -> MutexGuard<'_, Callbacks> {
    callbacks.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to the running autopilot thread.
struct Autopilot {
    stop_tx: Sender<()>,
    thread: JoinHandle<()>,
}

/// Counters describing how the core drove the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Every position passed to `move_to`, in order.
    pub moves: Vec<LogicalPoint>,
    pub plot_starts: usize,
    pub plot_dones: usize,
}

/// An engine that loops everything back in-process.
pub struct LoopbackEngine {
    peers: Vec<RemotePeer>,
    local_color: u32,
    autopilot_interval: Duration,
    start_failure: Option<EngineError>,
    started: bool,
    exited: bool,
    callbacks: SharedCallbacks,
    autopilot: Option<Autopilot>,
    snapshot: Vec<RemotePeer>,
    cursor: usize,
    stats: EngineStats,
}

impl LoopbackEngine {
    /// Create an engine with no peers that assigns `local_color` to the local participant.
    pub fn new(local_color: u32) -> Self {
        Self {
            peers: Vec::new(),
            local_color,
            autopilot_interval: DEFAULT_AUTOPILOT_INTERVAL,
            start_failure: None,
            started: false,
            exited: false,
            callbacks: Arc::new(Mutex::new(Callbacks::default())),
            autopilot: None,
            snapshot: Vec::new(),
            cursor: 0,
            stats: EngineStats::default(),
        }
    }

    /// Serve the given peers on every frame.
    pub fn with_peers(mut self, peers: Vec<RemotePeer>) -> Self {
        self.peers = peers;
        self
    }

    /// Set the delay between autopilot steps.
    pub fn with_autopilot_interval(mut self, interval: Duration) -> Self {
        self.autopilot_interval = interval;
        self
    }

    /// Make `start` fail with the given status.
    pub fn failing_start(mut self, code: i32, reason: &str) -> Self {
        self.start_failure = Some(EngineError::StartFailed {
            code,
            reason: reason.to_string(),
        });
        self
    }

    /// Replace the peers served from the next frame on.
    pub fn set_peers(&mut self, peers: Vec<RemotePeer>) {
        self.peers = peers;
        lock(&self.callbacks).fire_redraw();
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_autopilot_running(&self) -> bool {
        self.autopilot.is_some()
    }

    /// Fire the redraw callback, as the engine does when peer state changes.
    pub fn request_redraw(&self) {
        lock(&self.callbacks).fire_redraw();
    }

    /// Fire the autopilot callback synchronously, without a redraw.
    pub fn emit_autopilot(&self, position: LogicalPoint) {
        lock(&self.callbacks).fire_autopilot(position);
    }

    /// End the session: stop autopilot and fire the exit callback once.
    pub fn shutdown(&mut self) {
        if self.exited {
            return;
        }
        self.stop_autopilot();
        self.exited = true;
        log::info!("Loopback session ended");
        let mut callbacks = lock(&self.callbacks);
        callbacks.fire_exit();
        *callbacks = Callbacks::default();
    }

    fn spawn_autopilot(&mut self) {
        let (stop_tx, stop_rx) = channel::<()>();
        let callbacks = self.callbacks.clone();
        let interval = self.autopilot_interval;

        let thread = thread::spawn(move || {
            log::debug!("Autopilot thread started");
            let mut step: u32 = 0;
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
                let angle = TAU * f64::from(step % AUTOPILOT_STEPS) / f64::from(AUTOPILOT_STEPS);
                let position = LogicalPoint::new(
                    (AUTOPILOT_RADIUS * angle.cos()).round() as i32,
                    (AUTOPILOT_RADIUS * angle.sin()).round() as i32,
                );
                step = step.wrapping_add(1);

                let callbacks = lock(&callbacks);
                callbacks.fire_autopilot(position);
                callbacks.fire_redraw();
            }
            log::debug!("Autopilot thread exiting");
        });

        self.autopilot = Some(Autopilot { stop_tx, thread });
    }

    fn stop_autopilot(&mut self) {
        if let Some(autopilot) = self.autopilot.take() {
            let _ = autopilot.stop_tx.send(());
            if autopilot.thread.join().is_err() {
                log::error!("Autopilot thread panicked");
            }
        }
    }
}

impl PlotSource for LoopbackEngine {
    fn plot_start(&mut self) {
        self.snapshot.clone_from(&self.peers);
        self.cursor = 0;
        self.stats.plot_starts += 1;
    }

    fn plot_end(&self) -> bool {
        self.cursor >= self.snapshot.len()
    }

    fn plot_next(&mut self) {
        self.cursor += 1;
    }

    fn plot_x(&self) -> i32 {
        self.snapshot.get(self.cursor).map_or(0, |p| p.position.x)
    }

    fn plot_y(&self) -> i32 {
        self.snapshot.get(self.cursor).map_or(0, |p| p.position.y)
    }

    fn plot_color(&self) -> u32 {
        self.snapshot.get(self.cursor).map_or(0, |p| p.color)
    }

    fn plot_my_color(&self) -> u32 {
        self.local_color
    }

    fn plot_done(&mut self) {
        self.snapshot.clear();
        self.cursor = 0;
        self.stats.plot_dones += 1;
    }
}

impl SessionEngine for LoopbackEngine {
    fn start(&mut self, session: &SessionConfig) -> Result<(), EngineError> {
        if let Some(err) = self.start_failure.clone() {
            return Err(err);
        }
        if self.started {
            return Err(EngineError::StartFailed {
                code: -1,
                reason: "session already started".to_string(),
            });
        }
        log::info!(
            "Loopback session started: room={} endpoint={} secure={} compress={} auto_pilot={}",
            session.room,
            session.endpoint,
            session.secure,
            session.compress,
            session.auto_pilot
        );
        self.started = true;
        if session.auto_pilot {
            self.spawn_autopilot();
        }
        Ok(())
    }

    fn move_to(&mut self, x: i32, y: i32) {
        self.stats.moves.push(LogicalPoint::new(x, y));
    }

    fn register_on_exit(&mut self, handle: ControllerHandle, callback: ExitCallback) {
        let mut callbacks = lock(&self.callbacks);
        callbacks.handle = Some(handle);
        callbacks.on_exit = Some(callback);
    }

    fn register_on_redraw(&mut self, handle: ControllerHandle, callback: RedrawCallback) {
        let mut callbacks = lock(&self.callbacks);
        callbacks.handle = Some(handle);
        callbacks.on_redraw = Some(callback);
    }

    fn register_on_autopilot_move(&mut self, handle: ControllerHandle, callback: AutopilotCallback) {
        let mut callbacks = lock(&self.callbacks);
        callbacks.handle = Some(handle);
        callbacks.on_autopilot = Some(callback);
    }

    fn stop(&mut self) {
        self.stop_autopilot();
        *lock(&self.callbacks) = Callbacks::default();
    }
}

impl Drop for LoopbackEngine {
    fn drop(&mut self) {
        self.stop_autopilot();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{CallbackRegistry, EngineEvent};
    use crate::engine::PlotSession;

    fn peers() -> Vec<RemotePeer> {
        vec![
            RemotePeer { position: LogicalPoint::new(1, 1), color: 0x111111 },
            RemotePeer { position: LogicalPoint::new(2, 2), color: 0x222222 },
        ]
    }

    #[test]
    fn test_plot_serves_snapshot() {
        let mut engine = LoopbackEngine::new(0xabcdef).with_peers(peers());
        let mut seen = Vec::new();
        {
            let mut session = PlotSession::begin(&mut engine);
            assert_eq!(session.my_color(), 0xabcdef);
            while !session.is_finished() {
                seen.push(session.current());
                session.advance();
            }
        }
        assert_eq!(seen, peers());
        assert_eq!(engine.stats().plot_starts, 1);
        assert_eq!(engine.stats().plot_dones, 1);
    }

    #[test]
    fn test_start_once() {
        let mut engine = LoopbackEngine::new(0);
        let session = SessionConfig::default();
        assert!(engine.start(&session).is_ok());
        assert!(engine.is_started());
        assert!(engine.start(&session).is_err());
    }

    #[test]
    fn test_failing_start() {
        let mut engine = LoopbackEngine::new(0).failing_start(-1, "no route to host");
        let err = engine.start(&SessionConfig::default()).unwrap_err();
        assert_eq!(
            err,
            EngineError::StartFailed { code: -1, reason: "no route to host".to_string() }
        );
        assert!(!engine.is_started());
    }

    #[test]
    fn test_shutdown_fires_exit_once() {
        let registry = CallbackRegistry::new();
        let mailbox = registry.register();
        let mut engine = LoopbackEngine::new(0);
        registry.attach(mailbox.handle(), &mut engine);

        engine.shutdown();
        engine.shutdown();
        // Callbacks are gone after exit; this must not reach the registry.
        engine.request_redraw();

        assert_eq!(mailbox.poll_events(), vec![EngineEvent::SessionExited]);
    }

    #[test]
    fn test_autopilot_thread_delivers_through_mailbox() {
        let registry = CallbackRegistry::new();
        let mailbox = registry.register();
        let mut engine = LoopbackEngine::new(0).with_autopilot_interval(Duration::from_millis(1));
        registry.attach(mailbox.handle(), &mut engine);

        let session = SessionConfig { auto_pilot: true, ..SessionConfig::default() };
        engine.start(&session).unwrap();
        assert!(engine.is_autopilot_running());

        let mut events = Vec::new();
        for _ in 0..500 {
            events.extend(mailbox.poll_events());
            if events.iter().any(|e| matches!(e, EngineEvent::AutopilotMoved(_))) {
                break;
            }
            thread::sleep(Duration::from_millis(2));
        }
        engine.stop();
        assert!(!engine.is_autopilot_running());

        assert!(events.iter().any(|e| matches!(e, EngineEvent::AutopilotMoved(_))));
        assert!(events.contains(&EngineEvent::RedrawRequested));
    }

    #[test]
    fn test_moves_are_recorded() {
        let mut engine = LoopbackEngine::new(0);
        engine.move_to(-30, -100);
        engine.move_to(5, 6);
        assert_eq!(
            engine.stats().moves,
            vec![LogicalPoint::new(-30, -100), LogicalPoint::new(5, 6)]
        );
    }
}
