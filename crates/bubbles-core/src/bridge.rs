//! Callback bridge between the engine and a canvas controller.
//!
//! The engine holds an opaque [`ControllerHandle`] plus one callback per event
//! kind. It never holds the controller. Each callback resolves the handle
//! through the [`CallbackRegistry`] and posts a typed [`EngineEvent`] into the
//! controller's [`Mailbox`]. The controller drains the mailbox from its own
//! rendering context, so nothing the callbacks touch is shared with rendering.

use std::collections::HashMap;
use std::fmt;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::engine::{AutopilotCallback, ExitCallback, RedrawCallback, SessionEngine};
use crate::transform::LogicalPoint;

/// Opaque, non-owning reference to a registered controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControllerHandle(u64);

impl ControllerHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ControllerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "controller#{}", self.0)
    }
}

/// Events delivered from the engine to a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// The session has permanently ended. Always the last event.
    SessionExited,
    /// Visual state changed; the canvas should be redrawn.
    RedrawRequested,
    /// Autopilot moved the local cursor.
    AutopilotMoved(LogicalPoint),
}

/// Bridge errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("Stale callback reference: {0} is not registered or has exited")]
    StaleCallbackReference(ControllerHandle),
}

/// Host hook asking the host loop to return to the rendering context.
///
/// Invoked after an event was posted. It must only schedule work, never render.
pub type Waker = Arc<dyn Fn() + Send + Sync>;

struct Slot {
    sender: Sender<EngineEvent>,
    exited: bool,
    waker: Option<Waker>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    slots: HashMap<ControllerHandle, Slot>,
}

/// The three engine-facing callbacks for one controller.
pub struct EngineCallbacks {
    pub on_exit: ExitCallback,
    pub on_redraw: RedrawCallback,
    pub on_autopilot: AutopilotCallback,
}

/// Maps controller handles to their mailboxes.
///
/// Cloning shares the same registry.
#[derive(Clone, Default)]
pub struct CallbackRegistry {
    inner: Arc<Mutex<Registry>>,
}

impl CallbackRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        // The map stays consistent even if a holder panicked.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new controller and return its mailbox.
    pub fn register(&self) -> Mailbox {
        self.register_slot(None)
    }

    /// Register a new controller whose host loop is woken on every delivery.
    pub fn register_with_waker(&self, waker: Waker) -> Mailbox {
        self.register_slot(Some(waker))
    }

    fn register_slot(&self, waker: Option<Waker>) -> Mailbox {
        let (sender, receiver) = channel();
        let handle = {
            let mut registry = self.lock();
            registry.next_id += 1;
            let handle = ControllerHandle(registry.next_id);
            registry.slots.insert(
                handle,
                Slot {
                    sender,
                    exited: false,
                    waker,
                },
            );
            handle
        };
        log::debug!("Registered {}", handle);
        Mailbox {
            handle,
            receiver,
            registry: self.clone(),
        }
    }

    /// Remove a controller. Returns false if it was not registered.
    pub fn deregister(&self, handle: ControllerHandle) -> bool {
        let removed = self.lock().slots.remove(&handle).is_some();
        if removed {
            log::debug!("Deregistered {}", handle);
        }
        removed
    }

    /// Check if a handle is registered (exited or not).
    pub fn is_registered(&self, handle: ControllerHandle) -> bool {
        self.lock().slots.contains_key(&handle)
    }

    /// Number of registered controllers.
    pub fn len(&self) -> usize {
        self.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Post an event to the controller behind `handle`.
    ///
    /// Fails for unregistered handles and for handles that already received
    /// [`EngineEvent::SessionExited`].
    pub fn dispatch(&self, handle: ControllerHandle, event: EngineEvent) -> Result<(), BridgeError> {
        let waker = {
            let mut registry = self.lock();
            let slot = registry
                .slots
                .get_mut(&handle)
                .filter(|slot| !slot.exited)
                .ok_or(BridgeError::StaleCallbackReference(handle))?;
            slot.sender
                .send(event)
                .map_err(|_| BridgeError::StaleCallbackReference(handle))?;
            if event == EngineEvent::SessionExited {
                slot.exited = true;
            }
            slot.waker.clone()
        };
        if let Some(wake) = waker {
            wake();
        }
        Ok(())
    }

    /// Dispatch from the engine side. A stale handle is a programming error.
    fn deliver(&self, handle: ControllerHandle, event: EngineEvent) {
        if let Err(err) = self.dispatch(handle, event) {
            log::error!("Dropping {:?}: {}", event, err);
            panic!("{}", err);
        }
    }

    /// Build the engine-facing callbacks for a registered controller.
    pub fn callbacks(&self, handle: ControllerHandle) -> EngineCallbacks {
        let exit_registry = self.clone();
        let redraw_registry = self.clone();
        let autopilot_registry = self.clone();
        log::trace!("Building engine callbacks for {}", handle);
        EngineCallbacks {
            on_exit: Arc::new(move |h| exit_registry.deliver(h, EngineEvent::SessionExited)),
            on_redraw: Arc::new(move |h| redraw_registry.deliver(h, EngineEvent::RedrawRequested)),
            on_autopilot: Arc::new(move |h, x, y| {
                autopilot_registry.deliver(h, EngineEvent::AutopilotMoved(LogicalPoint::new(x, y)))
            }),
        }
    }

    /// Register the callbacks for `handle` with an engine.
    pub fn attach<E: SessionEngine + ?Sized>(&self, handle: ControllerHandle, engine: &mut E) {
        let callbacks = self.callbacks(handle);
        engine.register_on_exit(handle, callbacks.on_exit);
        engine.register_on_redraw(handle, callbacks.on_redraw);
        engine.register_on_autopilot_move(handle, callbacks.on_autopilot);
    }
}

/// Receiving side of a controller registration.
///
/// Dropping the mailbox deregisters the controller.
pub struct Mailbox {
    handle: ControllerHandle,
    receiver: Receiver<EngineEvent>,
    registry: CallbackRegistry,
}

impl Mailbox {
    pub fn handle(&self) -> ControllerHandle {
        self.handle
    }

    /// The registry this mailbox belongs to.
    pub fn registry(&self) -> &CallbackRegistry {
        &self.registry
    }

    /// Drain pending events in arrival order (non-blocking).
    pub fn poll_events(&self) -> Vec<EngineEvent> {
        self.receiver.try_iter().collect()
    }
}

impl Drop for Mailbox {
    fn drop(&mut self) {
        self.registry.deregister(self.handle);
    }
}
