//! Bubbles Core Library
//!
//! Platform-agnostic client core for the bubbles shared canvas: coordinate
//! mapping, local cursor authority, redraw coalescing, the session engine
//! boundary and the callback bridge between engine and controller.

pub mod bridge;
pub mod config;
pub mod cursor;
pub mod engine;
pub mod loopback;
pub mod redraw;
pub mod transform;

pub use bridge::{BridgeError, CallbackRegistry, ControllerHandle, EngineEvent, Mailbox, Waker};
pub use config::{CanvasConfig, ClientConfig, ConfigError, HeadlessConfig, SessionConfig};
pub use cursor::{Authority, CursorChange, LocalCursor, TouchPhase};
pub use engine::{EngineError, PlotSession, PlotSource, RemotePeer, SessionEngine};
pub use loopback::LoopbackEngine;
pub use redraw::RedrawSignal;
pub use transform::{CoordinateTransform, LogicalPoint, TransformError, pack_rgb, unpack_rgb};
