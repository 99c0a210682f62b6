//! Bubbles Render Library
//!
//! Renderer abstraction and per-frame drawing for the bubbles canvas.
//! The default backend uses Vello for GPU-accelerated rendering.

mod frame;
mod renderer;

#[cfg(feature = "vello-renderer")]
mod vello_impl;

pub use frame::{FrameError, FrameRenderer, FrameReport};
pub use renderer::{Bubble, BubbleKind, RecordingRenderer, RenderContext, Renderer};

#[cfg(feature = "vello-renderer")]
pub use vello_impl::VelloRenderer;
