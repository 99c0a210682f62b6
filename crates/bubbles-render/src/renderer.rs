//! Renderer trait abstraction.

use kurbo::{Circle, Point, Rect};
use peniko::Color;

/// Which participant a bubble stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleKind {
    /// The local cursor.
    Local,
    /// Another participant in the room.
    Remote,
}

/// A filled, outlined circle in screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bubble {
    pub kind: BubbleKind,
    /// Center in screen pixels.
    pub center: Point,
    /// Diameter in screen pixels.
    pub diameter: f64,
    /// Fill and outline color.
    pub color: Color,
    /// Outline width in screen pixels.
    pub stroke_width: f64,
}

impl Bubble {
    /// The circle to fill and stroke.
    pub fn circle(&self) -> Circle {
        Circle::new(self.center, self.diameter / 2.0)
    }
}

/// Context for a single render frame.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext {
    /// Canvas rectangle in screen pixels.
    pub viewport: Rect,
    /// Background color.
    pub background_color: Color,
}

impl RenderContext {
    /// Create a new render context.
    pub fn new(viewport: Rect) -> Self {
        Self {
            viewport,
            background_color: Color::WHITE,
        }
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }
}

/// Trait for rendering backends.
pub trait Renderer: Send + Sync {
    /// Start a new frame, discarding whatever the previous one drew.
    fn begin_frame(&mut self, ctx: &RenderContext);

    /// Draw one bubble on top of everything drawn so far this frame.
    fn draw_bubble(&mut self, bubble: &Bubble);

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.background_color
    }
}

/// Renderer that keeps the bubbles of the last frame in draw order.
///
/// Used by the headless runner and by tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    frames: u64,
    bubbles: Vec<Bubble>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames begun so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Bubbles drawn in the current frame, in draw order.
    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    /// The local bubble of the current frame, if drawn.
    pub fn local(&self) -> Option<&Bubble> {
        self.bubbles.iter().find(|b| b.kind == BubbleKind::Local)
    }

    /// Remote bubbles of the current frame.
    pub fn remotes(&self) -> impl Iterator<Item = &Bubble> {
        self.bubbles.iter().filter(|b| b.kind == BubbleKind::Remote)
    }
}

impl Renderer for RecordingRenderer {
    fn begin_frame(&mut self, _ctx: &RenderContext) {
        self.frames += 1;
        self.bubbles.clear();
    }

    fn draw_bubble(&mut self, bubble: &Bubble) {
        self.bubbles.push(*bubble);
    }
}
