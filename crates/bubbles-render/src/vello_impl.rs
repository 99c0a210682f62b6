//! Vello-based renderer implementation.

use kurbo::{Affine, Stroke};
use peniko::{Color, Fill};
use vello::Scene;

use crate::renderer::{Bubble, RenderContext, Renderer};

/// Vello-based renderer for GPU-accelerated 2D graphics.
pub struct VelloRenderer {
    /// The Vello scene being built.
    scene: Scene,
    /// Background of the current frame.
    background_color: Color,
}

impl Default for VelloRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl VelloRenderer {
    /// Create a new Vello renderer.
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
            background_color: Color::WHITE,
        }
    }

    /// Get the built scene for rendering.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Take ownership of the scene (resets internal scene).
    pub fn take_scene(&mut self) -> Scene {
        std::mem::take(&mut self.scene)
    }

    /// Background color to clear the target with.
    pub fn clear_color(&self) -> Color {
        self.background_color
    }
}

impl Renderer for VelloRenderer {
    fn begin_frame(&mut self, ctx: &RenderContext) {
        self.scene.reset();
        self.background_color = ctx.background_color;
    }

    fn draw_bubble(&mut self, bubble: &Bubble) {
        let circle = bubble.circle();
        self.scene
            .fill(Fill::NonZero, Affine::IDENTITY, bubble.color, None, &circle);
        if bubble.stroke_width > 0.0 {
            let stroke = Stroke::new(bubble.stroke_width);
            self.scene
                .stroke(&stroke, Affine::IDENTITY, bubble.color, None, &circle);
        }
    }
}
