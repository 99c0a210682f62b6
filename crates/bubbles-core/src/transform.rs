//! Screen/logical coordinate transforms and packed color decoding.
//!
//! The session engine works in an integer coordinate space whose origin is the
//! canvas center. Touch input and drawing happen in device pixels whose origin
//! is the top-left corner of the canvas. The canvas may resize between frames,
//! so every conversion takes the current extent instead of caching one.

use kurbo::{Point, Rect, Size, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transform errors.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TransformError {
    #[error("Invalid canvas extent: {width}x{height}")]
    InvalidExtent { width: f64, height: f64 },
}

/// A point in the engine's logical coordinate space (canvas-center origin).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicalPoint {
    pub x: i32,
    pub y: i32,
}

impl LogicalPoint {
    /// The canvas center.
    pub const ORIGIN: LogicalPoint = LogicalPoint { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for LogicalPoint {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

fn check_extent(extent: Size) -> Result<(), TransformError> {
    let valid = extent.width.is_finite()
        && extent.height.is_finite()
        && extent.width > 0.0
        && extent.height > 0.0;
    if valid {
        Ok(())
    } else {
        Err(TransformError::InvalidExtent {
            width: extent.width,
            height: extent.height,
        })
    }
}

/// Maps between screen offsets and logical points.
///
/// Without a logical extent one logical unit equals one pixel. With a logical
/// extent the canvas spans exactly that many logical units on each axis, so
/// every participant sees the same shared space regardless of screen size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CoordinateTransform {
    logical_extent: Option<Size>,
}

impl CoordinateTransform {
    /// Create a pixel-for-unit transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transform that scales the canvas onto a fixed logical extent.
    ///
    /// Screen round-trips stay within one pixel only while the logical extent
    /// is at least the canvas extent. Below that, the error grows to half a
    /// logical unit measured in pixels.
    pub fn with_logical_extent(extent: Size) -> Result<Self, TransformError> {
        check_extent(extent)?;
        Ok(Self {
            logical_extent: Some(extent),
        })
    }

    /// The configured logical extent, if any.
    pub fn logical_extent(&self) -> Option<Size> {
        self.logical_extent
    }

    /// Logical units per pixel on each axis for the given canvas extent.
    fn scale(&self, canvas_extent: Size) -> Result<Vec2, TransformError> {
        check_extent(canvas_extent)?;
        Ok(match self.logical_extent {
            Some(logical) => Vec2::new(
                logical.width / canvas_extent.width,
                logical.height / canvas_extent.height,
            ),
            None => Vec2::new(1.0, 1.0),
        })
    }

    /// Convert an offset from the canvas center into a logical point.
    pub fn to_logical(
        &self,
        screen_offset: Vec2,
        canvas_extent: Size,
    ) -> Result<LogicalPoint, TransformError> {
        let scale = self.scale(canvas_extent)?;
        // `as` saturates at the i32 bounds
        Ok(LogicalPoint {
            x: (screen_offset.x * scale.x).round() as i32,
            y: (screen_offset.y * scale.y).round() as i32,
        })
    }

    /// Convert a logical point into an offset from the canvas center.
    pub fn to_screen(
        &self,
        point: LogicalPoint,
        canvas_extent: Size,
    ) -> Result<Vec2, TransformError> {
        let scale = self.scale(canvas_extent)?;
        Ok(Vec2::new(
            f64::from(point.x) / scale.x,
            f64::from(point.y) / scale.y,
        ))
    }

    /// Convert a screen point into a logical point, relative to the viewport center.
    ///
    /// The viewport is the canvas rectangle in screen space; its center need not
    /// coincide with the screen origin.
    pub fn screen_to_logical(
        &self,
        screen_point: Point,
        viewport: Rect,
    ) -> Result<LogicalPoint, TransformError> {
        self.to_logical(screen_point - viewport.center(), viewport.size())
    }

    /// Convert a logical point into a screen point inside the viewport.
    pub fn logical_to_screen(
        &self,
        point: LogicalPoint,
        viewport: Rect,
    ) -> Result<Point, TransformError> {
        let offset = self.to_screen(point, viewport.size())?;
        Ok(viewport.center() + offset)
    }

    /// Validate a viewport without converting anything.
    pub fn check_viewport(&self, viewport: Rect) -> Result<(), TransformError> {
        check_extent(viewport.size())
    }
}

/// Decode a packed `0xRRGGBB` color. The top byte is ignored.
pub fn unpack_rgb(packed: u32) -> Color {
    let r = ((packed >> 16) & 0xff) as f32 / 255.0;
    let g = ((packed >> 8) & 0xff) as f32 / 255.0;
    let b = (packed & 0xff) as f32 / 255.0;
    Color::new([r, g, b, 1.0])
}

/// Pack a color into `0xRRGGBB`, dropping alpha.
pub fn pack_rgb(color: Color) -> u32 {
    let rgba = color.to_rgba8();
    (u32::from(rgba.r) << 16) | (u32::from(rgba.g) << 8) | u32::from(rgba.b)
}
