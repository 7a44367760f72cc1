//! Typed coordinates for the two spaces a note lives in.
//!
//! - **Canvas space**: durable note positions, independent of pan and zoom.
//! - **Screen space**: pixels where elements are drawn, derived from canvas
//!   space plus the viewport offset.

/// Position in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CanvasPoint {
    pub x: f64,
    pub y: f64,
}

impl CanvasPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Position in screen space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - other`, still in screen units.
    pub fn minus(self, other: ScreenPoint) -> ScreenPoint {
        ScreenPoint::new(self.x - other.x, self.y - other.y)
    }
}

/// Visible area of the canvas element, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

impl ViewportSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}
