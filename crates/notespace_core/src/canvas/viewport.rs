//! Viewport transform math.
//!
//! Position and size are deliberately not one affine transform: screen
//! position is `offset + canvas` with no zoom factor, while a note's
//! displayed size scales with zoom.

use crate::model::coords::{CanvasPoint, ScreenPoint};
use crate::model::viewport::{clamp_zoom, Viewport};

/// Wheel delta units per zoom percentage point.
pub const WHEEL_ZOOM_DIVISOR: f64 = 10.0;

/// Displayed note edge length for `base_size` at `zoom` percent.
pub fn note_display_size(base_size: f64, zoom: u16) -> f64 {
    base_size * f64::from(zoom) / 100.0
}

pub fn to_screen(point: CanvasPoint, viewport: &Viewport) -> ScreenPoint {
    ScreenPoint::new(viewport.offset_x + point.x, viewport.offset_y + point.y)
}

pub fn to_canvas(point: ScreenPoint, viewport: &Viewport) -> CanvasPoint {
    CanvasPoint::new(point.x - viewport.offset_x, point.y - viewport.offset_y)
}

/// New zoom after a wheel event, clamped to the zoom range.
///
/// Zoom moves in whole percents. The step `wheel_delta_y / 10` is rounded
/// half away from zero, so `+5` and `-5` move one percent in opposite
/// directions and deltas under 5 units leave the zoom unchanged.
pub fn zoom_delta(current_zoom: u16, wheel_delta_y: f64) -> u16 {
    if !wheel_delta_y.is_finite() {
        return current_zoom;
    }
    // Saturating float-to-int cast before the clamp.
    let step = (wheel_delta_y / WHEEL_ZOOM_DIVISOR).round() as i64;
    clamp_zoom(i64::from(current_zoom).saturating_add(step))
}
