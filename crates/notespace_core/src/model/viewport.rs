//! Viewport (pan offset + zoom percentage) record.
//!
//! # Invariants
//! - `zoom` is an integer percentage inside `[MIN_ZOOM, MAX_ZOOM]`; every
//!   write path clamps instead of rejecting.
//! - The offset is a plain screen-space translation; it is not scaled by zoom.
//! - `new` and `apply` keep offsets finite; non-finite values are dropped.

/// Smallest zoom percentage.
pub const MIN_ZOOM: u16 = 1;
/// Largest zoom percentage.
pub const MAX_ZOOM: u16 = 250;
/// Zoom at which notes are drawn at their base size.
pub const DEFAULT_ZOOM: u16 = 100;

/// Clamps any integer zoom request into `[MIN_ZOOM, MAX_ZOOM]`.
pub fn clamp_zoom(value: i64) -> u16 {
    // Fits in u16 after the clamp.
    value.clamp(i64::from(MIN_ZOOM), i64::from(MAX_ZOOM)) as u16
}

/// Pan/zoom state of the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub offset_x: f64,
    pub offset_y: f64,
    zoom: u16,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            zoom: DEFAULT_ZOOM,
        }
    }
}

impl Viewport {
    /// Builds a viewport, clamping `zoom`. Non-finite offsets become `0`.
    pub fn new(offset_x: f64, offset_y: f64, zoom: i64) -> Self {
        Self {
            offset_x: finite_or_zero(offset_x),
            offset_y: finite_or_zero(offset_y),
            zoom: clamp_zoom(zoom),
        }
    }

    pub fn zoom(&self) -> u16 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: i64) {
        self.zoom = clamp_zoom(zoom);
    }

    /// Merges the fields present in `patch`; non-finite offsets are skipped.
    pub fn apply(&mut self, patch: ViewportPatch) {
        if let Some(offset_x) = patch.offset_x.filter(|value| value.is_finite()) {
            self.offset_x = offset_x;
        }
        if let Some(offset_y) = patch.offset_y.filter(|value| value.is_finite()) {
            self.offset_y = offset_y;
        }
        if let Some(zoom) = patch.zoom {
            self.set_zoom(zoom);
        }
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Partial viewport update; `None` fields are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewportPatch {
    pub offset_x: Option<f64>,
    pub offset_y: Option<f64>,
    pub zoom: Option<i64>,
}

impl ViewportPatch {
    pub fn offset(offset_x: f64, offset_y: f64) -> Self {
        Self {
            offset_x: Some(offset_x),
            offset_y: Some(offset_y),
            zoom: None,
        }
    }

    pub fn zoom(zoom: i64) -> Self {
        Self {
            zoom: Some(zoom),
            ..Self::default()
        }
    }
}
