//! Coordinate spaces and the viewport transform
//!
//! Three spaces are in play:
//! - **Screen**: pointer coordinates relative to the viewport's top-left corner
//! - **World**: screen space with pan/zoom removed, `(screen - translate) / scale`
//! - **Normalized**: percentages of the canvas size, the space node positions
//!   are stored in
//!
//! Each space has its own point type so a screen coordinate can never be fed
//! where a normalized one is expected.

mod grid;

pub use grid::{column_label, grid_cell, snap_to_grid, GridCell, GRID_COLUMNS, GRID_ROWS, GRID_STEP};

use crate::error::{finite, Axis, TopologyError};
use serde::{Deserialize, Serialize};

/// Smallest zoom factor
pub const MIN_SCALE: f64 = 0.1;
/// Largest zoom factor
pub const MAX_SCALE: f64 = 5.0;
/// Zoom factor applied per wheel notch
pub const WHEEL_ZOOM_STEP: f64 = 1.1;
/// Dragged nodes stay inside `[DRAG_MIN, DRAG_MAX]` on both axes
pub const DRAG_MIN: f64 = 2.0;
/// See [`DRAG_MIN`]
pub const DRAG_MAX: f64 = 98.0;

/// Pointer position relative to the viewport element
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Position in the panned/zoomed world
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
}

impl WorldPoint {
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Position as a percentage of the canvas, `[0, 100]` on both axes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Fails with `InvalidCoordinate` if either component is not finite
    pub fn checked(self) -> Result<Self, TopologyError> {
        Ok(Self {
            x: finite(Axis::X, self.x)?,
            y: finite(Axis::Y, self.y)?,
        })
    }
}

/// Rendered size of the canvas container, in world units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl CanvasSize {
    #[inline]
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::new(1920.0, 1080.0)
    }
}

/// Pan and zoom applied to the world layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportTransform {
    scale: f64,
    translate_x: f64,
    translate_y: f64,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
        }
    }
}

impl ViewportTransform {
    #[inline]
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Current translation as a screen-space offset
    #[inline]
    #[must_use]
    pub fn translate(&self) -> ScreenPoint {
        ScreenPoint::new(self.translate_x, self.translate_y)
    }

    #[inline]
    #[must_use]
    pub fn screen_to_world(&self, p: ScreenPoint) -> WorldPoint {
        WorldPoint::new(
            (p.x - self.translate_x) / self.scale,
            (p.y - self.translate_y) / self.scale,
        )
    }

    #[inline]
    #[must_use]
    pub fn world_to_screen(&self, p: WorldPoint) -> ScreenPoint {
        ScreenPoint::new(
            p.x * self.scale + self.translate_x,
            p.y * self.scale + self.translate_y,
        )
    }

    /// Zoom by `factor` keeping `anchor` visually fixed
    ///
    /// The resulting scale is clamped to `[MIN_SCALE, MAX_SCALE]`, and the
    /// translation is recomputed from the clamped scale so the world point
    /// under the anchor does not move. Non-finite or non-positive factors
    /// are ignored.
    pub fn zoom_at(&mut self, anchor: ScreenPoint, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 || !anchor.x.is_finite() || !anchor.y.is_finite() {
            tracing::warn!(factor, ?anchor, "ignoring zoom with invalid input");
            return;
        }
        let next = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        let ratio = next / self.scale;
        self.translate_x = anchor.x - (anchor.x - self.translate_x) * ratio;
        self.translate_y = anchor.y - (anchor.y - self.translate_y) * ratio;
        self.scale = next;
    }

    /// Apply one wheel notch at `anchor`
    ///
    /// Scrolling up (`delta_y < 0`) zooms in, scrolling down zooms out.
    pub fn wheel(&mut self, anchor: ScreenPoint, delta_y: f64) {
        if delta_y < 0.0 {
            self.zoom_at(anchor, WHEEL_ZOOM_STEP);
        } else if delta_y > 0.0 {
            self.zoom_at(anchor, WHEEL_ZOOM_STEP.recip());
        }
    }

    /// Shift the translation by a screen-space delta
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        if dx.is_finite() && dy.is_finite() {
            self.translate_x += dx;
            self.translate_y += dy;
        }
    }

    /// Set the translation outright
    pub fn pan_to(&mut self, translate: ScreenPoint) {
        if translate.x.is_finite() && translate.y.is_finite() {
            self.translate_x = translate.x;
            self.translate_y = translate.y;
        }
    }

    /// Back to scale 1 with no translation
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Convert a world point into canvas percentages
///
/// A zero-sized canvas yields non-finite values, which are reported as
/// `InvalidCoordinate`.
pub fn world_to_normalized(p: WorldPoint, canvas: CanvasSize) -> Result<NormalizedPoint, TopologyError> {
    NormalizedPoint::new(p.x / canvas.width * 100.0, p.y / canvas.height * 100.0).checked()
}

#[inline]
#[must_use]
pub fn normalized_to_world(p: NormalizedPoint, canvas: CanvasSize) -> WorldPoint {
    WorldPoint::new(p.x / 100.0 * canvas.width, p.y / 100.0 * canvas.height)
}

/// Clamp a normalized point into the draggable band `[DRAG_MIN, DRAG_MAX]`
pub fn clamp_normalized(p: NormalizedPoint) -> Result<NormalizedPoint, TopologyError> {
    let p = p.checked()?;
    Ok(NormalizedPoint::new(
        p.x.clamp(DRAG_MIN, DRAG_MAX),
        p.y.clamp(DRAG_MIN, DRAG_MAX),
    ))
}
