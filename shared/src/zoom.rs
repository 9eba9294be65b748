use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_ZOOM_EXTENT, WHEEL_LINE_FACTOR, WHEEL_PAGE_FACTOR, WHEEL_PIXEL_FACTOR};

/// Pan plus uniform scale applied on top of the projection: `screen = point * k + (x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomTransform {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ZoomTransform {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        k: 1.0,
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Projected coordinates to screen coordinates.
    pub fn apply(&self, [px, py]: [f64; 2]) -> [f64; 2] {
        [px * self.k + self.x, py * self.k + self.y]
    }

    /// Screen coordinates back to projected coordinates.
    pub fn invert(&self, [sx, sy]: [f64; 2]) -> [f64; 2] {
        [(sx - self.x) / self.k, (sy - self.y) / self.k]
    }
}

/// Browser `WheelEvent.deltaMode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WheelDeltaMode {
    #[default]
    Pixel,
    Line,
    Page,
}

impl WheelDeltaMode {
    pub fn from_dom(mode: u32) -> Self {
        match mode {
            1 => Self::Line,
            2 => Self::Page,
            _ => Self::Pixel,
        }
    }

    fn factor(self) -> f64 {
        match self {
            Self::Pixel => WHEEL_PIXEL_FACTOR,
            Self::Line => WHEEL_LINE_FACTOR,
            Self::Page => WHEEL_PAGE_FACTOR,
        }
    }
}

/// Scale factor for one wheel event: `2^(-deltaY * mode_factor)`, ten times stronger with
/// ctrl held (trackpad pinch arrives as ctrl+wheel).
pub fn wheel_factor(delta_y: f64, mode: WheelDeltaMode, ctrl: bool) -> f64 {
    let boost = if ctrl { 10.0 } else { 1.0 };
    2f64.powf(-delta_y * mode.factor() * boost)
}

/// Owns the shared zoom transform and keeps `k` inside the scale extent. Translation is
/// unconstrained.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomController {
    transform: ZoomTransform,
    extent: [f64; 2],
}

/// Inverted extents are swapped; non-positive or non-finite ones fall back to the default.
fn usable_extent([min_k, max_k]: [f64; 2]) -> [f64; 2] {
    let positive = |k: f64| k.is_finite() && k > 0.0;
    if !(positive(min_k) && positive(max_k)) {
        tracing::warn!(min_k, max_k, "unusable zoom extent; using the default");
        return DEFAULT_ZOOM_EXTENT;
    }
    [min_k.min(max_k), min_k.max(max_k)]
}

impl Default for ZoomController {
    fn default() -> Self {
        Self::new(DEFAULT_ZOOM_EXTENT)
    }
}

impl ZoomController {
    pub fn new(extent: [f64; 2]) -> Self {
        Self {
            transform: ZoomTransform::IDENTITY,
            extent: usable_extent(extent),
        }
    }

    pub fn transform(&self) -> ZoomTransform {
        self.transform
    }

    pub fn extent(&self) -> [f64; 2] {
        self.extent
    }

    /// New extents only bind future gestures; the current transform is kept as is.
    pub fn set_extent(&mut self, extent: [f64; 2]) {
        self.extent = usable_extent(extent);
    }

    /// Set the scale to `k` (clamped) keeping the projected point under `anchor` fixed.
    pub fn scale_to(&mut self, k: f64, anchor: [f64; 2]) -> bool {
        if !k.is_finite() {
            return false;
        }
        let k = k.clamp(self.extent[0], self.extent[1]);
        let [px, py] = self.transform.invert(anchor);
        let next = ZoomTransform {
            x: anchor[0] - px * k,
            y: anchor[1] - py * k,
            k,
        };
        self.replace(next)
    }

    pub fn zoom_at(&mut self, factor: f64, anchor: [f64; 2]) -> bool {
        self.scale_to(self.transform.k * factor, anchor)
    }

    pub fn wheel(
        &mut self,
        delta_y: f64,
        mode: WheelDeltaMode,
        ctrl: bool,
        anchor: [f64; 2],
    ) -> bool {
        self.zoom_at(wheel_factor(delta_y, mode, ctrl), anchor)
    }

    /// Double-click doubles the scale, or halves it with shift held.
    pub fn double_click(&mut self, anchor: [f64; 2], shift: bool) -> bool {
        self.zoom_at(if shift { 0.5 } else { 2.0 }, anchor)
    }

    pub fn pan(&mut self, dx: f64, dy: f64) -> bool {
        let next = ZoomTransform {
            x: self.transform.x + dx,
            y: self.transform.y + dy,
            ..self.transform
        };
        self.replace(next)
    }

    /// Two-finger gesture: the scale follows the ratio of finger distances, and the gesture
    /// midpoint moves from `previous_mid` to `mid`.
    pub fn pinch(&mut self, distance_ratio: f64, previous_mid: [f64; 2], mid: [f64; 2]) -> bool {
        let scaled = self.zoom_at(distance_ratio, previous_mid);
        let panned = self.pan(mid[0] - previous_mid[0], mid[1] - previous_mid[1]);
        scaled || panned
    }

    pub fn reset(&mut self) -> bool {
        self.replace(ZoomTransform::IDENTITY)
    }

    fn replace(&mut self, next: ZoomTransform) -> bool {
        let changed = next != self.transform;
        self.transform = next;
        changed
    }
}
