//! Pan/zoom viewport and screen ↔ world conversions.
//!
//! `pan` is in screen pixels, `scale` is the zoom factor (1.0 = 100%):
//!
//! ```text
//! world  = (screen - pan) / scale
//! screen = world * scale + pan
//! ```
//!
//! A zero scale is treated as 1 everywhere a division happens so that NaN or
//! infinity never leaks into entity geometry.

use crate::config::ScaleLimits;
use crate::geometry::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub scale: f64,
    pub pan: Point,
    /// Content-box size of the hosting element, in screen pixels.
    pub size: Size,
    #[serde(default)]
    pub limits: ScaleLimits,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            pan: Point::ORIGIN,
            size: Size::new(800.0, 600.0),
            limits: ScaleLimits::default(),
        }
    }
}

impl Viewport {
    #[must_use]
    pub fn new(size: Size, limits: ScaleLimits) -> Self {
        Self {
            size,
            limits,
            ..Self::default()
        }
    }

    /// Scale usable as a divisor.
    pub fn safe_scale(&self) -> f64 {
        if self.scale == 0.0 || !self.scale.is_finite() {
            1.0
        } else {
            self.scale
        }
    }

    pub fn screen_to_world(&self, screen: Point) -> Point {
        let s = self.safe_scale();
        Point::new((screen.x - self.pan.x) / s, (screen.y - self.pan.y) / s)
    }

    pub fn world_to_screen(&self, world: Point) -> Point {
        Point::new(
            world.x * self.scale + self.pan.x,
            world.y * self.scale + self.pan.y,
        )
    }

    /// Convert a screen-space delta (pointer travel) to world units.
    pub fn screen_delta_to_world(&self, delta: Point) -> Point {
        let s = self.safe_scale();
        Point::new(delta.x / s, delta.y / s)
    }

    pub fn screen_dist_to_world(&self, dist: f64) -> f64 {
        dist / self.safe_scale()
    }

    pub fn center_screen(&self) -> Point {
        Point::new(self.size.width / 2.0, self.size.height / 2.0)
    }

    /// Rescale while keeping the world point under `focus` fixed on screen.
    ///
    /// `focus` defaults to the viewport center. The updater's result is
    /// clamped to the scale limits; if that leaves the scale unchanged the
    /// viewport is returned as-is (pan included).
    #[must_use]
    pub fn adjust_scale(&self, updater: impl FnOnce(f64) -> f64, focus: Option<Point>) -> Self {
        let prev = self.safe_scale();
        let next = self.limits.clamp(updater(prev));
        if next == self.scale {
            return *self;
        }
        let focus = focus.unwrap_or_else(|| self.center_screen());
        let world_at_focus = Point::new((focus.x - self.pan.x) / prev, (focus.y - self.pan.y) / prev);
        Self {
            scale: next,
            pan: Point::new(
                focus.x - world_at_focus.x * next,
                focus.y - world_at_focus.y * next,
            ),
            ..*self
        }
    }

    #[must_use]
    pub fn zoom_by(&self, factor: f64, focus: Option<Point>) -> Self {
        self.adjust_scale(|s| s * factor, focus)
    }

    /// Back to 100%, centered.
    #[must_use]
    pub fn reset_zoom(&self) -> Self {
        self.adjust_scale(|_| 1.0, None)
    }

    /// Shift the pan by a screen-space delta.
    #[must_use]
    pub fn pan_by(&self, dx: f64, dy: f64) -> Self {
        Self {
            pan: Point::new(self.pan.x + dx, self.pan.y + dy),
            ..*self
        }
    }

    /// Pan so `world` sits at the viewport center without changing scale.
    #[must_use]
    pub fn center_on(&self, world: Point) -> Self {
        let c = self.center_screen();
        Self {
            pan: Point::new(c.x - world.x * self.scale, c.y - world.y * self.scale),
            ..*self
        }
    }

    /// Record the host element's observed content box.
    pub fn set_size(&mut self, width: f64, height: f64) {
        let sanitize = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
        self.size = Size::new(sanitize(width), sanitize(height));
    }

    /// World-space rectangle currently visible.
    pub fn visible_world_rect(&self) -> Rect {
        let origin = self.screen_to_world(Point::ORIGIN);
        let s = self.safe_scale();
        Rect::new(
            origin.x,
            origin.y,
            self.size.width / s,
            self.size.height / s,
        )
    }
}
