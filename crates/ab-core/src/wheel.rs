//! Wheel and trackpad handling for the viewport.
//!
//! A zoom-modifier wheel event zooms around the pointer; anything else pans.
//! Mouse-wheel notches arrive as large, sparse deltas and are normalised to a
//! fixed step with a velocity multiplier; trackpads deliver small continuous
//! deltas that already carry the platform's own acceleration and pass through.

use crate::config::WheelConfig;
use crate::geometry::Point;
use crate::viewport::Viewport;

/// A wheel event as delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelInput {
    /// Raw scroll delta (positive y = scroll down).
    pub delta: Point,
    /// Pointer position in screen space.
    pub pointer: Point,
    /// Ctrl/Meta held (or a pinch gesture reported as ctrl+wheel).
    pub zoom: bool,
    /// Shift held: vertical scroll pans horizontally.
    pub shift: bool,
    /// Host event timestamp in milliseconds.
    pub timestamp_ms: f64,
}

/// What a wheel event did to the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WheelAction {
    Zoom { factor: f64 },
    Pan { dx: f64, dy: f64 },
    Ignored,
}

/// Stateful wheel interpreter; owns the acceleration ramp.
#[derive(Debug, Clone)]
pub struct WheelTracker {
    config: WheelConfig,
    zoom_step_in: f64,
    zoom_step_out: f64,
    last_event_ms: Option<f64>,
    multiplier: f64,
}

impl WheelTracker {
    pub fn new(config: WheelConfig, zoom_step_in: f64, zoom_step_out: f64) -> Self {
        Self {
            config,
            zoom_step_in,
            zoom_step_out,
            last_event_ms: None,
            multiplier: 1.0,
        }
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    fn is_notch(&self, v: f64) -> bool {
        v.abs() >= self.config.notch_threshold
    }

    /// Advance the acceleration ramp for a notch arriving at `now_ms`.
    fn ramp(&mut self, now_ms: f64) -> f64 {
        let dt = self
            .last_event_ms
            .map_or(f64::INFINITY, |last| (now_ms - last).max(0.0));
        let c = &self.config;
        self.multiplier = if dt < c.fast_ms {
            (self.multiplier * c.fast_gain).min(c.max_multiplier)
        } else if dt < c.medium_ms {
            (self.multiplier * c.medium_gain).min(c.max_multiplier)
        } else if dt < c.slow_ms {
            self.multiplier
        } else {
            1.0
        };
        self.last_event_ms = Some(now_ms);
        self.multiplier
    }

    fn zoom_factor(&self, dy: f64) -> f64 {
        if self.is_notch(dy) {
            if dy < 0.0 {
                self.zoom_step_in
            } else {
                self.zoom_step_out
            }
        } else {
            self.zoom_step_in
                .powf(-dy / self.config.zoom_units_per_step.max(f64::EPSILON))
        }
    }

    /// Interpret `input` against `viewport`, returning the new viewport and
    /// what was done.
    pub fn apply(&mut self, viewport: &Viewport, input: &WheelInput) -> (Viewport, WheelAction) {
        let finite = input.delta.x.is_finite() && input.delta.y.is_finite();
        if !finite {
            log::warn!("ignoring non-finite wheel delta {:?}", input.delta);
            return (*viewport, WheelAction::Ignored);
        }

        if input.zoom {
            // Some hosts report horizontal pinch; fall back to x.
            let dy = if input.delta.y != 0.0 {
                input.delta.y
            } else {
                input.delta.x
            };
            if dy == 0.0 {
                return (*viewport, WheelAction::Ignored);
            }
            let factor = self.zoom_factor(dy);
            let next = viewport.zoom_by(factor, Some(input.pointer));
            log::trace!("wheel zoom ×{factor:.4} → scale {:.4}", next.scale);
            return (next, WheelAction::Zoom { factor });
        }

        let (mut dx, mut dy) = (input.delta.x, input.delta.y);
        if input.shift && dx == 0.0 {
            dx = dy;
            dy = 0.0;
        }
        if dx == 0.0 && dy == 0.0 {
            return (*viewport, WheelAction::Ignored);
        }

        if self.is_notch(dx) || self.is_notch(dy) {
            let m = self.ramp(input.timestamp_ms);
            let step = self.config.notch_step;
            let normalize = |v: f64| {
                if v.abs() >= self.config.notch_threshold {
                    v.signum() * step * m
                } else {
                    v
                }
            };
            dx = normalize(dx);
            dy = normalize(dy);
        } else {
            self.multiplier = 1.0;
            self.last_event_ms = Some(input.timestamp_ms);
        }

        // Scrolling down reveals content below: the world moves up.
        (viewport.pan_by(-dx, -dy), WheelAction::Pan { dx, dy })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> WheelTracker {
        WheelTracker::new(WheelConfig::default(), 1.1, 0.9)
    }

    fn wheel(dx: f64, dy: f64, t: f64) -> WheelInput {
        WheelInput {
            delta: Point::new(dx, dy),
            pointer: Point::new(100.0, 100.0),
            zoom: false,
            shift: false,
            timestamp_ms: t,
        }
    }

    #[test]
    fn ctrl_wheel_notch_zooms_in_around_pointer() {
        let vp = Viewport::default();
        let mut t = tracker();
        let input = WheelInput {
            zoom: true,
            ..wheel(0.0, -100.0, 0.0)
        };
        let before = vp.screen_to_world(input.pointer);
        let (next, action) = t.apply(&vp, &input);
        assert!((next.scale - 1.1).abs() < 1e-12);
        assert_eq!(action, WheelAction::Zoom { factor: 1.1 });
        let after = next.screen_to_world(input.pointer);
        assert!((after.x - before.x).abs() < 1e-9 && (after.y - before.y).abs() < 1e-9);
    }

    #[test]
    fn pinch_deltas_zoom_continuously() {
        let vp = Viewport::default();
        let mut t = tracker();
        let (a, _) = t.apply(&vp, &WheelInput { zoom: true, ..wheel(0.0, -5.0, 0.0) });
        assert!(a.scale > 1.0 && a.scale < 1.1);
        let (b, _) = t.apply(&vp, &WheelInput { zoom: true, ..wheel(0.0, 5.0, 1.0) });
        assert!(b.scale < 1.0);
    }

    #[test]
    fn trackpad_pan_passes_through() {
        let vp = Viewport::default();
        let mut t = tracker();
        let (next, action) = t.apply(&vp, &wheel(3.0, 7.5, 0.0));
        assert_eq!(action, WheelAction::Pan { dx: 3.0, dy: 7.5 });
        assert_eq!(next.pan, Point::new(-3.0, -7.5));
    }

    #[test]
    fn isolated_notch_is_normalized() {
        let vp = Viewport::default();
        let mut t = tracker();
        let (_, action) = t.apply(&vp, &wheel(0.0, 120.0, 0.0));
        assert_eq!(action, WheelAction::Pan { dx: 0.0, dy: 40.0 });
        let (_, action) = t.apply(&vp, &wheel(0.0, -53.0, 500.0));
        assert_eq!(action, WheelAction::Pan { dx: 0.0, dy: -40.0 });
    }

    #[test]
    fn rapid_notches_accelerate_up_to_cap() {
        let vp = Viewport::default();
        let mut t = tracker();
        // Recorded-style trace: a fast flick, one notch every 10ms.
        let trace: Vec<f64> = (0..12u32).map(|i| f64::from(i) * 10.0).collect();
        let mut seen = Vec::new();
        for ts in trace {
            t.apply(&vp, &wheel(0.0, 100.0, ts));
            seen.push(t.multiplier());
        }
        assert_eq!(seen[0], 1.0);
        assert!(seen.windows(2).all(|w| w[1] >= w[0]));
        assert_eq!(*seen.last().unwrap(), 25.0);
    }

    #[test]
    fn medium_and_slow_gaps() {
        let vp = Viewport::default();
        let mut t = tracker();
        t.apply(&vp, &wheel(0.0, 100.0, 0.0));
        t.apply(&vp, &wheel(0.0, 100.0, 30.0));
        assert_eq!(t.multiplier(), 1.5);
        t.apply(&vp, &wheel(0.0, 100.0, 90.0));
        assert_eq!(t.multiplier(), 1.5, "60ms gap holds the multiplier");
        t.apply(&vp, &wheel(0.0, 100.0, 400.0));
        assert_eq!(t.multiplier(), 1.0, "long pause resets");
    }

    #[test]
    fn shift_remaps_vertical_to_horizontal() {
        let vp = Viewport::default();
        let mut t = tracker();
        let input = WheelInput {
            shift: true,
            ..wheel(0.0, 10.0, 0.0)
        };
        let (next, action) = t.apply(&vp, &input);
        assert_eq!(action, WheelAction::Pan { dx: 10.0, dy: 0.0 });
        assert_eq!(next.pan, Point::new(-10.0, 0.0));
    }

    #[test]
    fn non_finite_delta_ignored() {
        let vp = Viewport::default();
        let mut t = tracker();
        let (next, action) = t.apply(&vp, &wheel(f64::NAN, 1.0, 0.0));
        assert_eq!(action, WheelAction::Ignored);
        assert_eq!(next, vp);
    }
}
