//! Engine configuration.
//!
//! Every tunable the engine reads lives here with its default. Hosts may pass
//! a partial JSON object; missing fields keep their defaults.

use crate::error::{CanvasError, CanvasResult};
use crate::geometry::Size;
use serde::{Deserialize, Serialize};

// ─── Snapping ─────────────────────────────────────────────────────────────

/// Thresholds for the snap resolver, in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    /// Max distance at which an alignment or grid candidate is taken. Default: **5**.
    pub threshold_px: f64,
    /// Grid pitch for grid snapping. Default: **8**.
    pub grid_size_px: f64,
    /// Master switch; `false` behaves like a held bypass modifier.
    pub enabled: bool,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            threshold_px: 5.0,
            grid_size_px: 8.0,
            enabled: true,
        }
    }
}

// ─── Viewport ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleLimits {
    pub min: f64,
    pub max: f64,
}

impl Default for ScaleLimits {
    fn default() -> Self {
        Self { min: 0.1, max: 5.0 }
    }
}

impl ScaleLimits {
    /// Clamp `scale` into range. Non-finite input falls back to 1 (then clamped).
    pub fn clamp(&self, scale: f64) -> f64 {
        let scale = if scale.is_finite() { scale } else { 1.0 };
        scale.clamp(self.min, self.max)
    }
}

/// Wheel classification and acceleration constants.
///
/// These are tuned by feel, not derived; keep them configurable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelConfig {
    /// |delta| at or above this is a mouse-wheel notch rather than trackpad motion.
    pub notch_threshold: f64,
    /// Pan distance (screen px) of one notch before acceleration.
    pub notch_step: f64,
    /// Events closer together than this ramp the multiplier by `fast_gain`.
    pub fast_ms: f64,
    /// Events closer together than this ramp the multiplier by `medium_gain`.
    pub medium_ms: f64,
    /// Events closer together than this keep the current multiplier.
    pub slow_ms: f64,
    pub fast_gain: f64,
    pub medium_gain: f64,
    pub max_multiplier: f64,
    /// Continuous zoom: this many delta units equal one zoom step.
    pub zoom_units_per_step: f64,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            notch_threshold: 50.0,
            notch_step: 40.0,
            fast_ms: 20.0,
            medium_ms: 40.0,
            slow_ms: 80.0,
            fast_gain: 2.0,
            medium_gain: 1.5,
            max_multiplier: 25.0,
            zoom_units_per_step: 100.0,
        }
    }
}

// ─── Placement & sub-grid ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Spacing kept between an inserted rect and its neighbours.
    pub gap: f64,
    /// Diagonal step of the fallback cascade.
    pub cascade_offset: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            gap: 16.0,
            cascade_offset: 24.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubGridConfig {
    /// Fine cells per coarse cell, on both axes.
    pub factor: u32,
}

impl Default for SubGridConfig {
    fn default() -> Self {
        Self { factor: 4 }
    }
}

// ─── Engine ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub snap: SnapConfig,
    pub scale: ScaleLimits,
    pub zoom_step_in: f64,
    pub zoom_step_out: f64,
    pub wheel: WheelConfig,
    /// Screen-space hit slop for resize handles.
    pub handle_slop_px: f64,
    pub placement: PlacementConfig,
    pub subgrid: SubGridConfig,
    /// Bounds used when placing artboards on the otherwise unbounded canvas.
    pub canvas_extent: Size,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snap: SnapConfig::default(),
            scale: ScaleLimits::default(),
            zoom_step_in: 1.1,
            zoom_step_out: 0.9,
            wheel: WheelConfig::default(),
            handle_slop_px: 8.0,
            placement: PlacementConfig::default(),
            subgrid: SubGridConfig::default(),
            canvas_extent: Size::new(20_000.0, 20_000.0),
        }
    }
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON config and validate it.
    ///
    /// # Errors
    /// `MalformedPayload` for unparsable JSON, `InvalidConfig` for values
    /// the engine cannot work with.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns `InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> CanvasResult<()> {
        if !(self.scale.min > 0.0 && self.scale.min <= self.scale.max) {
            return Err(CanvasError::invalid_config(format!(
                "scale range {}..{} is empty or non-positive",
                self.scale.min, self.scale.max
            )));
        }
        if self.snap.grid_size_px <= 0.0 {
            return Err(CanvasError::invalid_config("snap.grid_size_px must be > 0"));
        }
        if self.snap.threshold_px < 0.0 {
            return Err(CanvasError::invalid_config("snap.threshold_px must be >= 0"));
        }
        if self.subgrid.factor == 0 {
            return Err(CanvasError::invalid_config("subgrid.factor must be >= 1"));
        }
        if self.zoom_step_in <= 1.0 || !(0.0..1.0).contains(&self.zoom_step_out) {
            return Err(CanvasError::invalid_config(
                "zoom steps must grow (in > 1) and shrink (0 < out < 1)",
            ));
        }
        if self.wheel.max_multiplier < 1.0 {
            return Err(CanvasError::invalid_config("wheel.max_multiplier must be >= 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = EngineConfig::from_json(r#"{"snap":{"grid_size_px":10}}"#).unwrap();
        assert_eq!(cfg.snap.grid_size_px, 10.0);
        assert_eq!(cfg.snap.threshold_px, 5.0);
        assert_eq!(cfg.scale, ScaleLimits::default());
    }

    #[test]
    fn inverted_scale_range_rejected() {
        let err = EngineConfig::from_json(r#"{"scale":{"min":2,"max":1}}"#).unwrap_err();
        assert!(matches!(err, CanvasError::InvalidConfig(_)));
    }

    #[test]
    fn zero_factor_rejected() {
        let err = EngineConfig::from_json(r#"{"subgrid":{"factor":0}}"#).unwrap_err();
        assert!(matches!(err, CanvasError::InvalidConfig(_)));
    }

    #[test]
    fn garbage_is_malformed() {
        let err = EngineConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, CanvasError::MalformedPayload(_)));
    }

    #[test]
    fn scale_clamp_handles_nan() {
        let limits = ScaleLimits::default();
        assert_eq!(limits.clamp(f64::NAN), 1.0);
        assert_eq!(limits.clamp(100.0), 5.0);
        assert_eq!(limits.clamp(0.0), 0.1);
    }
}
