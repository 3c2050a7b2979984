use glam::DVec2;
use thiserror::Error;

use crate::scale::{LinearScale, ScaleError};

/// Problems found by [`Config::validate`].
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("surface size must be positive and finite, got {0}x{1}")]
    Surface(f64, f64),

    #[error("{name} must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("max level must be at least 1")]
    ZeroMaxLevel,

    #[error("invalid scale: {0}")]
    Scale(#[from] ScaleError),
}

/// Layout and growth settings shared by the pipeline, the tree builder
/// and the renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Drawing surface size in pixels.
    pub surface: DVec2,
    /// Base width of the trunk.
    pub trunk_width: f64,
    /// Children narrower than this are not generated.
    pub min_width: f64,
    /// Height factor reached at the top edge of the surface.
    pub max_height_factor: f64,
    /// Lean reached at the left edge; the right edge gets its negation.
    pub max_lean: f64,
    /// Seconds between growth ticks.
    pub tick_interval: f64,
    /// Number of ticks, and therefore the final recursion ceiling.
    pub max_level: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            surface: DVec2::new(1280.0, 600.0),
            trunk_width: 80.0,
            min_width: 1.0,
            max_height_factor: 0.8,
            max_lean: 0.5,
            tick_interval: 0.1,
            max_level: 11,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = self.surface;
        if !(s.x > 0.0 && s.y > 0.0 && s.is_finite()) {
            return Err(ConfigError::Surface(s.x, s.y));
        }

        for (name, value) in [
            ("trunk width", self.trunk_width),
            ("min width", self.min_width),
            ("tick interval", self.tick_interval),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::NonPositive { name, value });
            }
        }

        if self.max_level == 0 {
            return Err(ConfigError::ZeroMaxLevel);
        }

        self.height_scale()?;
        self.lean_scale()?;
        Ok(())
    }

    /// Trunk origin: horizontally centred, resting on the bottom edge.
    pub fn trunk_origin(&self) -> DVec2 {
        DVec2::new(
            self.surface.x / 2.0 - self.trunk_width / 2.0,
            self.surface.y - self.trunk_width,
        )
    }

    /// Pointer y to height factor: bottom edge is flat, top edge is tallest.
    pub fn height_scale(&self) -> Result<LinearScale, ConfigError> {
        Ok(LinearScale::new(
            vec![self.surface.y, 0.0],
            vec![0.0, self.max_height_factor],
        )?)
    }

    /// Pointer x to lean, through zero at the horizontal centre.
    pub fn lean_scale(&self) -> Result<LinearScale, ConfigError> {
        Ok(LinearScale::new(
            vec![0.0, self.surface.x / 2.0, self.surface.x],
            vec![self.max_lean, 0.0, -self.max_lean],
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = Config::default();
        assert_eq!(cfg.validate(), Ok(()));
        assert_eq!(cfg.trunk_origin(), DVec2::new(600.0, 520.0));
    }

    #[test]
    fn rejects_bad_values() {
        let mut cfg = Config::default();
        cfg.surface = DVec2::new(0.0, 600.0);
        assert_eq!(cfg.validate(), Err(ConfigError::Surface(0.0, 600.0)));

        let mut cfg = Config::default();
        cfg.min_width = -1.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NonPositive {
                name: "min width",
                ..
            })
        ));

        let mut cfg = Config::default();
        cfg.tick_interval = f64::INFINITY;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NonPositive {
                name: "tick interval",
                ..
            })
        ));

        let mut cfg = Config::default();
        cfg.max_level = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroMaxLevel));
    }

    #[test]
    fn scales_follow_surface_size() {
        let cfg = Config::default();
        let h = cfg.height_scale().unwrap();
        let l = cfg.lean_scale().unwrap();

        assert!((h.map(600.0)).abs() < 1e-12);
        assert!((h.map(0.0) - 0.8).abs() < 1e-12);
        assert!((l.map(0.0) - 0.5).abs() < 1e-12);
        assert!((l.map(640.0)).abs() < 1e-12);
        assert!((l.map(1280.0) + 0.5).abs() < 1e-12);
    }
}
