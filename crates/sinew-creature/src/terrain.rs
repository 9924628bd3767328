//! Terrain profiles
//!
//! The physics step and the sensors only ever ask the ground for its height
//! at a horizontal position, which decouples them from any particular course.
//! Coordinates are screen-style: larger `y` is lower, so a node is on or
//! above the ground while `y <= height(x)`.

use serde::{Deserialize, Serialize};

/// Read-only ground profile
pub trait Terrain {
    /// Ground height at horizontal position `x`
    fn height(&self, x: f32) -> f32;

    /// Slope measured over `[x - half_width, x + half_width]`
    fn slope(&self, x: f32, half_width: f32) -> f32 {
        (self.height(x + half_width) - self.height(x - half_width)) / (2.0 * half_width)
    }
}

impl<T: Terrain + ?Sized> Terrain for &T {
    fn height(&self, x: f32) -> f32 {
        (**self).height(x)
    }
}

/// Constant-height ground
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlatTerrain {
    pub height: f32,
}

impl FlatTerrain {
    pub fn new(height: f32) -> Self {
        Self { height }
    }
}

impl Terrain for FlatTerrain {
    fn height(&self, _x: f32) -> f32 {
        self.height
    }
}

/// Three-zone course: a flat start, a climbing ramp, then rolling ripples
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseTerrain {
    /// Height of the flat starting zone
    pub flat_height: f32,
    /// Where the ramp begins
    pub ramp_start: f32,
    /// Where the ramp ends and the ripples begin
    pub ramp_end: f32,
    /// Height at the top of the ramp (mean height of the ripple zone)
    pub plateau_height: f32,
    /// Ripple amplitude in the final zone
    pub ripple_amplitude: f32,
    /// Horizontal distance per radian of ripple phase
    pub ripple_length: f32,
}

impl Default for CourseTerrain {
    fn default() -> Self {
        Self {
            flat_height: 440.0,
            ramp_start: 260.0,
            ramp_end: 640.0,
            plateau_height: 260.0,
            ripple_amplitude: 22.0,
            ripple_length: 160.0,
        }
    }
}

impl Terrain for CourseTerrain {
    fn height(&self, x: f32) -> f32 {
        if x < self.ramp_start {
            return self.flat_height;
        }
        if x < self.ramp_end {
            let t = (x - self.ramp_start) / (self.ramp_end - self.ramp_start);
            return self.flat_height - t * (self.flat_height - self.plateau_height);
        }
        let ripple = ((x - self.ramp_end) / self.ripple_length).sin() * self.ripple_amplitude;
        self.plateau_height + ripple
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_zones() {
        let course = CourseTerrain::default();

        assert_eq!(course.height(0.0), 440.0);
        assert_eq!(course.height(259.9), 440.0);
        // Halfway up the ramp
        assert!((course.height(450.0) - 350.0).abs() < 1e-3);
        // Ripple zone starts at plateau height
        assert!((course.height(640.0) - 260.0).abs() < 1e-3);
        // Ripple peak
        let peak_x = 640.0 + 160.0 * std::f32::consts::FRAC_PI_2;
        assert!((course.height(peak_x) - 282.0).abs() < 1e-2);
    }

    #[test]
    fn test_ramp_is_continuous() {
        let course = CourseTerrain::default();
        assert!((course.height(639.999) - course.height(640.0)).abs() < 0.01);
        assert!((course.height(260.0) - 440.0).abs() < 1e-3);
    }

    #[test]
    fn test_slope() {
        let course = CourseTerrain::default();
        assert_eq!(course.slope(100.0, 4.0), 0.0);
        // Ramp climbs 180 units over 380 (height decreases with x)
        assert!((course.slope(450.0, 4.0) + 180.0 / 380.0).abs() < 1e-3);
    }

    #[test]
    fn test_flat_terrain() {
        let flat = FlatTerrain::new(300.0);
        assert_eq!(flat.height(-1000.0), 300.0);
        assert_eq!(flat.height(1000.0), 300.0);
        assert_eq!(flat.slope(5.0, 4.0), 0.0);
    }
}
