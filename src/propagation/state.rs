//! Instantaneous propagated state

use nalgebra::Vector3;

/// Position and velocity in an Earth-centered inertial frame
///
/// Units follow the producing propagator's [`super::DisplayFrame`]
/// (Earth radii and Earth radii/s by default). An all-zero state is the
/// "propagation unavailable" sentinel, never a position at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EciState {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
}

impl Default for EciState {
    fn default() -> Self {
        Self::zeros()
    }
}

impl EciState {
    pub fn new(position: Vector3<f64>, velocity: Vector3<f64>) -> Self {
        Self { position, velocity }
    }

    /// The unavailable sentinel
    pub fn zeros() -> Self {
        Self {
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
        }
    }

    /// True when this is the all-zero sentinel
    pub fn is_unavailable(&self) -> bool {
        self.position == Vector3::zeros() && self.velocity == Vector3::zeros()
    }

    /// `None` for the sentinel
    pub fn available(self) -> Option<Self> {
        if self.is_unavailable() {
            None
        } else {
            Some(self)
        }
    }

    /// Distance from the frame origin
    pub fn radius(&self) -> f64 {
        self.position.norm()
    }

    /// Component-wise linear blend, `alpha` clamped to `[0, 1]`
    pub fn lerp(&self, other: &Self, alpha: f64) -> Self {
        let alpha = alpha.clamp(0.0, 1.0);
        Self {
            position: self.position + (other.position - self.position) * alpha,
            velocity: self.velocity + (other.velocity - self.velocity) * alpha,
        }
    }
}
