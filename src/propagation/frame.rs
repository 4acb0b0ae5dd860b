//! Display frame: length unit and axis convention for propagated states
//!
//! ECI is Z-up (polar axis), but the renderer is Y-up. The default remap
//! preserves right-handedness: ECI X -> display X, ECI Z -> display Y,
//! ECI Y -> display -Z.

use glam::Vec3;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::state::EciState;
use crate::orbit::EARTH_RADIUS_KM;

/// Fixed axis permutation from ECI to display coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisRemap {
    /// Keep ECI axes
    Identity,
    /// `(x, y, z) -> (x, z, -y)`
    YUp,
}

impl AxisRemap {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Identity => "Identity (Z-up)",
            Self::YUp => "Y-up",
        }
    }

    pub fn all() -> &'static [AxisRemap] {
        &[Self::Identity, Self::YUp]
    }

    pub fn apply(&self, v: &Vector3<f64>) -> Vector3<f64> {
        match self {
            Self::Identity => *v,
            Self::YUp => Vector3::new(v.x, v.z, -v.y),
        }
    }

    /// Undo [`AxisRemap::apply`]
    pub fn invert(&self, v: &Vector3<f64>) -> Vector3<f64> {
        match self {
            Self::Identity => *v,
            Self::YUp => Vector3::new(v.x, -v.z, v.y),
        }
    }
}

impl std::str::FromStr for AxisRemap {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "identity" | "eci" | "z-up" => Ok(Self::Identity),
            "y-up" | "yup" => Ok(Self::YUp),
            _ => Err(()),
        }
    }
}

/// Unit and axis convention shared by every propagator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayFrame {
    /// Kilometers per display length unit
    pub km_per_unit: f64,

    pub remap: AxisRemap,
}

impl Default for DisplayFrame {
    fn default() -> Self {
        Self::earth_radii()
    }
}

impl DisplayFrame {
    /// Earth radii, Y-up (renderer default)
    pub fn earth_radii() -> Self {
        Self {
            km_per_unit: EARTH_RADIUS_KM,
            remap: AxisRemap::YUp,
        }
    }

    /// Plain ECI kilometers
    pub fn kilometers() -> Self {
        Self {
            km_per_unit: 1.0,
            remap: AxisRemap::Identity,
        }
    }

    /// ECI kilometers to display units
    pub fn position_from_km(&self, position_km: &Vector3<f64>) -> Vector3<f64> {
        self.vector_from_km(position_km)
    }

    /// Any ECI vector with a km length component (km, km/s) to display units
    pub fn vector_from_km(&self, v_km: &Vector3<f64>) -> Vector3<f64> {
        self.remap.apply(&(v_km / self.km_per_unit))
    }

    /// ECI state in km, km/s to a display state
    pub fn state_from_km(&self, position_km: &Vector3<f64>, velocity_km_s: &Vector3<f64>) -> EciState {
        EciState::new(
            self.vector_from_km(position_km),
            self.vector_from_km(velocity_km_s),
        )
    }

    /// Display units back to ECI kilometers
    pub fn position_to_km(&self, position: &Vector3<f64>) -> Vector3<f64> {
        self.remap.invert(position) * self.km_per_unit
    }

    /// Remap only, for inertial vectors already in display length units
    pub fn apply_axes(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.remap.apply(v)
    }

    /// Convert a semi-major axis in km to display units
    pub fn length_from_km(&self, km: f64) -> f64 {
        km / self.km_per_unit
    }

    /// Renderer-facing vertex
    pub fn to_vertex(position: &Vector3<f64>) -> Vec3 {
        Vec3::new(position.x as f32, position.y as f32, position.z as f32)
    }

    /// Remap an inertial polyline and pack it as renderer vertices
    pub fn polyline_vertices(&self, points: &[Vector3<f64>]) -> Vec<Vec3> {
        points
            .iter()
            .map(|p| Self::to_vertex(&self.apply_axes(p)))
            .collect()
    }
}
