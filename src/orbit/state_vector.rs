//! State vector to classical orbital elements
//!
//! Converts an inertial position/velocity pair (km, km/s) into osculating
//! Keplerian elements. Every rejection is explicit; the success path never
//! yields NaN or infinite values.

use nalgebra::Vector3;

use super::elements::{
    wrap_deg, wrap_two_pi, OrbitalElements, EARTH_RADIUS_KM, MU_EARTH_KM3_S2, TWO_PI,
};
use super::kepler::mean_anomaly_from_true;

/// Below this eccentricity the orbit is treated as circular
const CIRCULAR_EPSILON: f64 = 1e-10;

/// Below this node-vector magnitude the orbit is treated as equatorial
const EQUATORIAL_EPSILON: f64 = 1e-12;

/// Why a state vector could not be turned into orbital elements
#[derive(Debug, Clone, PartialEq)]
pub enum ElementsError {
    /// Position or velocity contains NaN or infinity
    NonFinite,

    /// Radius outside the accepted range (km)
    RadiusOutOfRange { radius_km: f64 },

    /// Position and velocity are parallel (or zero)
    ZeroAngularMomentum,

    /// Eccentricity outside the accepted range
    EccentricityOutOfRange { eccentricity: f64 },

    /// Semi-major axis outside the accepted range (km)
    SemiMajorAxisOutOfRange { semi_major_axis_km: f64 },

    /// Mean motion does not fit a TLE (rev/day)
    MeanMotionOutOfRange { rev_per_day: f64 },

    /// Epoch cannot be encoded as a TLE epoch field
    InvalidEpoch,

    /// A formatted TLE line does not have the expected width
    LineLength { line: u8, length: usize },
}

impl std::fmt::Display for ElementsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFinite => write!(f, "State vector is not finite"),
            Self::RadiusOutOfRange { radius_km } => {
                write!(f, "Radius {:.3} km is outside the accepted range", radius_km)
            }
            Self::ZeroAngularMomentum => write!(f, "Angular momentum is zero"),
            Self::EccentricityOutOfRange { eccentricity } => {
                write!(f, "Eccentricity {:.6} is outside the accepted range", eccentricity)
            }
            Self::SemiMajorAxisOutOfRange { semi_major_axis_km } => write!(
                f,
                "Semi-major axis {:.3} km is outside the accepted range",
                semi_major_axis_km
            ),
            Self::MeanMotionOutOfRange { rev_per_day } => {
                write!(f, "Mean motion {:.8} rev/day does not fit a TLE", rev_per_day)
            }
            Self::InvalidEpoch => write!(f, "Epoch cannot be encoded in a TLE"),
            Self::LineLength { line, length } => {
                write!(f, "TLE line {} has {} characters, expected 69", line, length)
            }
        }
    }
}

impl std::error::Error for ElementsError {}

/// Upper bound on eccentricity
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EccentricityBound {
    /// `e <= max`
    Inclusive(f64),
    /// `e < max`
    Exclusive(f64),
}

impl EccentricityBound {
    pub fn admits(&self, e: f64) -> bool {
        match *self {
            Self::Inclusive(max) => e <= max,
            Self::Exclusive(max) => e < max,
        }
    }
}

/// Plausibility bounds applied while converting a state vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementLimits {
    /// Radius must be strictly greater than this (km)
    pub min_radius_km: f64,

    /// Radius must be strictly less than this (km)
    pub max_radius_km: f64,

    pub eccentricity: EccentricityBound,

    /// Semi-major axis must be strictly greater than this (km)
    pub min_semi_major_axis_km: f64,

    /// Semi-major axis must be strictly less than this (km)
    pub max_semi_major_axis_km: f64,
}

impl ElementLimits {
    /// Limits for elements shown as a Kepler orbit
    ///
    /// The 1e6 km ceiling is a sanity bound, not a physical limit.
    pub const DISPLAY: Self = Self {
        min_radius_km: EARTH_RADIUS_KM,
        max_radius_km: 1e6,
        eccentricity: EccentricityBound::Inclusive(0.999),
        min_semi_major_axis_km: EARTH_RADIUS_KM,
        max_semi_major_axis_km: 1e6,
    };

    /// Limits for elements fed to SGP4, which rejects `e >= 0.999`
    pub const SGP4: Self = Self {
        min_radius_km: EARTH_RADIUS_KM,
        max_radius_km: f64::INFINITY,
        eccentricity: EccentricityBound::Exclusive(0.999),
        min_semi_major_axis_km: 0.0,
        max_semi_major_axis_km: f64::INFINITY,
    };
}

/// Osculating elements in kilometers and radians
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OsculatingElements {
    pub semi_major_axis_km: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub raan: f64,
    pub arg_periapsis: f64,
    pub true_anomaly: f64,
    pub mean_anomaly: f64,
}

impl OsculatingElements {
    /// Convert to degree-based elements with the semi-major axis in km
    pub fn to_elements(&self) -> OrbitalElements {
        OrbitalElements {
            semi_major_axis: self.semi_major_axis_km,
            eccentricity: self.eccentricity,
            inclination_deg: wrap_deg(self.inclination.to_degrees()),
            raan_deg: wrap_deg(self.raan.to_degrees()),
            arg_periapsis_deg: wrap_deg(self.arg_periapsis.to_degrees()),
            mean_anomaly_deg: wrap_deg(self.mean_anomaly.to_degrees()),
        }
    }
}

/// Compute osculating elements from a state vector under the given limits
pub fn osculating_elements(
    position_km: &Vector3<f64>,
    velocity_km_s: &Vector3<f64>,
    limits: &ElementLimits,
) -> Result<OsculatingElements, ElementsError> {
    let r = position_km.norm();
    let v2 = velocity_km_s.norm_squared();
    if !r.is_finite() || !v2.is_finite() {
        return Err(ElementsError::NonFinite);
    }
    if !(r > limits.min_radius_km && r < limits.max_radius_km) {
        return Err(ElementsError::RadiusOutOfRange { radius_km: r });
    }

    let h_vec = position_km.cross(velocity_km_s);
    let h = h_vec.norm();
    if !(h.is_finite() && h > 0.0) {
        return Err(ElementsError::ZeroAngularMomentum);
    }

    let inclination = (h_vec.z / h).clamp(-1.0, 1.0).acos();

    // n = k x h
    let node = Vector3::new(-h_vec.y, h_vec.x, 0.0);
    let n = node.norm();
    let raan = if n > EQUATORIAL_EPSILON {
        wrap_two_pi(node.y.atan2(node.x))
    } else {
        0.0
    };

    let e_vec = velocity_km_s.cross(&h_vec) / MU_EARTH_KM3_S2 - position_km / r;
    let e = e_vec.norm();
    if !e.is_finite() || e < 0.0 || !limits.eccentricity.admits(e) {
        return Err(ElementsError::EccentricityOutOfRange { eccentricity: e });
    }

    let (arg_periapsis, true_anomaly) = if e > CIRCULAR_EPSILON && n > EQUATORIAL_EPSILON {
        let mut argp = (node.dot(&e_vec) / (n * e)).clamp(-1.0, 1.0).acos();
        if e_vec.z < 0.0 {
            argp = TWO_PI - argp;
        }

        let mut nu = (e_vec.dot(position_km) / (e * r)).clamp(-1.0, 1.0).acos();
        if position_km.dot(velocity_km_s) < 0.0 {
            nu = TWO_PI - nu;
        }
        (argp, nu)
    } else {
        // Near-circular or equatorial: true longitude, periapsis pinned at zero
        (0.0, wrap_two_pi(position_km.y.atan2(position_km.x)))
    };

    let a = 1.0 / (2.0 / r - v2 / MU_EARTH_KM3_S2);
    if !(a.is_finite()
        && a > limits.min_semi_major_axis_km
        && a < limits.max_semi_major_axis_km)
    {
        return Err(ElementsError::SemiMajorAxisOutOfRange {
            semi_major_axis_km: a,
        });
    }

    Ok(OsculatingElements {
        semi_major_axis_km: a,
        eccentricity: e,
        inclination,
        raan,
        arg_periapsis,
        true_anomaly,
        mean_anomaly: mean_anomaly_from_true(true_anomaly, e),
    })
}

/// Extract Keplerian elements from an inertial state vector
///
/// Position in km, velocity in km/s. The returned semi-major axis is in km.
pub fn extract_orbital_elements(
    position_km: &Vector3<f64>,
    velocity_km_s: &Vector3<f64>,
) -> Result<OrbitalElements, ElementsError> {
    osculating_elements(position_km, velocity_km_s, &ElementLimits::DISPLAY)
        .map(|osc| osc.to_elements())
}
