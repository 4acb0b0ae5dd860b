//! Classical orbital elements and the physical constants shared by the orbit math

use serde::{Deserialize, Serialize};

/// Earth's gravitational parameter (GM) in km³/s²
pub const MU_EARTH_KM3_S2: f64 = 398_600.4418;

/// Earth's equatorial radius (WGS-84) in kilometers
pub const EARTH_RADIUS_KM: f64 = 6378.137;

/// Earth's gravitational parameter expressed in Earth radii³/s²
pub const MU_EARTH_RE3_S2: f64 =
    MU_EARTH_KM3_S2 / (EARTH_RADIUS_KM * EARTH_RADIUS_KM * EARTH_RADIUS_KM);

pub const SECONDS_PER_DAY: f64 = 86_400.0;

pub const TWO_PI: f64 = 2.0 * std::f64::consts::PI;

/// Keplerian orbital elements
///
/// The semi-major axis is in whatever length unit the caller chose
/// (conventionally Earth radii for display). All angles are in degrees.
/// Values are replaced wholesale on update, never edited in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitalElements {
    /// Semi-major axis `a`
    pub semi_major_axis: f64,

    /// Eccentricity `e`, in `[0, 1)` for closed orbits
    pub eccentricity: f64,

    /// Inclination `i` (degrees)
    pub inclination_deg: f64,

    /// Right ascension of the ascending node `Ω` (degrees)
    pub raan_deg: f64,

    /// Argument of periapsis `ω` (degrees)
    pub arg_periapsis_deg: f64,

    /// Mean anomaly at epoch `M0` (degrees)
    pub mean_anomaly_deg: f64,
}

impl Default for OrbitalElements {
    fn default() -> Self {
        Self {
            semi_major_axis: 1.0,
            eccentricity: 0.0,
            inclination_deg: 0.0,
            raan_deg: 0.0,
            arg_periapsis_deg: 0.0,
            mean_anomaly_deg: 0.0,
        }
    }
}

impl OrbitalElements {
    pub fn new(
        semi_major_axis: f64,
        eccentricity: f64,
        inclination_deg: f64,
        raan_deg: f64,
        arg_periapsis_deg: f64,
        mean_anomaly_deg: f64,
    ) -> Self {
        Self {
            semi_major_axis,
            eccentricity,
            inclination_deg,
            raan_deg,
            arg_periapsis_deg,
            mean_anomaly_deg,
        }
    }

    /// A typical low Earth orbit in Earth radii
    ///
    /// - Altitude: 400 km
    /// - e = 0.001, i = 55°, Ω = 40°, ω = 30°
    pub fn default_leo() -> Self {
        let altitude_km = 400.0;
        Self {
            semi_major_axis: (EARTH_RADIUS_KM + altitude_km) / EARTH_RADIUS_KM,
            eccentricity: 0.001,
            inclination_deg: 55.0,
            raan_deg: 40.0,
            arg_periapsis_deg: 30.0,
            mean_anomaly_deg: 0.0,
        }
    }

    /// True for elements describing a closed (elliptical) orbit
    pub fn is_closed(&self) -> bool {
        self.semi_major_axis.is_finite()
            && self.semi_major_axis > 0.0
            && (0.0..1.0).contains(&self.eccentricity)
    }

    /// Periapsis distance `a(1 - e)`
    pub fn periapsis(&self) -> f64 {
        self.semi_major_axis * (1.0 - self.eccentricity)
    }

    /// Apoapsis distance `a(1 + e)`
    pub fn apoapsis(&self) -> f64 {
        self.semi_major_axis * (1.0 + self.eccentricity)
    }

    /// Orbital period in seconds for a gravitational parameter in matching units
    pub fn period_seconds(&self, mu: f64) -> Option<f64> {
        if !self.is_closed() || mu <= 0.0 {
            return None;
        }
        Some(TWO_PI * (self.semi_major_axis.powi(3) / mu).sqrt())
    }

    /// Same elements with the semi-major axis rescaled (e.g. km -> Earth radii)
    pub fn with_semi_major_axis(self, semi_major_axis: f64) -> Self {
        Self {
            semi_major_axis,
            ..self
        }
    }
}

/// Wrap an angle in degrees into `[0, 360)`
pub fn wrap_deg(deg: f64) -> f64 {
    let x = deg % 360.0;
    let x = if x < 0.0 { x + 360.0 } else { x };
    // Tiny negative inputs round up to exactly 360
    if x >= 360.0 {
        0.0
    } else {
        x
    }
}

/// Wrap an angle in radians into `[0, 2π)`
pub fn wrap_two_pi(rad: f64) -> f64 {
    let x = rad % TWO_PI;
    let x = if x < 0.0 { x + TWO_PI } else { x };
    if x >= TWO_PI {
        0.0
    } else {
        x
    }
}
