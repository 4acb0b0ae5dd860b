//! Analytic orbit geometry
//!
//! Everything here is pure math over [`OrbitalElements`]:
//!
//! - `kepler`: conic position/velocity for a true anomaly and the anomaly conversions
//! - `sampler`: closed polyline over one revolution for display
//! - `state_vector`: osculating elements from an inertial state vector

pub mod elements;
pub mod kepler;
pub mod sampler;
pub mod state_vector;

pub use elements::*;
pub use kepler::{
    eccentric_anomaly_from_mean, mean_anomaly_from_true, perifocal_to_inertial,
    position_from_elements, true_anomaly_from_eccentric, true_anomaly_from_mean,
    velocity_from_elements,
};
pub use sampler::{sample_orbit_polyline, MIN_SEGMENTS};
pub use state_vector::{
    extract_orbital_elements, osculating_elements, EccentricityBound, ElementLimits,
    ElementsError, OsculatingElements,
};
