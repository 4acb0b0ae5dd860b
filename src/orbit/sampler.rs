//! Closed orbit polyline from Keplerian elements

use nalgebra::Vector3;

use super::elements::{wrap_two_pi, OrbitalElements, TWO_PI};
use super::kepler::{position_from_elements, true_anomaly_from_mean};

/// Lower bound on the number of polyline segments
pub const MIN_SEGMENTS: usize = 8;

/// Sample one full revolution of an orbit as a closed polyline
///
/// Returns `segments + 1` inertial positions (in the semi-major axis unit),
/// stepping the mean anomaly uniformly from the epoch value through a full
/// turn, so the first and last points coincide. `segments` is clamped to
/// [`MIN_SEGMENTS`].
pub fn sample_orbit_polyline(elements: &OrbitalElements, segments: usize) -> Vec<Vector3<f64>> {
    let segments = segments.max(MIN_SEGMENTS);
    let e = elements.eccentricity;
    let mean_anomaly0 = elements.mean_anomaly_deg.to_radians();

    (0..=segments)
        .map(|step| {
            let t = step as f64 / segments as f64;
            let m = wrap_two_pi(mean_anomaly0 + t * TWO_PI);
            let nu = true_anomaly_from_mean(m, e);
            position_from_elements(elements, nu)
        })
        .collect()
}
