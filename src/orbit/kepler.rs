//! Kepler solver
//!
//! Conic-section geometry for closed orbits: the perifocal position for a
//! true anomaly, the 3-1-3 rotation into the inertial frame, and the
//! conversions between mean, eccentric and true anomaly.

use nalgebra::{Matrix3, Vector3};

use super::elements::{wrap_two_pi, OrbitalElements};

/// Newton iterations used to solve Kepler's equation
pub const KEPLER_MAX_ITERATIONS: usize = 12;

/// Early-exit threshold on the Newton correction (radians)
pub const KEPLER_TOLERANCE: f64 = 1e-12;

/// Rotation from the perifocal (PQW) frame into the inertial frame
///
/// `R_z(Ω) · R_x(i) · R_z(ω)`
pub fn perifocal_to_inertial(elements: &OrbitalElements) -> Matrix3<f64> {
    let (sin_o, cos_o) = elements.raan_deg.to_radians().sin_cos();
    let (sin_i, cos_i) = elements.inclination_deg.to_radians().sin_cos();
    let (sin_w, cos_w) = elements.arg_periapsis_deg.to_radians().sin_cos();

    Matrix3::new(
        cos_o * cos_w - sin_o * sin_w * cos_i,
        -cos_o * sin_w - sin_o * cos_w * cos_i,
        sin_o * sin_i,
        sin_o * cos_w + cos_o * sin_w * cos_i,
        -sin_o * sin_w + cos_o * cos_w * cos_i,
        -cos_o * sin_i,
        sin_w * sin_i,
        cos_w * sin_i,
        cos_i,
    )
}

/// Inertial position for a true anomaly (radians)
///
/// The result is in the same length unit as the semi-major axis. No axis
/// remapping is applied here; see [`crate::propagation::DisplayFrame`].
pub fn position_from_elements(elements: &OrbitalElements, true_anomaly: f64) -> Vector3<f64> {
    let e = elements.eccentricity;
    let p = elements.semi_major_axis * (1.0 - e * e);
    let (sin_nu, cos_nu) = true_anomaly.sin_cos();
    let r = p / (1.0 + e * cos_nu);

    let perifocal = Vector3::new(r * cos_nu, r * sin_nu, 0.0);
    perifocal_to_inertial(elements) * perifocal
}

/// Inertial velocity for a true anomaly (radians)
///
/// `mu` must be expressed in the semi-major axis length unit per second squared.
pub fn velocity_from_elements(
    elements: &OrbitalElements,
    true_anomaly: f64,
    mu: f64,
) -> Vector3<f64> {
    let e = elements.eccentricity;
    let p = elements.semi_major_axis * (1.0 - e * e);
    if p <= 0.0 || mu <= 0.0 {
        return Vector3::zeros();
    }

    let (sin_nu, cos_nu) = true_anomaly.sin_cos();
    let scale = (mu / p).sqrt();
    let perifocal = Vector3::new(-scale * sin_nu, scale * (e + cos_nu), 0.0);
    perifocal_to_inertial(elements) * perifocal
}

/// Solve `M = E - e sin E` for the eccentric anomaly with Newton-Raphson
///
/// Runs a bounded number of iterations, so the cost is fixed.
pub fn eccentric_anomaly_from_mean(mean_anomaly: f64, e: f64) -> f64 {
    let m = wrap_two_pi(mean_anomaly);
    let mut ecc_anomaly = if e < 0.8 { m } else { std::f64::consts::PI };

    for _ in 0..KEPLER_MAX_ITERATIONS {
        let f = ecc_anomaly - e * ecc_anomaly.sin() - m;
        let fp = 1.0 - e * ecc_anomaly.cos();
        let delta = -f / fp;
        ecc_anomaly += delta;
        if delta.abs() < KEPLER_TOLERANCE {
            break;
        }
    }

    ecc_anomaly
}

/// True anomaly from eccentric anomaly (half-angle form)
pub fn true_anomaly_from_eccentric(ecc_anomaly: f64, e: f64) -> f64 {
    let (sin_half, cos_half) = (ecc_anomaly / 2.0).sin_cos();
    2.0 * ((1.0 + e).sqrt() * sin_half).atan2((1.0 - e).sqrt() * cos_half)
}

/// True anomaly from mean anomaly
pub fn true_anomaly_from_mean(mean_anomaly: f64, e: f64) -> f64 {
    true_anomaly_from_eccentric(eccentric_anomaly_from_mean(mean_anomaly, e), e)
}

/// Mean anomaly in `[0, 2π)` from a true anomaly
pub fn mean_anomaly_from_true(true_anomaly: f64, e: f64) -> f64 {
    let (sin_nu, cos_nu) = true_anomaly.sin_cos();
    let denom = 1.0 + e * cos_nu;
    let cos_e = (e + cos_nu) / denom;
    let sin_e = (1.0 - e * e).sqrt() * sin_nu / denom;
    let ecc_anomaly = wrap_two_pi(sin_e.atan2(cos_e));

    wrap_two_pi(ecc_anomaly - e * ecc_anomaly.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_equatorial_circular_position() {
        let el = OrbitalElements::new(2.0, 0.0, 0.0, 0.0, 0.0, 0.0);

        let p0 = position_from_elements(&el, 0.0);
        assert!((p0 - Vector3::new(2.0, 0.0, 0.0)).norm() < 1e-12);

        let p90 = position_from_elements(&el, FRAC_PI_2);
        assert!((p90 - Vector3::new(0.0, 2.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_polar_orbit_reaches_pole() {
        // i = 90°, ω = 90°: periapsis sits over the north pole
        let el = OrbitalElements::new(1.5, 0.0, 90.0, 0.0, 90.0, 0.0);
        let p = position_from_elements(&el, 0.0);
        assert!((p - Vector3::new(0.0, 0.0, 1.5)).norm() < 1e-12, "{:?}", p);
    }

    #[test]
    fn test_periapsis_and_apoapsis_radius() {
        let el = OrbitalElements::new(10.0, 0.3, 28.5, 120.0, 45.0, 0.0);
        assert!((position_from_elements(&el, 0.0).norm() - 7.0).abs() < 1e-12);
        assert!((position_from_elements(&el, PI).norm() - 13.0).abs() < 1e-12);
    }

    #[test]
    fn test_rotation_is_orthonormal() {
        let el = OrbitalElements::new(1.0, 0.1, 63.4, 211.0, 270.0, 0.0);
        let rot = perifocal_to_inertial(&el);
        assert!((rot.transpose() * rot - Matrix3::identity()).norm() < 1e-12);
        assert!((rot.determinant() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_kepler_equation_residual() {
        for &e in &[0.0, 0.1, 0.5, 0.9] {
            for k in 0..36 {
                let m = k as f64 * 10.0_f64.to_radians();
                let ecc = eccentric_anomaly_from_mean(m, e);
                let residual = wrap_two_pi(ecc - e * ecc.sin()) - wrap_two_pi(m);
                let residual = residual.sin().abs();
                assert!(residual < 1e-9, "e={} M={} residual={}", e, m, residual);
            }
        }
    }

    #[test]
    fn test_mean_true_anomaly_inverse() {
        let e = 0.25;
        for k in 0..12 {
            let m = k as f64 * 30.0_f64.to_radians();
            let nu = true_anomaly_from_mean(m, e);
            let m_back = mean_anomaly_from_true(nu, e);
            let diff = (m_back - wrap_two_pi(m)).sin().abs();
            assert!(diff < 1e-10, "M={} back={}", m, m_back);
        }
    }

    #[test]
    fn test_circular_velocity_is_perpendicular() {
        let el = OrbitalElements::new(1.0, 0.0, 51.6, 10.0, 0.0, 0.0);
        let mu = 1.0;
        let r = position_from_elements(&el, 0.7);
        let v = velocity_from_elements(&el, 0.7, mu);
        assert!(r.dot(&v).abs() < 1e-12);
        assert!((v.norm() - 1.0).abs() < 1e-12);
    }
}
