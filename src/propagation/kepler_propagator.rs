//! Two-body propagation of user-edited elements

use satkit::Instant;

use super::frame::DisplayFrame;
use super::propagator::Propagator;
use super::state::EciState;
use crate::orbit::{
    position_from_elements, true_anomaly_from_mean, velocity_from_elements, OrbitalElements,
    MU_EARTH_KM3_S2,
};

/// Moves a marker along fixed Keplerian elements
///
/// Elements are in display length units, valid at `epoch`. No perturbations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeplerPropagator {
    elements: OrbitalElements,
    epoch: Instant,

    /// Gravitational parameter in display units cubed per second squared
    mu: f64,

    frame: DisplayFrame,
}

impl KeplerPropagator {
    /// Elements in Earth radii, default display frame
    pub fn new(elements: OrbitalElements, epoch: Instant) -> Self {
        Self::with_frame(elements, epoch, DisplayFrame::default())
    }

    pub fn with_frame(elements: OrbitalElements, epoch: Instant, frame: DisplayFrame) -> Self {
        let mu = MU_EARTH_KM3_S2 / frame.km_per_unit.powi(3);
        Self {
            elements,
            epoch,
            mu,
            frame,
        }
    }

    pub fn elements(&self) -> &OrbitalElements {
        &self.elements
    }

    pub fn epoch(&self) -> Instant {
        self.epoch
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Mean anomaly (radians) `seconds` after the epoch
    fn mean_anomaly_at(&self, seconds: f64) -> f64 {
        let a = self.elements.semi_major_axis;
        let n = (self.mu / (a * a * a)).sqrt();
        self.elements.mean_anomaly_deg.to_radians() + n * seconds
    }
}

impl Propagator for KeplerPropagator {
    fn propagate(&self, time: &Instant) -> EciState {
        if !self.elements.is_closed() {
            return EciState::zeros();
        }

        let dt = (*time - self.epoch).as_seconds();
        let e = self.elements.eccentricity;
        let nu = true_anomaly_from_mean(self.mean_anomaly_at(dt), e);

        let position = position_from_elements(&self.elements, nu);
        let velocity = velocity_from_elements(&self.elements, nu, self.mu);
        if !(position.iter().all(|x| x.is_finite()) && velocity.iter().all(|x| x.is_finite())) {
            log::trace!("Kepler propagation produced non-finite state at {}", time);
            return EciState::zeros();
        }

        EciState::new(
            self.frame.apply_axes(&position),
            self.frame.apply_axes(&velocity),
        )
    }

    fn orbital_period_seconds(&self) -> Option<f64> {
        self.elements.period_seconds(self.mu)
    }

    fn display_elements(&self) -> Option<OrbitalElements> {
        Some(self.elements)
    }

    fn name(&self) -> &'static str {
        "Kepler"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbit::{sample_orbit_polyline, EARTH_RADIUS_KM, MU_EARTH_RE3_S2};
    use satkit::Duration;

    fn epoch() -> Instant {
        Instant::from_datetime(2026, 3, 1, 0, 0, 0.0).unwrap()
    }

    #[test]
    fn test_default_mu_in_earth_radii() {
        let prop = KeplerPropagator::new(OrbitalElements::default_leo(), epoch());
        assert!((prop.mu() - MU_EARTH_RE3_S2).abs() / MU_EARTH_RE3_S2 < 1e-12);
    }

    #[test]
    fn test_period_matches_leo() {
        let prop = KeplerPropagator::new(OrbitalElements::default_leo(), epoch());
        let period = prop.orbital_period_seconds().unwrap();
        // 400 km altitude
        assert!((period - 5553.6).abs() < 5.0, "period {}", period);
    }

    #[test]
    fn test_returns_to_start_after_one_period() {
        let el = OrbitalElements::new(1.3, 0.2, 30.0, 10.0, 45.0, 20.0);
        let prop = KeplerPropagator::new(el, epoch());
        let period = prop.orbital_period_seconds().unwrap();

        let start = prop.propagate(&epoch());
        let later = prop.propagate(&(epoch() + Duration::from_seconds(period)));
        assert!((start.position - later.position).norm() < 1e-6);
        assert!((start.velocity - later.velocity).norm() < 1e-9);
    }

    #[test]
    fn test_epoch_point_matches_polyline_start() {
        let el = OrbitalElements::new(1.5, 0.1, 60.0, 100.0, 20.0, 75.0);
        let prop = KeplerPropagator::new(el, epoch());
        let frame = DisplayFrame::default();

        let marker = prop.propagate(&epoch());
        let polyline = frame.polyline_vertices(&sample_orbit_polyline(&el, 64));
        let start = polyline[0];
        assert!((marker.position.x as f32 - start.x).abs() < 1e-5);
        assert!((marker.position.y as f32 - start.y).abs() < 1e-5);
        assert!((marker.position.z as f32 - start.z).abs() < 1e-5);
    }

    #[test]
    fn test_kilometer_frame_speed() {
        let a_km = 7000.0;
        let el = OrbitalElements::new(a_km, 0.0, 0.0, 0.0, 0.0, 0.0);
        let prop = KeplerPropagator::with_frame(el, epoch(), DisplayFrame::kilometers());

        let state = prop.propagate(&(epoch() + Duration::from_seconds(1234.0)));
        assert!((state.radius() - a_km).abs() < 1e-6);
        let expected = (MU_EARTH_KM3_S2 / a_km).sqrt();
        assert!((state.velocity.norm() - expected).abs() < 1e-9);

        // Earth-radii frame describes the same orbit
        let el_re = el.with_semi_major_axis(a_km / EARTH_RADIUS_KM);
        let prop_re = KeplerPropagator::new(el_re, epoch());
        let state_re = prop_re.propagate(&(epoch() + Duration::from_seconds(1234.0)));
        assert!((state_re.radius() * EARTH_RADIUS_KM - a_km).abs() < 1e-6);
    }

    #[test]
    fn test_open_orbit_unavailable() {
        let el = OrbitalElements::new(1.5, 1.2, 0.0, 0.0, 0.0, 0.0);
        let prop = KeplerPropagator::new(el, epoch());
        assert!(prop.propagate(&epoch()).is_unavailable());
        assert!(prop.orbital_period_seconds().is_none());
    }
}
