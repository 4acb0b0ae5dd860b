//! Orbit track generation from a propagator

use nalgebra::Vector3;
use satkit::{Duration, Instant};

use super::propagator::Propagator;
use crate::orbit::MIN_SEGMENTS;

/// Sample `period_seconds` of a propagator, centred on `center_time`
///
/// Produces up to `segments + 1` display-frame positions (past half, then
/// future half). Instants where the propagator is unavailable are skipped,
/// so a decaying orbit yields a shorter track instead of points at the origin.
pub fn sample_propagated_track(
    propagator: &dyn Propagator,
    center_time: &Instant,
    period_seconds: f64,
    segments: usize,
) -> Vec<Vector3<f64>> {
    if !(period_seconds.is_finite() && period_seconds > 0.0) {
        return Vec::new();
    }

    let segments = segments.max(MIN_SEGMENTS);
    let start_time = *center_time - Duration::from_seconds(period_seconds / 2.0);
    let step = period_seconds / segments as f64;

    (0..=segments)
        .filter_map(|i| {
            let prop_time = start_time + Duration::from_seconds(step * i as f64);
            propagator
                .propagate(&prop_time)
                .available()
                .map(|state| state.position)
        })
        .collect()
}

/// One full orbit around `center_time`, if the propagator knows its period
pub fn full_orbit_track(
    propagator: &dyn Propagator,
    center_time: &Instant,
    segments: usize,
) -> Option<Vec<Vector3<f64>>> {
    let period = propagator.orbital_period_seconds()?;
    let track = sample_propagated_track(propagator, center_time, period, segments);
    if track.is_empty() {
        log::debug!("{} track is empty at {}", propagator.name(), center_time);
        None
    } else {
        Some(track)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbit::OrbitalElements;
    use crate::propagation::{EciState, KeplerPropagator};

    fn epoch() -> Instant {
        Instant::from_datetime(2026, 3, 1, 0, 0, 0.0).unwrap()
    }

    struct Unavailable;

    impl Propagator for Unavailable {
        fn propagate(&self, _time: &Instant) -> EciState {
            EciState::zeros()
        }

        fn orbital_period_seconds(&self) -> Option<f64> {
            Some(5400.0)
        }

        fn name(&self) -> &'static str {
            "Unavailable"
        }
    }

    #[test]
    fn test_full_orbit_is_closed() {
        let el = OrbitalElements::new(1.4, 0.05, 45.0, 10.0, 20.0, 30.0);
        let prop = KeplerPropagator::new(el, epoch());

        let track = full_orbit_track(&prop, &epoch(), 90).unwrap();
        assert_eq!(track.len(), 91);
        let gap = (track[0] - track[90]).norm();
        assert!(gap < 1e-6, "track not closed: {}", gap);

        // Centre sample sits at the requested time
        let centre = prop.propagate(&epoch()).position;
        assert!((track[45] - centre).norm() < 1e-6);
    }

    #[test]
    fn test_clamps_segments() {
        let prop = KeplerPropagator::new(OrbitalElements::default_leo(), epoch());
        let track = sample_propagated_track(&prop, &epoch(), 5000.0, 2);
        assert_eq!(track.len(), MIN_SEGMENTS + 1);
    }

    #[test]
    fn test_skips_unavailable_states() {
        assert!(full_orbit_track(&Unavailable, &epoch(), 32).is_none());
        assert!(sample_propagated_track(&Unavailable, &epoch(), 5400.0, 32).is_empty());
    }

    #[test]
    fn test_sgp4_track_stops_at_decay() {
        use crate::propagation::Sgp4Propagator;

        let prop = Sgp4Propagator::from_lines(
            "1 99999U 26001A   26029.50000000  .00000000  00000-0  50000-0 0  9993",
            "2 99999  51.6000 100.0000 0100000  90.0000   0.0000 16.00000000    18",
        );
        let epoch = prop.epoch().unwrap();

        // Two days starting at the epoch: only the first instant is before decay
        let center = epoch + Duration::from_seconds(86_400.0);
        let track = sample_propagated_track(&prop, &center, 2.0 * 86_400.0, 16);
        assert!(!track.is_empty() && track.len() < 17, "{} points", track.len());
        assert!((track[0] - prop.propagate(&epoch).position).norm() < 1e-9);
        assert!(track.iter().all(|p| p.norm() > 0.0));

        // Long after decay nothing is left to draw
        let later = epoch + Duration::from_seconds(30.0 * 86_400.0);
        assert!(full_orbit_track(&prop, &later, 32).is_none());
    }

    #[test]
    fn test_rejects_bad_period() {
        let prop = KeplerPropagator::new(OrbitalElements::default_leo(), epoch());
        assert!(sample_propagated_track(&prop, &epoch(), 0.0, 32).is_empty());
        assert!(sample_propagated_track(&prop, &epoch(), f64::NAN, 32).is_empty());
    }
}
