//! Ephemeris-driven propagation
//!
//! Owns a time-sorted set of state samples and answers `propagate` by trying
//! a fixed list of strategies in order:
//!
//! 1. **SingleSampleSgp4**: one sample, turned into a synthetic TLE
//! 2. **PerSampleSgp4**: samples carrying covariance, each with its own
//!    synthetic TLE, chosen by nearest epoch
//! 3. **SingleSamplePassthrough**: one sample, returned as-is
//! 4. **Interpolation**: linear between bracketing samples, clamped at the ends
//!
//! Every strategy reports "not applicable" with `None`, so each one can be
//! exercised on its own.

use std::cmp::Ordering;

use nalgebra::{Matrix6, Vector3};
use satkit::Instant;

use super::frame::DisplayFrame;
use super::propagator::Propagator;
use super::sgp4::Sgp4Propagator;
use super::state::EciState;
use super::synthetic_tle::build_synthetic_tle;
use crate::orbit::{extract_orbital_elements, OrbitalElements};

/// Number of stored values in a 6x6 upper triangle
pub const COVARIANCE_UPPER_LEN: usize = 21;

/// Symmetric 6x6 position/velocity covariance stored as its upper triangle
///
/// Order: (0,0) (0,1) ... (0,5) (1,1) ... (5,5).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Covariance {
    upper: [f64; COVARIANCE_UPPER_LEN],
}

impl Covariance {
    pub fn from_upper(upper: [f64; COVARIANCE_UPPER_LEN]) -> Self {
        Self { upper }
    }

    pub fn upper(&self) -> &[f64; COVARIANCE_UPPER_LEN] {
        &self.upper
    }

    /// Element `(row, col)`; either triangle may be addressed
    ///
    /// # Panics
    ///
    /// Panics if `row` or `col` is not in `0..6`.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        let (i, j) = if row <= col { (row, col) } else { (col, row) };
        self.upper[i * 6 - i * (i.saturating_sub(1)) / 2 + (j - i)]
    }

    pub fn to_matrix(&self) -> Matrix6<f64> {
        Matrix6::from_fn(|row, col| self.get(row, col))
    }
}

/// One timestamped state in km and km/s
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EphemerisSample {
    /// `None` marks an unset timestamp; such samples are discarded
    pub epoch: Option<Instant>,

    pub position_km: Vector3<f64>,

    pub velocity_km_s: Vector3<f64>,

    pub covariance: Option<Covariance>,
}

impl EphemerisSample {
    pub fn new(epoch: Instant, position_km: Vector3<f64>, velocity_km_s: Vector3<f64>) -> Self {
        Self {
            epoch: Some(epoch),
            position_km,
            velocity_km_s,
            covariance: None,
        }
    }

    pub fn with_covariance(mut self, covariance: Covariance) -> Self {
        self.covariance = Some(covariance);
        self
    }

    pub fn has_covariance(&self) -> bool {
        self.covariance.is_some()
    }
}

/// Ways the ephemeris can answer a query, in resolution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    SingleSampleSgp4,
    PerSampleSgp4,
    SingleSamplePassthrough,
    Interpolation,
}

impl Strategy {
    pub const RESOLUTION_ORDER: [Strategy; 4] = [
        Strategy::SingleSampleSgp4,
        Strategy::PerSampleSgp4,
        Strategy::SingleSamplePassthrough,
        Strategy::Interpolation,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::SingleSampleSgp4 => "single-sample SGP4",
            Self::PerSampleSgp4 => "per-sample SGP4",
            Self::SingleSamplePassthrough => "single-sample passthrough",
            Self::Interpolation => "linear interpolation",
        }
    }
}

/// A sample with a known epoch
#[derive(Debug, Clone, Copy)]
struct Knot {
    epoch: Instant,
    sample: EphemerisSample,
}

/// Propagator over discrete state samples
///
/// Built once, immutable afterwards.
#[derive(Debug, Clone)]
pub struct EphemerisPropagator {
    knots: Vec<Knot>,

    /// Elements of the first sample, semi-major axis in display units
    keplerian_elements: Option<OrbitalElements>,

    /// Synthesized from the only sample
    single_sgp4: Option<Sgp4Propagator>,

    /// Index-aligned with `knots`, populated only for samples with covariance
    per_sample_sgp4: Option<Vec<Option<Sgp4Propagator>>>,

    frame: DisplayFrame,
}

impl EphemerisPropagator {
    pub fn new(samples: Vec<EphemerisSample>) -> Self {
        Self::with_frame(samples, DisplayFrame::default())
    }

    pub fn with_frame(samples: Vec<EphemerisSample>, frame: DisplayFrame) -> Self {
        let total = samples.len();
        let mut knots: Vec<Knot> = samples
            .into_iter()
            .filter_map(|sample| sample.epoch.map(|epoch| Knot { epoch, sample }))
            .collect();
        // Stable, so duplicate epochs keep their input order
        knots.sort_by(|a, b| a.epoch.partial_cmp(&b.epoch).unwrap_or(Ordering::Equal));

        let keplerian_elements = knots.first().and_then(|first| {
            match extract_orbital_elements(&first.sample.position_km, &first.sample.velocity_km_s) {
                Ok(el) => Some(el.with_semi_major_axis(frame.length_from_km(el.semi_major_axis))),
                Err(e) => {
                    log::debug!("No Keplerian elements from first sample: {}", e);
                    None
                }
            }
        });

        let mut single_sgp4 = None;
        let mut per_sample_sgp4 = None;

        if knots.len() == 1 {
            single_sgp4 = synthesize_sgp4(&knots[0], frame);
        } else if knots.iter().any(|k| k.sample.has_covariance()) {
            let models: Vec<Option<Sgp4Propagator>> = knots
                .iter()
                .map(|k| {
                    if k.sample.has_covariance() {
                        synthesize_sgp4(k, frame)
                    } else {
                        None
                    }
                })
                .collect();

            if models.iter().any(Option::is_some) {
                per_sample_sgp4 = Some(models);
            } else {
                log::debug!("No per-sample SGP4 model could be built, interpolating instead");
            }
        }

        log::info!(
            "Ephemeris ready: {} samples ({} discarded), SGP4: {}",
            knots.len(),
            total - knots.len(),
            if single_sgp4.is_some() {
                "single sample".to_string()
            } else if let Some(models) = &per_sample_sgp4 {
                format!(
                    "{}/{} samples",
                    models.iter().filter(|m| m.is_some()).count(),
                    models.len()
                )
            } else {
                "none".to_string()
            }
        );

        Self {
            knots,
            keplerian_elements,
            single_sgp4,
            per_sample_sgp4,
            frame,
        }
    }

    pub fn len(&self) -> usize {
        self.knots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.knots.is_empty()
    }

    /// Kept samples, sorted by epoch
    pub fn samples(&self) -> impl Iterator<Item = &EphemerisSample> {
        self.knots.iter().map(|k| &k.sample)
    }

    pub fn frame(&self) -> &DisplayFrame {
        &self.frame
    }

    /// True if at least one SGP4 model was synthesized
    pub fn has_sgp4(&self) -> bool {
        self.single_sgp4.is_some() || self.per_sample_sgp4.is_some()
    }

    /// True when the input looks like a set of epoch state estimates
    pub fn is_epoch_state_set(&self) -> bool {
        if self.knots.is_empty() {
            return false;
        }
        self.has_sgp4() || self.knots.iter().any(|k| k.sample.has_covariance())
    }

    /// Period of a synthesized SGP4 model, if any
    pub fn orbital_period(&self) -> Option<f64> {
        if let Some(sgp4) = &self.single_sgp4 {
            return sgp4.orbital_period();
        }
        self.per_sample_sgp4
            .iter()
            .flatten()
            .flatten()
            .find_map(|sgp4| sgp4.orbital_period())
    }

    /// Elements extracted from the first sample, semi-major axis in display units
    pub fn keplerian_elements(&self) -> Option<OrbitalElements> {
        self.keplerian_elements
    }

    /// Strategy and state that answer a query at `time`
    pub fn resolve(&self, time: &Instant) -> Option<(Strategy, EciState)> {
        Strategy::RESOLUTION_ORDER
            .iter()
            .find_map(|&strategy| self.try_strategy(strategy, time).map(|s| (strategy, s)))
    }

    /// Answer with one strategy, `None` if it does not apply
    pub fn try_strategy(&self, strategy: Strategy, time: &Instant) -> Option<EciState> {
        match strategy {
            Strategy::SingleSampleSgp4 => self.single_sgp4.as_ref().map(|p| p.propagate(time)),
            Strategy::PerSampleSgp4 => {
                let models = self.per_sample_sgp4.as_ref()?;
                if models.len() != self.knots.len() {
                    return None;
                }
                let idx = self.nearest_index(time)?;
                models[idx].as_ref().map(|p| p.propagate(time))
            }
            Strategy::SingleSamplePassthrough => match self.knots.as_slice() {
                [only] => Some(self.to_display(&only.sample)),
                _ => None,
            },
            Strategy::Interpolation => self.interpolate(time),
        }
    }

    /// Index of the sample closest in time; ties go to the earlier sample
    fn nearest_index(&self, time: &Instant) -> Option<usize> {
        if self.knots.is_empty() {
            return None;
        }

        let upper = self.knots.partition_point(|k| k.epoch < *time);
        if upper == 0 {
            return Some(0);
        }
        if upper == self.knots.len() {
            return Some(self.knots.len() - 1);
        }

        let before = upper - 1;
        let d_before = (*time - self.knots[before].epoch).as_seconds().abs();
        let d_after = (self.knots[upper].epoch - *time).as_seconds().abs();
        Some(if d_before <= d_after { before } else { upper })
    }

    /// Piecewise-linear between bracketing samples, clamped to the end samples
    fn interpolate(&self, time: &Instant) -> Option<EciState> {
        let first = self.knots.first()?;
        let last = self.knots.last()?;

        if *time <= first.epoch {
            return Some(self.to_display(&first.sample));
        }
        if *time >= last.epoch {
            return Some(self.to_display(&last.sample));
        }

        // First sample strictly after `time`; an exact hit lands on `a` with alpha 0
        let upper = self.knots.partition_point(|k| k.epoch <= *time);
        if upper == 0 {
            return Some(self.to_display(&first.sample));
        }
        if upper == self.knots.len() {
            return Some(self.to_display(&last.sample));
        }
        let a = &self.knots[upper - 1];
        let b = &self.knots[upper];

        let dt = (b.epoch - a.epoch).as_seconds();
        if dt <= 0.0 {
            return Some(self.to_display(&a.sample));
        }
        let alpha = ((*time - a.epoch).as_seconds() / dt).clamp(0.0, 1.0);

        let pos_km = a.sample.position_km + (b.sample.position_km - a.sample.position_km) * alpha;
        let vel_km_s =
            a.sample.velocity_km_s + (b.sample.velocity_km_s - a.sample.velocity_km_s) * alpha;
        Some(self.frame.state_from_km(&pos_km, &vel_km_s))
    }

    fn to_display(&self, sample: &EphemerisSample) -> EciState {
        self.frame
            .state_from_km(&sample.position_km, &sample.velocity_km_s)
    }
}

impl Propagator for EphemerisPropagator {
    fn propagate(&self, time: &Instant) -> EciState {
        match self.resolve(time) {
            Some((_, state)) => state,
            None => EciState::zeros(),
        }
    }

    fn orbital_period_seconds(&self) -> Option<f64> {
        self.orbital_period()
    }

    fn display_elements(&self) -> Option<OrbitalElements> {
        self.keplerian_elements()
    }

    fn name(&self) -> &'static str {
        "Ephemeris"
    }
}

/// Best-effort SGP4 model for one sample
fn synthesize_sgp4(knot: &Knot, frame: DisplayFrame) -> Option<Sgp4Propagator> {
    let tle = match build_synthetic_tle(
        &knot.epoch,
        &knot.sample.position_km,
        &knot.sample.velocity_km_s,
    ) {
        Ok(tle) => tle,
        Err(e) => {
            log::debug!("No synthetic TLE for sample at {}: {}", knot.epoch, e);
            return None;
        }
    };

    match Sgp4Propagator::try_from_lines_in_frame(&tle.line1, &tle.line2, frame) {
        Ok(sgp4) => Some(sgp4),
        Err(e) => {
            log::debug!("Synthetic TLE rejected for sample at {}: {}", knot.epoch, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbit::{EARTH_RADIUS_KM, MU_EARTH_KM3_S2};
    use satkit::Duration;

    fn t0() -> Instant {
        Instant::from_datetime(2026, 1, 29, 12, 0, 0.0).unwrap()
    }

    fn at(seconds: f64) -> Instant {
        t0() + Duration::from_seconds(seconds)
    }

    fn circular_sample(seconds: f64) -> EphemerisSample {
        let r = 7000.0;
        let v = (MU_EARTH_KM3_S2 / r).sqrt();
        let n = v / r;
        let theta = n * seconds;
        EphemerisSample::new(
            at(seconds),
            Vector3::new(r * theta.cos(), r * theta.sin(), 0.0),
            Vector3::new(-v * theta.sin(), v * theta.cos(), 0.0),
        )
    }

    fn covariance() -> Covariance {
        let mut upper = [0.0; COVARIANCE_UPPER_LEN];
        for (k, value) in upper.iter_mut().enumerate() {
            *value = k as f64;
        }
        Covariance::from_upper(upper)
    }

    #[test]
    fn test_covariance_layout() {
        let cov = covariance();
        assert_eq!(cov.get(0, 0), 0.0);
        assert_eq!(cov.get(0, 5), 5.0);
        assert_eq!(cov.get(1, 1), 6.0);
        assert_eq!(cov.get(2, 2), 11.0);
        assert_eq!(cov.get(5, 5), 20.0);
        assert_eq!(cov.get(4, 1), cov.get(1, 4));

        let m = cov.to_matrix();
        assert_eq!(m, m.transpose());
        assert_eq!(m[(3, 4)], 16.0);
    }

    #[test]
    #[should_panic]
    fn test_covariance_index_out_of_range() {
        covariance().get(6, 6);
    }

    #[test]
    fn test_discards_unset_and_sorts() {
        let mut unset = circular_sample(0.0);
        unset.epoch = None;

        let eph = EphemerisPropagator::new(vec![
            circular_sample(120.0),
            unset,
            circular_sample(0.0),
            circular_sample(60.0),
        ]);

        assert_eq!(eph.len(), 3);
        let epochs: Vec<Instant> = eph.samples().filter_map(|s| s.epoch).collect();
        assert_eq!(epochs, vec![at(0.0), at(60.0), at(120.0)]);
        assert!(!eph.has_sgp4());
        assert!(!eph.is_epoch_state_set());
    }

    #[test]
    fn test_exact_sample_times() {
        let samples: Vec<EphemerisSample> = (0..4).map(|k| circular_sample(k as f64 * 60.0)).collect();
        let eph = EphemerisPropagator::new(samples.clone());

        for s in &samples {
            let state = eph.propagate(&s.epoch.unwrap());
            let expected = eph.frame().state_from_km(&s.position_km, &s.velocity_km_s);
            assert_eq!(state, expected);
        }
    }

    #[test]
    fn test_clamps_outside_range() {
        let eph = EphemerisPropagator::new(vec![circular_sample(0.0), circular_sample(60.0)]);
        let first = eph.propagate(&at(0.0));
        let last = eph.propagate(&at(60.0));

        assert_eq!(eph.propagate(&at(-3600.0)), first);
        assert_eq!(eph.propagate(&at(3600.0)), last);
        assert_eq!(eph.resolve(&at(3600.0)).unwrap().0, Strategy::Interpolation);
    }

    #[test]
    fn test_midpoint_interpolation() {
        let a = circular_sample(0.0);
        let b = circular_sample(60.0);
        let eph = EphemerisPropagator::with_frame(vec![a, b], DisplayFrame::kilometers());

        let mid = eph.propagate(&at(30.0));
        let expected = (a.position_km + b.position_km) / 2.0;
        assert!((mid.position - expected).norm() < 1e-9);
        let expected_v = (a.velocity_km_s + b.velocity_km_s) / 2.0;
        assert!((mid.velocity - expected_v).norm() < 1e-12);
    }

    #[test]
    fn test_duplicate_epochs_tolerated() {
        let a = circular_sample(0.0);
        let mut b = circular_sample(0.0);
        b.position_km *= 1.01;
        let c = circular_sample(60.0);

        let eph = EphemerisPropagator::new(vec![a, b, c]);
        assert_eq!(eph.len(), 3);
        let state = eph.propagate(&at(30.0));
        assert!(!state.is_unavailable());
        assert!(state.position.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_single_sample_uses_sgp4() {
        let eph = EphemerisPropagator::new(vec![circular_sample(0.0)]);
        assert!(eph.has_sgp4());
        assert!(eph.is_epoch_state_set());

        let (strategy, state) = eph.resolve(&at(1800.0)).unwrap();
        assert_eq!(strategy, Strategy::SingleSampleSgp4);
        assert!(!state.is_unavailable());
        assert!((state.radius() * EARTH_RADIUS_KM - 7000.0).abs() < 30.0);

        // Moves, unlike a passthrough
        let start = eph.propagate(&at(0.0));
        assert!((state.position - start.position).norm() > 0.1);

        let period = eph.orbital_period().unwrap();
        assert!((period - 5828.5).abs() < 30.0, "period {}", period);
    }

    #[test]
    fn test_single_sample_passthrough_when_sgp4_impossible() {
        // Inside the Earth: no TLE, no elements, only the raw sample
        let sample = EphemerisSample::new(
            t0(),
            Vector3::new(5000.0, 0.0, 0.0),
            Vector3::new(0.0, 7.0, 0.0),
        );
        let eph = EphemerisPropagator::new(vec![sample]);
        assert!(!eph.has_sgp4());
        assert!(eph.keplerian_elements().is_none());

        let (strategy, state) = eph.resolve(&at(600.0)).unwrap();
        assert_eq!(strategy, Strategy::SingleSamplePassthrough);
        assert_eq!(
            state,
            eph.frame().state_from_km(&sample.position_km, &sample.velocity_km_s)
        );
    }

    #[test]
    fn test_per_sample_sgp4_nearest() {
        let a = circular_sample(0.0).with_covariance(covariance());
        let b = circular_sample(600.0).with_covariance(covariance());
        let eph = EphemerisPropagator::new(vec![a, b]);
        assert!(eph.has_sgp4());
        assert!(eph.is_epoch_state_set());

        let (strategy, _) = eph.resolve(&at(100.0)).unwrap();
        assert_eq!(strategy, Strategy::PerSampleSgp4);

        // Tie at the midpoint goes to the earlier sample
        assert_eq!(eph.nearest_index(&at(300.0)), Some(0));
        assert_eq!(eph.nearest_index(&at(301.0)), Some(1));
        assert_eq!(eph.nearest_index(&at(-50.0)), Some(0));
        assert_eq!(eph.nearest_index(&at(5000.0)), Some(1));

        // Nearest model at its own epoch reproduces the sample closely
        let state = eph.propagate(&at(600.0));
        let expected = eph.frame().position_from_km(&b.position_km);
        assert!((state.position - expected).norm() * EARTH_RADIUS_KM < 20.0);
    }

    #[test]
    fn test_per_sample_slot_without_model_interpolates() {
        let a = circular_sample(0.0).with_covariance(covariance());
        let b = circular_sample(600.0);
        let eph = EphemerisPropagator::new(vec![a, b]);

        assert_eq!(eph.resolve(&at(100.0)).unwrap().0, Strategy::PerSampleSgp4);
        assert_eq!(eph.resolve(&at(500.0)).unwrap().0, Strategy::Interpolation);
        assert!(eph.try_strategy(Strategy::PerSampleSgp4, &at(500.0)).is_none());
    }

    #[test]
    fn test_per_sample_dropped_when_none_synthesize() {
        let bad = |seconds: f64| {
            EphemerisSample::new(
                at(seconds),
                Vector3::new(5000.0, 0.0, 0.0),
                Vector3::new(0.0, 7.0, 0.0),
            )
            .with_covariance(covariance())
        };
        let eph = EphemerisPropagator::new(vec![bad(0.0), bad(60.0)]);

        assert!(!eph.has_sgp4());
        // Covariance alone still marks an epoch state set
        assert!(eph.is_epoch_state_set());
        assert!(eph.orbital_period().is_none());
        assert_eq!(eph.resolve(&at(30.0)).unwrap().0, Strategy::Interpolation);
    }

    #[test]
    fn test_keplerian_elements_from_first_sample() {
        let eph = EphemerisPropagator::new(vec![circular_sample(60.0), circular_sample(0.0)]);
        let el = eph.keplerian_elements().unwrap();
        assert!((el.semi_major_axis - 7000.0 / EARTH_RADIUS_KM).abs() < 1e-9);
        assert!(el.eccentricity < 1e-9);
        assert!(el.mean_anomaly_deg.abs() < 1e-6 || (el.mean_anomaly_deg - 360.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_is_unavailable() {
        let eph = EphemerisPropagator::new(Vec::new());
        assert!(eph.is_empty());
        assert!(eph.propagate(&t0()).is_unavailable());
        assert!(!eph.is_epoch_state_set());
        assert!(eph.resolve(&t0()).is_none());
    }
}
