//! SGP4 propagation using satkit

use std::sync::Arc;

use nalgebra::Vector3;
use satkit::sgp4::sgp4;
use satkit::{Instant, TLE};

use super::frame::DisplayFrame;
use super::propagator::Propagator;
use super::state::EciState;
use crate::orbit::{OrbitalElements, MU_EARTH_KM3_S2, SECONDS_PER_DAY, TWO_PI};

/// Characters per TLE line, checksum included
pub const TLE_LINE_LENGTH: usize = 69;

/// Why a TLE could not be turned into an SGP4 model
#[derive(Debug, Clone, PartialEq)]
pub enum Sgp4Error {
    /// Line does not follow the fixed-width layout
    Malformed { line: u8, reason: String },

    /// satkit rejected the element set
    Parse { message: String },
}

impl std::fmt::Display for Sgp4Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed { line, reason } => write!(f, "Malformed TLE line {}: {}", line, reason),
            Self::Parse { message } => write!(f, "Failed to parse TLE: {}", message),
        }
    }
}

impl std::error::Error for Sgp4Error {}

/// Parsed element set shared between clones of one propagator
struct Sgp4Context {
    tle: TLE,
    line1: String,
    line2: String,
}

impl std::fmt::Debug for Sgp4Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sgp4Context")
            .field("line1", &self.line1)
            .field("line2", &self.line2)
            .finish()
    }
}

/// SGP4 propagator built from a two-line element set
///
/// Cloning is cheap: clones share the parsed TLE. Each `propagate` call
/// runs satkit on a private copy, so concurrent calls never touch the
/// shared record.
///
/// A propagator built from a bad TLE is still a value; every query on it
/// reports "unavailable".
#[derive(Debug, Clone)]
pub struct Sgp4Propagator {
    context: Option<Arc<Sgp4Context>>,
    frame: DisplayFrame,
}

impl Sgp4Propagator {
    /// Build from a TLE line pair, logging and swallowing any parse failure
    pub fn from_lines(line1: &str, line2: &str) -> Self {
        Self::from_lines_in_frame(line1, line2, DisplayFrame::default())
    }

    /// Same as [`Sgp4Propagator::from_lines`] with an explicit display frame
    pub fn from_lines_in_frame(line1: &str, line2: &str, frame: DisplayFrame) -> Self {
        match Self::try_from_lines_in_frame(line1, line2, frame) {
            Ok(propagator) => propagator,
            Err(e) => {
                log::warn!("SGP4 unavailable: {}", e);
                Self {
                    context: None,
                    frame,
                }
            }
        }
    }

    /// Build from a TLE line pair, reporting why it failed
    pub fn try_from_lines(line1: &str, line2: &str) -> Result<Self, Sgp4Error> {
        Self::try_from_lines_in_frame(line1, line2, DisplayFrame::default())
    }

    pub fn try_from_lines_in_frame(
        line1: &str,
        line2: &str,
        frame: DisplayFrame,
    ) -> Result<Self, Sgp4Error> {
        let line1 = line1.trim_end();
        let line2 = line2.trim_end();
        check_layout(line1, 1)?;
        check_layout(line2, 2)?;

        let tle = TLE::load_2line(line1, line2).map_err(|e| Sgp4Error::Parse {
            message: e.to_string(),
        })?;

        log::debug!(
            "Loaded TLE with epoch {} (mean motion {:.8} rev/day)",
            tle.epoch,
            tle.mean_motion
        );

        Ok(Self {
            context: Some(Arc::new(Sgp4Context {
                tle,
                line1: line1.to_string(),
                line2: line2.to_string(),
            })),
            frame,
        })
    }

    /// True if the TLE parsed
    pub fn is_valid(&self) -> bool {
        self.context.is_some()
    }

    pub fn frame(&self) -> &DisplayFrame {
        &self.frame
    }

    /// TLE epoch
    pub fn epoch(&self) -> Option<Instant> {
        self.context.as_ref().map(|ctx| ctx.tle.epoch)
    }

    /// TLE lines as supplied
    pub fn lines(&self) -> Option<(&str, &str)> {
        self.context
            .as_ref()
            .map(|ctx| (ctx.line1.as_str(), ctx.line2.as_str()))
    }

    /// State in kilometers and km/s, `None` on any propagation failure
    pub fn propagate_km(&self, time: &Instant) -> Option<(Vector3<f64>, Vector3<f64>)> {
        let ctx = self.context.as_ref()?;

        let mut tle = ctx.tle.clone();
        let result = match sgp4(&mut tle, &[*time]) {
            Ok(result) => result,
            Err(_) => {
                log::trace!("SGP4 propagation failed at {}", time);
                return None;
            }
        };

        // satkit reports TEME meters and m/s
        let pos = result.pos.column(0);
        let vel = result.vel.column(0);
        let pos_km = Vector3::new(pos[0], pos[1], pos[2]) / 1000.0;
        let vel_km_s = Vector3::new(vel[0], vel[1], vel[2]) / 1000.0;

        let finite = pos_km.iter().chain(vel_km_s.iter()).all(|c| c.is_finite());
        if !finite || pos_km == Vector3::zeros() {
            log::trace!("SGP4 produced no usable state at {}", time);
            return None;
        }

        Some((pos_km, vel_km_s))
    }

    /// TLE mean elements with the semi-major axis in display units
    ///
    /// `a = (μ / n²)^(1/3)` from the mean motion; the angles come straight
    /// from the TLE.
    pub fn mean_elements(&self) -> Option<OrbitalElements> {
        let tle = &self.context.as_ref()?.tle;
        if !tle.eccen.is_finite() || !(0.0..1.0).contains(&tle.eccen) {
            return None;
        }

        let n_rad_s = self.mean_motion_rev_per_day()? * TWO_PI / SECONDS_PER_DAY;
        let a_km = (MU_EARTH_KM3_S2 / (n_rad_s * n_rad_s)).cbrt();
        if !a_km.is_finite() || a_km <= 0.0 {
            return None;
        }

        Some(OrbitalElements {
            semi_major_axis: self.frame.length_from_km(a_km),
            eccentricity: tle.eccen,
            inclination_deg: tle.inclination,
            raan_deg: tle.raan,
            arg_periapsis_deg: tle.arg_of_perigee,
            mean_anomaly_deg: tle.mean_anomaly,
        })
    }

    /// `86400 / n` with `n` in rev/day
    pub fn orbital_period(&self) -> Option<f64> {
        Some(SECONDS_PER_DAY / self.mean_motion_rev_per_day()?)
    }

    fn mean_motion_rev_per_day(&self) -> Option<f64> {
        let n = self.context.as_ref()?.tle.mean_motion;
        if n.is_finite() && n > 0.0 {
            Some(n)
        } else {
            None
        }
    }
}

impl Propagator for Sgp4Propagator {
    fn propagate(&self, time: &Instant) -> EciState {
        match self.propagate_km(time) {
            Some((pos_km, vel_km_s)) => self.frame.state_from_km(&pos_km, &vel_km_s),
            None => EciState::zeros(),
        }
    }

    fn orbital_period_seconds(&self) -> Option<f64> {
        self.orbital_period()
    }

    fn display_elements(&self) -> Option<OrbitalElements> {
        self.mean_elements()
    }

    fn name(&self) -> &'static str {
        "SGP4"
    }
}

/// Fixed-width checks done before handing a line to satkit
fn check_layout(line: &str, number: u8) -> Result<(), Sgp4Error> {
    let malformed = |reason: &str| Sgp4Error::Malformed {
        line: number,
        reason: reason.to_string(),
    };

    if !line.is_ascii() {
        return Err(malformed("non-ASCII characters"));
    }
    if line.len() != TLE_LINE_LENGTH {
        return Err(malformed(&format!(
            "{} characters, expected {}",
            line.len(),
            TLE_LINE_LENGTH
        )));
    }
    let expected = char::from(b'0' + number);
    if !line.starts_with(expected) || line.as_bytes()[1] != b' ' {
        return Err(malformed("wrong line number"));
    }
    Ok(())
}
