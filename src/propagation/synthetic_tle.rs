//! Synthetic TLE from a single state vector
//!
//! SGP4 expects mean elements; this uses the osculating elements of the
//! state with drag terms zeroed. Good enough to draw a continuously
//! propagated orbit from a lone state estimate.

use chrono::{Datelike, NaiveDate};
use nalgebra::Vector3;
use satkit::Instant;

use super::sgp4::TLE_LINE_LENGTH;
use crate::orbit::{
    osculating_elements, ElementLimits, ElementsError, OrbitalElements, MU_EARTH_KM3_S2,
    SECONDS_PER_DAY, TWO_PI,
};

/// Widest mean motion the 11-column TLE field can carry (rev/day)
const MAX_MEAN_MOTION_REV_PER_DAY: f64 = 100.0;

/// Catalog number written into synthesized element sets
const SYNTHETIC_SAT_NUM: &str = "00001";

/// A generated two-line element set
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticTle {
    pub line1: String,
    pub line2: String,

    /// Elements encoded in line 2, semi-major axis in km
    pub elements: OrbitalElements,

    pub mean_motion_rev_per_day: f64,
}

/// TLE checksum: digits summed, each `-` counts as one, modulo 10
pub fn tle_checksum(line: &str) -> u8 {
    let sum: u32 = line
        .chars()
        .map(|c| match c {
            '0'..='9' => c as u32 - '0' as u32,
            '-' => 1,
            _ => 0,
        })
        .sum();
    (sum % 10) as u8
}

/// Build a TLE for an ECI state (km, km/s) at `epoch`
pub fn build_synthetic_tle(
    epoch: &Instant,
    position_km: &Vector3<f64>,
    velocity_km_s: &Vector3<f64>,
) -> Result<SyntheticTle, ElementsError> {
    let osc = osculating_elements(position_km, velocity_km_s, &ElementLimits::SGP4)?;
    let a = osc.semi_major_axis_km;

    let n_rad_s = (MU_EARTH_KM3_S2 / (a * a * a)).sqrt();
    let mean_motion = n_rad_s * SECONDS_PER_DAY / TWO_PI;
    if !(mean_motion.is_finite() && mean_motion > 0.0 && mean_motion < MAX_MEAN_MOTION_REV_PER_DAY)
    {
        return Err(ElementsError::MeanMotionOutOfRange {
            rev_per_day: mean_motion,
        });
    }

    let elements = osc.to_elements();
    let epoch_field = tle_epoch_field(epoch)?;

    // Seven digits, implied leading decimal point
    let ecc7 = ((elements.eccentricity * 1e7).round() as i64).clamp(0, 9_999_999);

    let line1 = finalize_line(
        format!(
            "1 {}U 00000A   {}  .00000000  00000-0  00000-0 0  999",
            SYNTHETIC_SAT_NUM, epoch_field
        ),
        1,
    )?;
    let line2 = finalize_line(
        format!(
            "2 {} {:8.4} {:8.4} {:07} {:8.4} {:8.4} {:11.8}{:5}",
            SYNTHETIC_SAT_NUM,
            elements.inclination_deg,
            elements.raan_deg,
            ecc7,
            elements.arg_periapsis_deg,
            elements.mean_anomaly_deg,
            mean_motion,
            1
        ),
        2,
    )?;

    Ok(SyntheticTle {
        line1,
        line2,
        elements,
        mean_motion_rev_per_day: mean_motion,
    })
}

/// Append the checksum digit; the body must be exactly 68 characters
fn finalize_line(body: String, number: u8) -> Result<String, ElementsError> {
    if body.len() != TLE_LINE_LENGTH - 1 {
        return Err(ElementsError::LineLength {
            line: number,
            length: body.len() + 1,
        });
    }
    let checksum = tle_checksum(&body);
    let mut line = body;
    line.push(char::from(b'0' + checksum));
    Ok(line)
}

/// `YYDDD.DDDDDDDD` for a UTC instant
///
/// Rounding the fraction up to a whole day carries into the day of year,
/// and from the last day of a year into the next year.
pub fn tle_epoch_field(epoch: &Instant) -> Result<String, ElementsError> {
    let (year, month, day, hour, minute, second) = epoch.as_datetime();
    let date = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
        .ok_or(ElementsError::InvalidEpoch)?;

    let sec_of_day = hour as f64 * 3600.0 + minute as f64 * 60.0 + second as f64;
    let day_fraction = sec_of_day / SECONDS_PER_DAY;
    if !(day_fraction.is_finite() && (0.0..1.0).contains(&day_fraction)) {
        return Err(ElementsError::InvalidEpoch);
    }

    let mut fraction = (day_fraction * 1e8).round() as i64;
    let mut date = date;
    if fraction >= 100_000_000 {
        fraction -= 100_000_000;
        date = date.succ_opt().ok_or(ElementsError::InvalidEpoch)?;
    }

    // Two-digit years cover 1957..=2056
    let year = date.year();
    if !(1957..=2056).contains(&year) {
        return Err(ElementsError::InvalidEpoch);
    }

    Ok(format!(
        "{:02}{:03}.{:08}",
        year % 100,
        date.ordinal(),
        fraction
    ))
}
