use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Datelike, Timelike, Utc};
use clap::Args;
use nalgebra::Vector3;
use satkit::Instant;
use serde::Serialize;

use orbitmap::orbit::{sample_orbit_polyline, OrbitalElements};
use orbitmap::propagation::{
    build_synthetic_tle, full_orbit_track, DisplayFrame, Propagator, Sgp4Propagator,
};

#[derive(Args, Debug, Clone)]
pub struct PolylineArgs {
    /// Semi-major axis in Earth radii
    #[arg(long, default_value_t = 1.0627)]
    pub a: f64,
    /// Eccentricity
    #[arg(long, default_value_t = 0.001)]
    pub e: f64,
    /// Inclination in degrees
    #[arg(long, default_value_t = 55.0)]
    pub i: f64,
    /// Right ascension of the ascending node in degrees
    #[arg(long, default_value_t = 40.0)]
    pub raan: f64,
    /// Argument of periapsis in degrees
    #[arg(long, default_value_t = 30.0)]
    pub argp: f64,
    /// Mean anomaly at epoch in degrees
    #[arg(long, default_value_t = 0.0)]
    pub m: f64,
    /// Number of polyline segments
    #[arg(long, default_value_t = 128)]
    pub segments: usize,
}

#[derive(Args, Debug, Clone)]
pub struct SynthTleArgs {
    /// State epoch (RFC 3339, UTC)
    #[arg(long)]
    pub epoch: DateTime<Utc>,
    /// ECI position x in km
    #[arg(long, allow_hyphen_values = true)]
    pub rx: f64,
    /// ECI position y in km
    #[arg(long, allow_hyphen_values = true)]
    pub ry: f64,
    /// ECI position z in km
    #[arg(long, allow_hyphen_values = true)]
    pub rz: f64,
    /// ECI velocity x in km/s
    #[arg(long, allow_hyphen_values = true)]
    pub vx: f64,
    /// ECI velocity y in km/s
    #[arg(long, allow_hyphen_values = true)]
    pub vy: f64,
    /// ECI velocity z in km/s
    #[arg(long, allow_hyphen_values = true)]
    pub vz: f64,
}

#[derive(Args, Debug, Clone)]
pub struct TrackArgs {
    /// TLE line 1
    #[arg(long)]
    pub line1: String,
    /// TLE line 2
    #[arg(long)]
    pub line2: String,
    /// Track centre time (RFC 3339, UTC); defaults to the TLE epoch
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
    /// Number of track segments
    #[arg(long, default_value_t = 180)]
    pub segments: usize,
}

#[derive(Debug, Serialize)]
struct PolylineOutput {
    elements: OrbitalElements,
    frame: DisplayFrame,
    period_seconds: Option<f64>,
    points: Vec<[f64; 3]>,
}

#[derive(Debug, Serialize)]
struct SynthTleOutput {
    line1: String,
    line2: String,
    mean_motion_rev_per_day: f64,
    /// Semi-major axis in km
    elements: OrbitalElements,
}

#[derive(Debug, Serialize)]
struct TrackOutput {
    tle_epoch: String,
    center_time: String,
    frame: DisplayFrame,
    mean_elements: Option<OrbitalElements>,
    period_seconds: Option<f64>,
    position: [f64; 3],
    velocity: [f64; 3],
    track: Vec<[f64; 3]>,
}

pub fn run_polyline(args: PolylineArgs) -> Result<()> {
    let elements = OrbitalElements::new(args.a, args.e, args.i, args.raan, args.argp, args.m);
    if !elements.is_closed() {
        return Err(anyhow!(
            "elements do not describe a closed orbit (a = {}, e = {})",
            args.a,
            args.e
        ));
    }

    let frame = DisplayFrame::default();
    let points = sample_orbit_polyline(&elements, args.segments)
        .iter()
        .map(|p| to_array(&frame.apply_axes(p)))
        .collect::<Vec<_>>();
    log::info!("Sampled {} polyline points", points.len());

    print_json(&PolylineOutput {
        elements,
        frame,
        period_seconds: elements.period_seconds(orbitmap::orbit::MU_EARTH_RE3_S2),
        points,
    })
}

pub fn run_synth_tle(args: SynthTleArgs) -> Result<()> {
    let epoch = to_instant(&args.epoch)?;
    let position_km = Vector3::new(args.rx, args.ry, args.rz);
    let velocity_km_s = Vector3::new(args.vx, args.vy, args.vz);

    let tle = build_synthetic_tle(&epoch, &position_km, &velocity_km_s)
        .context("cannot synthesize a TLE for this state")?;
    log::info!("Synthesized TLE at {}", epoch);

    print_json(&SynthTleOutput {
        line1: tle.line1,
        line2: tle.line2,
        mean_motion_rev_per_day: tle.mean_motion_rev_per_day,
        elements: tle.elements,
    })
}

pub fn run_track(args: TrackArgs) -> Result<()> {
    let sgp4 = Sgp4Propagator::try_from_lines(args.line1.trim(), args.line2.trim())
        .context("invalid TLE")?;
    let tle_epoch = sgp4.epoch().ok_or_else(|| anyhow!("TLE has no epoch"))?;

    let center = match &args.at {
        Some(at) => to_instant(at)?,
        None => tle_epoch,
    };

    let state = sgp4
        .propagate(&center)
        .available()
        .ok_or_else(|| anyhow!("SGP4 could not propagate to {}", center))?;
    let track = full_orbit_track(&sgp4, &center, args.segments).unwrap_or_default();
    log::info!(
        "{} track with {} points around {}",
        sgp4.name(),
        track.len(),
        center
    );

    print_json(&TrackOutput {
        tle_epoch: tle_epoch.to_string(),
        center_time: center.to_string(),
        frame: *sgp4.frame(),
        mean_elements: sgp4.mean_elements(),
        period_seconds: sgp4.orbital_period(),
        position: to_array(&state.position),
        velocity: to_array(&state.velocity),
        track: track.iter().map(to_array).collect(),
    })
}

fn to_instant(time: &DateTime<Utc>) -> Result<Instant> {
    let second = time.second() as f64 + time.nanosecond() as f64 * 1e-9;
    Instant::from_datetime(
        time.year(),
        time.month() as i32,
        time.day() as i32,
        time.hour() as i32,
        time.minute() as i32,
        second,
    )
    .map_err(|e| anyhow!("cannot represent {}: {}", time, e))
}

fn to_array(v: &Vector3<f64>) -> [f64; 3] {
    [v.x, v.y, v.z]
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}
