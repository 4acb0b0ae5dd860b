//! Orbitmap command-line probe
//!
//! Runs the propagation core without a viewer and prints JSON.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{PolylineArgs, SynthTleArgs, TrackArgs};

#[derive(Parser, Debug)]
#[command(name = "orbitmap", version, about = "Orbit propagation probe")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Closed display polyline for Keplerian elements
    Polyline(PolylineArgs),
    /// Synthesize a TLE from an ECI state vector
    SynthTle(SynthTleArgs),
    /// Mean elements, period and one-orbit track for a TLE
    Track(TrackArgs),
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Polyline(args) => commands::run_polyline(args),
        Command::SynthTle(args) => commands::run_synth_tle(args),
        Command::Track(args) => commands::run_track(args),
    }
}
