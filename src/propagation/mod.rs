//! Orbital propagation module
//!
//! Three ways to place a satellite at a time, all behind [`Propagator`]:
//!
//! ## SGP4 Propagation
//!
//! [`Sgp4Propagator`] wraps satkit's SGP4 for TLE input. A TLE can also be
//! synthesized from a lone state vector with [`build_synthetic_tle`].
//!
//! ## Ephemeris Propagation
//!
//! [`EphemerisPropagator`] answers from discrete state samples, preferring
//! synthesized SGP4 models and falling back to linear interpolation.
//!
//! ## Kepler Propagation
//!
//! [`KeplerPropagator`] moves a marker along fixed two-body elements.
//!
//! Every propagator reports states in a [`DisplayFrame`] (Earth radii,
//! Y-up by default).
//!
//! # Example
//!
//! ```ignore
//! use orbitmap::propagation::*;
//!
//! let sgp4 = Sgp4Propagator::from_lines(line1, line2);
//! let state = sgp4.propagate(&now);
//! if let Some(track) = full_orbit_track(&sgp4, &now, 180) {
//!     let vertices: Vec<_> = track.iter().map(DisplayFrame::to_vertex).collect();
//! }
//! ```

mod ephemeris;
mod frame;
mod kepler_propagator;
mod orbit_track;
mod propagator;
mod sgp4;
mod state;
mod synthetic_tle;

pub use ephemeris::*;
pub use frame::*;
pub use kepler_propagator::*;
pub use orbit_track::*;
pub use propagator::*;
pub use sgp4::*;
pub use state::*;
pub use synthetic_tle::*;
