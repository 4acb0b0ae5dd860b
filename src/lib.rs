//! Orbitmap - orbit propagation and ephemeris fusion
//!
//! Places satellites in an Earth-centred inertial frame from Keplerian
//! elements, TLEs (via SGP4) or discrete ephemeris samples, and produces
//! the closed orbit polylines and live marker states a 3D viewer draws.

pub mod orbit;
pub mod propagation;

pub use orbit::{OrbitalElements, EARTH_RADIUS_KM, MU_EARTH_KM3_S2};
pub use propagation::{
    DisplayFrame, EciState, EphemerisPropagator, EphemerisSample, KeplerPropagator, Propagator,
    Sgp4Propagator,
};
