//! Common propagation contract

use satkit::Instant;

use super::state::EciState;
use crate::orbit::OrbitalElements;

/// Anything that can place a satellite at an absolute time
///
/// The renderer holds satellites as `Box<dyn Propagator>` (or `Arc`) and
/// treats SGP4, ephemeris and Kepler-driven satellites alike.
///
/// # Thread Safety
///
/// Implementations are immutable after construction and must be
/// `Send + Sync`, so a render thread and a UI thread can query the same
/// propagator concurrently.
pub trait Propagator: Send + Sync {
    /// State at `time` in the propagator's display frame
    ///
    /// Returns [`EciState::zeros`] when no state can be produced.
    fn propagate(&self, time: &Instant) -> EciState;

    /// Orbital period, when the model knows one
    fn orbital_period_seconds(&self) -> Option<f64> {
        None
    }

    /// Elements for drawing a static orbit shape that matches the marker
    ///
    /// The semi-major axis is in display length units and the orientation
    /// is inertial; remap with [`super::DisplayFrame::polyline_vertices`].
    fn display_elements(&self) -> Option<OrbitalElements> {
        None
    }

    /// Short name for logs and UI
    fn name(&self) -> &'static str;
}
