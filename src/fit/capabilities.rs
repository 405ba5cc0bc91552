//! # Single-step estimation capabilities
//!
//! The matrix mathematics of one filter step is supplied by external
//! collaborators; the engine drives them through the traits below. All three
//! are object-safe and `Send + Sync` so a conditions snapshot can share them
//! across worker contexts as `Arc<dyn _>`.
//!
//! A propagator and a fit updater only agree on the traversal sign
//! convention when they were built for the same direction; the pairing is
//! pinned at snapshot construction (see
//! [`DirectionalComponents`](crate::conditions::source::DirectionalComponents))
//! and is not re-validated per call.

use crate::constants::SurfaceId;
use crate::measurements::rechit::Measurement;
use crate::trajectory::TrajectoryState;

/// State transport between surfaces.
pub trait Propagator: Send + Sync {
    /// Propagate `state` onto the surface `target`.
    ///
    /// Return
    /// ----------
    /// * `Some(state)` on the target surface, or `None` on a geometric miss
    ///   (the extrapolated path does not intersect the surface).
    fn propagate(&self, state: &TrajectoryState, target: SurfaceId) -> Option<TrajectoryState>;
}

/// Result of one successful measurement update.
#[derive(Debug, Clone)]
pub struct FilteredState {
    pub state: TrajectoryState,
    /// Chi-square increment of this update (measurement compatibility).
    pub chi2_increment: f64,
}

/// Measurement update rule of the sequential filter.
pub trait FitUpdater: Send + Sync {
    /// Combine a predicted state with one measurement.
    ///
    /// Return
    /// ----------
    /// * `Some(filtered)` with the updated state and its chi-square
    ///   increment, or `None` when the update is rejected (e.g., singular
    ///   innovation covariance).
    fn update(&self, predicted: &TrajectoryState, measurement: &Measurement)
        -> Option<FilteredState>;
}

/// Forward/backward state combination rule of the smoothing pass.
pub trait SmootherCombiner: Send + Sync {
    /// Minimum-variance combination of a forward-filtered state and a
    /// backward-predicted state on the same surface.
    fn combine(&self, filtered: &TrajectoryState, backward: &TrajectoryState) -> TrajectoryState;
}
