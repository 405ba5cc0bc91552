//! # Two-pass Kalman estimation
//!
//! The numerical heart of the refit, split the same way the estimation runs:
//!
//! * [`capabilities`](crate::fit::capabilities) – the external single-step
//!   mathematics (propagate / update / combine) behind object-safe traits.
//! * [`runner`](crate::fit::runner) – the forward pass: seed rescaling, then
//!   predict + update per measurement along the chosen [`Direction`].
//! * [`smoother`](crate::fit::smoother) – the backward pass: a reverse
//!   filter whose predictions are combined with the forward estimates into
//!   minimum-variance smoothed states.
//!
//! Directions are an explicit enum rather than a boolean so a call site can
//! never silently swap the propagator/fitter pairing.

use serde::Serialize;
use std::fmt;

pub mod capabilities;
pub mod runner;
pub mod smoother;

pub use capabilities::{FilteredState, FitUpdater, Propagator, SmootherCombiner};
pub use runner::{FitFailure, FitOutcome, ForwardPoint, ForwardSequence};

/// Propagation/fit traversal direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    /// Innermost surface towards outermost.
    InsideOut,
    /// Outermost surface towards innermost.
    OutsideIn,
}

impl Direction {
    /// The reverse traversal, used by the backward sweep.
    #[inline]
    pub fn opposite(&self) -> Direction {
        match self {
            Direction::InsideOut => Direction::OutsideIn,
            Direction::OutsideIn => Direction::InsideOut,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::InsideOut => write!(f, "inside-out"),
            Direction::OutsideIn => write!(f, "outside-in"),
        }
    }
}
