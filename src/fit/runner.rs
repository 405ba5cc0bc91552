//! # Forward estimation pass
//!
//! Runs the sequential filter along one direction: the seed covariance is
//! rescaled, then every measurement is visited in traversal order with a
//! predict (propagate onto the measurement surface) followed by an update.
//! The (propagator, fitter) pair is taken from the snapshot's components for
//! that direction, so the traversal sign convention is consistent by
//! construction.

use log::debug;

use crate::conditions::ConditionsSnapshot;
use crate::fit::Direction;
use crate::measurements::rechit::Measurement;
use crate::trajectory::TrajectoryState;
use std::fmt;

/// One forward step: the states produced on a measurement's surface.
#[derive(Debug, Clone)]
pub struct ForwardPoint {
    pub measurement: Measurement,
    pub predicted: TrajectoryState,
    pub filtered: TrajectoryState,
    pub chi2_increment: f64,
}

/// The full forward sequence of a successful pass, ordered along the fit
/// direction.
#[derive(Debug, Clone)]
pub struct ForwardSequence {
    pub direction: Direction,
    pub points: Vec<ForwardPoint>,
    pub chi2: f64,
}

/// Why a direction's forward pass produced no sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitFailure {
    /// Fewer measurements survived filtering than the configured minimum.
    TooFewMeasurements { kept: usize, required: usize },
    /// The propagator could not reach the `index`-th measurement's surface.
    PropagationMiss { index: usize },
    /// The updater rejected the `index`-th measurement.
    UpdateRejected { index: usize },
}

impl fmt::Display for FitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitFailure::TooFewMeasurements { kept, required } => {
                write!(f, "{kept} measurements kept, {required} required")
            }
            FitFailure::PropagationMiss { index } => {
                write!(f, "propagation miss at measurement {index}")
            }
            FitFailure::UpdateRejected { index } => {
                write!(f, "update rejected at measurement {index}")
            }
        }
    }
}

/// Outcome of one direction's forward pass.
#[derive(Debug, Clone)]
pub enum FitOutcome {
    Fitted(ForwardSequence),
    Failed(FitFailure),
}

/// Execute the forward pass for `direction`.
///
/// Measurements are expected in the track's original (inside-out) order;
/// the outside-in pass visits them reversed. The seed state is rescaled by
/// `seed_error_rescale` before the first prediction.
///
/// Arguments
/// -----------------
/// * `measurements`: the filtered, fit-ready measurements.
/// * `snapshot`: conditions bundle supplying the direction's components.
/// * `direction`: traversal direction of this pass.
/// * `seed`: coarse input state the pass starts from.
/// * `min_measurements`: minimum surviving-measurement count for the fit to
///   be attempted.
/// * `seed_error_rescale`: covariance inflation factor for the seed.
///
/// Return
/// ----------
/// * [`FitOutcome::Fitted`] with the forward sequence, or
///   [`FitOutcome::Failed`] naming the first obstacle. A failure concerns
///   this direction only.
pub fn run_forward(
    measurements: &[Measurement],
    snapshot: &ConditionsSnapshot,
    direction: Direction,
    seed: &TrajectoryState,
    min_measurements: usize,
    seed_error_rescale: f64,
) -> FitOutcome {
    if measurements.len() < min_measurements {
        return FitOutcome::Failed(FitFailure::TooFewMeasurements {
            kept: measurements.len(),
            required: min_measurements,
        });
    }

    let components = snapshot.components(direction);
    let ordered: Vec<&Measurement> = match direction {
        Direction::InsideOut => measurements.iter().collect(),
        Direction::OutsideIn => measurements.iter().rev().collect(),
    };

    let mut state = seed.rescaled(seed_error_rescale);
    let mut points = Vec::with_capacity(ordered.len());
    let mut chi2 = 0.0;

    for (index, measurement) in ordered.into_iter().enumerate() {
        let Some(predicted) = components.propagator().propagate(&state, measurement.surface)
        else {
            debug!("{direction} forward pass: miss at measurement {index}");
            return FitOutcome::Failed(FitFailure::PropagationMiss { index });
        };

        let Some(filtered) = components.fitter().update(&predicted, measurement) else {
            debug!("{direction} forward pass: update rejected at measurement {index}");
            return FitOutcome::Failed(FitFailure::UpdateRejected { index });
        };

        chi2 += filtered.chi2_increment;
        state = filtered.state.clone();
        points.push(ForwardPoint {
            measurement: measurement.clone(),
            predicted,
            filtered: filtered.state,
            chi2_increment: filtered.chi2_increment,
        });
    }

    debug!(
        "{direction} forward pass: {} points, chi2 {chi2:.3}",
        points.len()
    );

    FitOutcome::Fitted(ForwardSequence {
        direction,
        points,
        chi2,
    })
}
