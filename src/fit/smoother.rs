//! # Backward smoothing pass
//!
//! Second half of the two-pass estimation. A backward filter runs over the
//! forward sequence in reverse: seeded from the terminal filtered state with
//! rescaled covariance, it predicts onto each earlier surface and is updated
//! with that surface's measurement. At every interior point the smoothed
//! state is the combination of the forward-filtered state (information from
//! measurements behind) with the backward prediction (information from
//! measurements ahead); the terminal point has nothing ahead of it, so its
//! smoothed state equals its forward-filtered state.
//!
//! Failure policy is partial, not all-or-nothing: a backward propagation
//! miss degrades the affected point to its forward estimate and re-seeds the
//! backward filter there; the rest of the trajectory keeps full smoothing.

use log::warn;

use crate::conditions::ConditionsSnapshot;
use crate::fit::runner::ForwardSequence;
use crate::trajectory::{Trajectory, TrajectoryPoint};

/// Run the backward sweep over a forward sequence.
///
/// The reverse transport uses the **opposite** direction's propagator (its
/// sign convention matches the backward traversal) while the combination
/// rule comes from this direction's smoother component.
///
/// Arguments
/// -----------------
/// * `forward`: the forward pass output, consumed into the trajectory.
/// * `snapshot`: conditions bundle supplying both directions' components.
/// * `seed_error_rescale`: covariance inflation for the backward (re-)seed.
///
/// Return
/// ----------
/// * The smoothed [`Trajectory`]. Points where backward information was
///   unavailable carry `is_smoothed == false` and fall back to the forward
///   estimate.
pub fn smooth(
    forward: ForwardSequence,
    snapshot: &ConditionsSnapshot,
    seed_error_rescale: f64,
) -> Trajectory {
    let direction = forward.direction;
    let combiner = snapshot.components(direction).smoother();
    let backward = snapshot.components(direction.opposite());
    let chi2 = forward.chi2;

    let n = forward.points.len();
    let mut smoothed_points: Vec<TrajectoryPoint> = Vec::with_capacity(n);

    // Walk the forward sequence from its terminal point backwards.
    let mut backward_state = None;
    for point in forward.points.into_iter().rev() {
        let (smoothed, is_smoothed, next_backward) = match backward_state.take() {
            // Terminal point: no information ahead to combine with. The
            // backward filter starts here, weakened by the rescaling.
            None => (
                point.filtered.clone(),
                true,
                point.filtered.rescaled(seed_error_rescale),
            ),
            Some(state) => {
                match backward.propagator().propagate(&state, point.measurement.surface) {
                    Some(predicted) => {
                        let smoothed = combiner.combine(&point.filtered, &predicted);
                        // Fold this measurement into the backward filter for
                        // the points further back; a rejected update keeps
                        // the prediction.
                        let next = match backward.fitter().update(&predicted, &point.measurement)
                        {
                            Some(updated) => updated.state,
                            None => predicted,
                        };
                        (smoothed, true, next)
                    }
                    None => {
                        warn!(
                            "{direction} smoothing: backward miss on surface {}, keeping forward estimate",
                            point.measurement.surface
                        );
                        (
                            point.filtered.clone(),
                            false,
                            point.filtered.rescaled(seed_error_rescale),
                        )
                    }
                }
            }
        };
        backward_state = Some(next_backward);

        smoothed_points.push(TrajectoryPoint {
            measurement: point.measurement,
            predicted: point.predicted,
            filtered: point.filtered,
            smoothed,
            is_smoothed,
            chi2_increment: point.chi2_increment,
        });
    }

    // Restore fit order.
    smoothed_points.reverse();

    Trajectory {
        direction,
        points: smoothed_points,
        chi2,
    }
}
