//! # Trajectory states and refitted trajectories
//!
//! Output side of the engine. A [`TrajectoryState`] is a parameter vector
//! with covariance tied to a surface; a [`Trajectory`] is the ordered
//! per-measurement sequence of (predicted, filtered, smoothed) states the
//! two-pass estimation produces, together with its chi-square summary.

use nalgebra::{DMatrix, DVector};
use serde::Serialize;

use crate::constants::SurfaceId;
use crate::fit::Direction;
use crate::measurements::rechit::Measurement;

/// A parameter vector (position/momentum representation) with covariance,
/// tied to a surface.
#[derive(Debug, Clone)]
pub struct TrajectoryState {
    pub parameters: DVector<f64>,
    pub covariance: DMatrix<f64>,
    pub surface: SurfaceId,
}

impl TrajectoryState {
    pub fn new(parameters: DVector<f64>, covariance: DMatrix<f64>, surface: SurfaceId) -> Self {
        TrajectoryState {
            parameters,
            covariance,
            surface,
        }
    }

    /// Dimension of the parameter vector.
    #[inline]
    pub fn dim(&self) -> usize {
        self.parameters.len()
    }

    /// Same parameters with the covariance scaled by `factor`.
    ///
    /// Used to weaken the seed (and backward re-seed) so the refit is driven
    /// by the measurements rather than the incoming estimate.
    pub fn rescaled(&self, factor: f64) -> Self {
        TrajectoryState {
            parameters: self.parameters.clone(),
            covariance: &self.covariance * factor,
            surface: self.surface,
        }
    }
}

/// Per-measurement estimation record: the predicted, filtered, and smoothed
/// states on one measurement's surface.
#[derive(Debug, Clone)]
pub struct TrajectoryPoint {
    pub measurement: Measurement,
    pub predicted: TrajectoryState,
    pub filtered: TrajectoryState,
    /// Minimum-variance estimate; equals `filtered` when `is_smoothed` is
    /// `false` (backward information unavailable at this point).
    pub smoothed: TrajectoryState,
    pub is_smoothed: bool,
    /// Chi-square increment contributed by this measurement's update.
    pub chi2_increment: f64,
}

/// A refitted and smoothed trajectory.
///
/// Points are ordered along the fit direction, one per retained measurement;
/// the sequence is never longer than the filtered measurement count of the
/// input track.
#[derive(Debug, Clone)]
pub struct Trajectory {
    pub direction: Direction,
    pub points: Vec<TrajectoryPoint>,
    pub chi2: f64,
}

impl Trajectory {
    /// A trajectory is valid when it holds at least one estimated point.
    #[inline]
    pub fn is_valid(&self) -> bool {
        !self.points.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Degrees of freedom: total measurement dimension minus the state
    /// dimension, floored at zero.
    pub fn ndof(&self) -> usize {
        let meas_dim: usize = self.points.iter().map(|p| p.measurement.dim()).sum();
        let state_dim = self
            .points
            .first()
            .map(|p| p.filtered.dim())
            .unwrap_or_default();
        meas_dim.saturating_sub(state_dim)
    }

    /// First point along the fit direction.
    pub fn first_point(&self) -> Option<&TrajectoryPoint> {
        self.points.first()
    }

    /// Last point along the fit direction.
    pub fn last_point(&self) -> Option<&TrajectoryPoint> {
        self.points.last()
    }

    /// Compact summary for logging or serialization.
    pub fn summary(&self) -> TrajectorySummary {
        TrajectorySummary {
            direction: self.direction,
            points: self.len(),
            smoothed_points: self.points.iter().filter(|p| p.is_smoothed).count(),
            chi2: self.chi2,
            ndof: self.ndof(),
        }
    }
}

/// Serializable chi-square/size summary of a [`Trajectory`].
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TrajectorySummary {
    pub direction: Direction,
    pub points: usize,
    pub smoothed_points: usize,
    pub chi2: f64,
    pub ndof: usize,
}
