//! # Track transformation: parameters and façade
//!
//! This module defines the [`TransformerParams`] configuration struct with
//! its fluent builder, and the [`TrackTransformer`] façade that turns one
//! coarse [`Track`](crate::track::Track) into zero or more refitted,
//! smoothed [`Trajectory`](crate::trajectory::Trajectory) objects.
//!
//! ## Pipeline overview
//!
//! 1. **Conditions** – the snapshot is brought up to date (cache-id
//!    comparison, group-wise re-fetch only when something changed).
//! 2. **Measurement building** – raw hits are filtered through the
//!    [`FilterPolicy`] and translated by the per-subsystem rechit builders,
//!    preserving input order.
//! 3. **Forward pass** – for each admissible [`Direction`], the matching
//!    (propagator, fitter) pair runs the sequential estimation.
//! 4. **Smoothing** – the backward sweep combines forward estimates with
//!    reverse-filter predictions into minimum-variance states.
//!
//! A track whose every hit is filtered out yields an **empty** result, not
//! an error; a direction whose forward pass fails is skipped while the other
//! directions still run.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use refit::transform::{TrackTransformer, TransformerParams};
//! # fn demo(source: Arc<dyn refit::conditions::source::ConditionsSource>,
//! #         track: refit::track::Track) -> Result<(), refit::refit_errors::RefitError> {
//! let params = TransformerParams::builder()
//!     .skip_station_dt(2)
//!     .rpc_in_the_fit(false)
//!     .fit_outside_in(true)
//!     .build()?;
//!
//! let transformer = TrackTransformer::new(source, params);
//! let trajectories = transformer.transform(&track)?;
//! for trajectory in &trajectories {
//!     eprintln!("{:?}", trajectory.summary());
//! }
//! # Ok(()) }
//! ```

use log::debug;
use serde::Serialize;
use smallvec::SmallVec;
use std::sync::Arc;

use crate::conditions::source::ConditionsSource;
use crate::conditions::ConditionsManager;
use crate::constants::{DEFAULT_MIN_MEASUREMENTS, DEFAULT_SEED_ERROR_RESCALE};
use crate::fit::runner::{run_forward, FitOutcome};
use crate::fit::smoother::smooth;
use crate::fit::Direction;
use crate::measurements::det_id::TrackerSystem;
use crate::measurements::hit_filter::FilterPolicy;
use crate::measurements::rechit::build_measurements;
use crate::refit_errors::RefitError;
use crate::track::Track;
use crate::trajectory::Trajectory;

pub mod batch;

pub use batch::{FullRefitResult, HitCountStats, TrackSetRefit};

/// Configuration parameters controlling the behavior of
/// [`TrackTransformer::transform`].
///
/// Fields
/// -----------------
/// **Measurement filtering**
/// * `policy` – per-subsystem skip rules; every rule is tri-state
///   (`None` disables it). See [`FilterPolicy`].
///
/// **Rechit construction**
/// * `tracker_builder_name` / `muon_builder_name` – names under which the
///   conditions provider resolves the per-subsystem builders.
///
/// **Fit control**
/// * `min_measurements` – minimum surviving-measurement count for a
///   direction's fit to be attempted.
/// * `seed_error_rescale` – covariance inflation applied to the seed state
///   (and the backward re-seed) so the refit is measurement-driven.
/// * `fit_inside_out` / `fit_outside_in` – admissible fit directions; at
///   least one must be enabled. With both enabled a single track can yield
///   two trajectories.
///
/// Defaults
/// -----------------
/// * `policy`: keep everything
/// * `tracker_builder_name`: `"WithTrackAngle"`
/// * `muon_builder_name`: `"MuonRecHitBuilder"`
/// * `min_measurements`: 2
/// * `seed_error_rescale`: 100.0
/// * `fit_inside_out`: `true`, `fit_outside_in`: `false`
#[derive(Debug, Clone, Serialize)]
pub struct TransformerParams {
    pub policy: FilterPolicy,
    pub tracker_builder_name: String,
    pub muon_builder_name: String,
    pub min_measurements: usize,
    pub seed_error_rescale: f64,
    pub fit_inside_out: bool,
    pub fit_outside_in: bool,
}

impl Default for TransformerParams {
    fn default() -> Self {
        TransformerParams {
            policy: FilterPolicy::default(),
            tracker_builder_name: "WithTrackAngle".to_string(),
            muon_builder_name: "MuonRecHitBuilder".to_string(),
            min_measurements: DEFAULT_MIN_MEASUREMENTS,
            seed_error_rescale: DEFAULT_SEED_ERROR_RESCALE,
            fit_inside_out: true,
            fit_outside_in: false,
        }
    }
}

impl TransformerParams {
    /// Construct parameters with the documented default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new [`TransformerParamsBuilder`] to configure custom
    /// parameters step by step before building a validated set.
    pub fn builder() -> TransformerParamsBuilder {
        TransformerParamsBuilder::new()
    }

    /// The admissible fit directions, in attempt order.
    pub fn directions(&self) -> SmallVec<[Direction; 2]> {
        let mut directions = SmallVec::new();
        if self.fit_inside_out {
            directions.push(Direction::InsideOut);
        }
        if self.fit_outside_in {
            directions.push(Direction::OutsideIn);
        }
        directions
    }
}

/// Fluent builder for [`TransformerParams`].
///
/// `build` validates the assembled configuration and is the only way to
/// obtain a params value from the builder.
#[derive(Debug, Clone, Default)]
pub struct TransformerParamsBuilder {
    params: TransformerParams,
}

impl TransformerParamsBuilder {
    pub fn new() -> Self {
        TransformerParamsBuilder {
            params: TransformerParams::default(),
        }
    }

    /// Drop DT hits at this station.
    pub fn skip_station_dt(mut self, station: u8) -> Self {
        self.params.policy.skip_station_dt = Some(station);
        self
    }

    /// Drop CSC hits at this station.
    pub fn skip_station_csc(mut self, station: u8) -> Self {
        self.params.policy.skip_station_csc = Some(station);
        self
    }

    /// Drop DT hits on this wheel.
    pub fn skip_wheel_dt(mut self, wheel: i8) -> Self {
        self.params.policy.skip_wheel_dt = Some(wheel);
        self
    }

    /// Drop tracker hits of `system` on layer `section`.
    pub fn skip_tracker(mut self, system: TrackerSystem, section: u32) -> Self {
        self.params.policy.skip_tracker_system = Some(system);
        self.params.policy.skip_tracker_section = Some(section);
        self
    }

    /// Include or exclude RPC hits as a whole.
    pub fn rpc_in_the_fit(mut self, included: bool) -> Self {
        self.params.policy.rpc_in_the_fit = included;
        self
    }

    pub fn tracker_builder_name(mut self, name: impl Into<String>) -> Self {
        self.params.tracker_builder_name = name.into();
        self
    }

    pub fn muon_builder_name(mut self, name: impl Into<String>) -> Self {
        self.params.muon_builder_name = name.into();
        self
    }

    pub fn min_measurements(mut self, min: usize) -> Self {
        self.params.min_measurements = min;
        self
    }

    pub fn seed_error_rescale(mut self, factor: f64) -> Self {
        self.params.seed_error_rescale = factor;
        self
    }

    pub fn fit_inside_out(mut self, enabled: bool) -> Self {
        self.params.fit_inside_out = enabled;
        self
    }

    pub fn fit_outside_in(mut self, enabled: bool) -> Self {
        self.params.fit_outside_in = enabled;
        self
    }

    /// Validate and build the final [`TransformerParams`].
    ///
    /// Return
    /// ----------
    /// * `Err(RefitError::InvalidConfiguration)` when no direction is
    ///   enabled, a builder name is empty, `min_measurements` is zero, or
    ///   `seed_error_rescale` is below one.
    pub fn build(self) -> Result<TransformerParams, RefitError> {
        let params = self.params;
        if !params.fit_inside_out && !params.fit_outside_in {
            return Err(RefitError::InvalidConfiguration(
                "at least one fit direction must be enabled".to_string(),
            ));
        }
        if params.tracker_builder_name.is_empty() || params.muon_builder_name.is_empty() {
            return Err(RefitError::InvalidConfiguration(
                "rechit builder names must not be empty".to_string(),
            ));
        }
        if params.min_measurements == 0 {
            return Err(RefitError::InvalidConfiguration(
                "min_measurements must be at least 1".to_string(),
            ));
        }
        if params.seed_error_rescale < 1.0 {
            return Err(RefitError::InvalidConfiguration(
                "seed_error_rescale must be >= 1.0".to_string(),
            ));
        }
        Ok(params)
    }
}

/// Refit façade: takes a coarse track and returns the refitted, smoothed
/// trajectories.
///
/// One transformer is built per configuration and shared across calls; the
/// only mutable-by-refresh state is the conditions snapshot behind the
/// internal [`ConditionsManager`], so concurrent `transform` calls on
/// independent tracks are safe.
pub struct TrackTransformer {
    params: TransformerParams,
    conditions: ConditionsManager,
}

impl TrackTransformer {
    /// Wire a transformer to its conditions source.
    pub fn new(source: Arc<dyn ConditionsSource>, params: TransformerParams) -> Self {
        let conditions = ConditionsManager::new(
            Arc::clone(&source),
            params.tracker_builder_name.clone(),
            params.muon_builder_name.clone(),
        );
        TrackTransformer { params, conditions }
    }

    #[inline]
    pub fn params(&self) -> &TransformerParams {
        &self.params
    }

    /// The conditions manager, e.g. for snapshot field/geometry access.
    #[inline]
    pub fn conditions(&self) -> &ConditionsManager {
        &self.conditions
    }

    /// Convert one track into refitted trajectories.
    ///
    /// Arguments
    /// -----------------
    /// * `track`: the coarse input track (read-only).
    ///
    /// Return
    /// ----------
    /// * Zero, one, or more trajectories: zero when every hit was filtered
    ///   out or every direction's fit failed, more than one when several
    ///   admissible directions succeed.
    ///
    /// See also
    /// ------------
    /// * [`build_measurements`] – filtering and rechit construction.
    /// * [`run_forward`] / [`smooth`] – the two estimation passes.
    pub fn transform(&self, track: &Track) -> Result<Vec<Trajectory>, RefitError> {
        let snapshot = self.conditions.refresh()?;

        let measurements = build_measurements(track, &snapshot, &self.params.policy)?;
        if measurements.is_empty() {
            debug!(
                "transform: no usable measurements for track with {} hits (charge {})",
                track.hit_count(),
                track.charge
            );
            return Ok(Vec::new());
        }

        let mut trajectories = Vec::new();
        for direction in self.params.directions() {
            match run_forward(
                &measurements,
                &snapshot,
                direction,
                &track.seed,
                self.params.min_measurements,
                self.params.seed_error_rescale,
            ) {
                FitOutcome::Fitted(forward) => {
                    let trajectory = smooth(forward, &snapshot, self.params.seed_error_rescale);
                    debug!("transform: {direction} -> {:?}", trajectory.summary());
                    trajectories.push(trajectory);
                }
                FitOutcome::Failed(failure) => {
                    debug!("transform: {direction} fit failed: {failure}");
                }
            }
        }

        Ok(trajectories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_rejects_empty_direction_set() {
        let err = TransformerParams::builder()
            .fit_inside_out(false)
            .fit_outside_in(false)
            .build();
        assert!(matches!(err, Err(RefitError::InvalidConfiguration(_))));
    }

    #[test]
    fn builder_rejects_zero_min_measurements() {
        let err = TransformerParams::builder().min_measurements(0).build();
        assert!(matches!(err, Err(RefitError::InvalidConfiguration(_))));
    }

    #[test]
    fn builder_rejects_deflating_seed_rescale() {
        let err = TransformerParams::builder().seed_error_rescale(0.5).build();
        assert!(matches!(err, Err(RefitError::InvalidConfiguration(_))));
    }

    #[test]
    fn directions_follow_the_flags() {
        let params = TransformerParams::builder()
            .fit_outside_in(true)
            .build()
            .unwrap();
        assert_eq!(
            params.directions().as_slice(),
            &[Direction::InsideOut, Direction::OutsideIn]
        );

        let oi_only = TransformerParams::builder()
            .fit_inside_out(false)
            .fit_outside_in(true)
            .build()
            .unwrap();
        assert_eq!(oi_only.directions().as_slice(), &[Direction::OutsideIn]);
    }

    #[test]
    fn example_policy_marks_station_two() {
        let params = TransformerParams::builder().skip_station_dt(2).build().unwrap();
        assert_eq!(params.policy.skip_station_dt, Some(2));
        assert_eq!(params.policy.skip_station_csc, None);
        assert!(params.policy.rpc_in_the_fit);
    }
}
