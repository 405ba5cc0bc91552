//! # Fit-ready measurements and the builder adapter
//!
//! A track arrives as a list of **raw hits**: detector-local readings that
//! still need calibration and surface association before the fit can consume
//! them. The per-subsystem [`RecHitBuilder`] capability performs that
//! translation; [`build_measurements`] drives it for a whole track, applying
//! the measurement filter and preserving the input order of kept hits.

use log::debug;
use nalgebra::{DMatrix, DVector};

use crate::conditions::ConditionsSnapshot;
use crate::constants::SurfaceId;
use crate::measurements::det_id::{DetId, SubsystemFamily};
use crate::measurements::hit_filter::{keep, FilterPolicy};
use crate::refit_errors::RefitError;
use crate::track::Track;

/// Uncalibrated hit reference as carried by the input track.
#[derive(Debug, Clone)]
pub struct RawHit {
    pub id: DetId,
    /// Surface the hit was recorded on.
    pub surface: SurfaceId,
    /// Raw local reading, builder-specific interpretation.
    pub raw_local: DVector<f64>,
    /// Raw local variance estimate.
    pub raw_variance: DMatrix<f64>,
    /// Invalid hits never enter the fit.
    pub valid: bool,
}

/// One fit-ready hit: local measurement vector with uncertainty, tied to the
/// surface it lies on. Produced by a [`RecHitBuilder`], consumed (never
/// mutated) by the fit.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub id: DetId,
    pub local_position: DVector<f64>,
    pub local_covariance: DMatrix<f64>,
    pub surface: SurfaceId,
}

impl Measurement {
    /// Dimension of the local measurement vector.
    #[inline]
    pub fn dim(&self) -> usize {
        self.local_position.len()
    }
}

/// Per-subsystem rechit construction capability.
///
/// Implementations translate a raw detector reading into calibrated local
/// coordinates on the hit's surface. Construction failures indicate broken
/// conditions and are fatal for the transform call.
pub trait RecHitBuilder: Send + Sync {
    fn build(&self, hit: &RawHit) -> Result<Measurement, RefitError>;
}

/// Turn a track's raw hit list into filtered, fit-ready measurements.
///
/// Iterates the hits in their original order, skips invalid hits, applies
/// the [`FilterPolicy`] through the snapshot topology, and dispatches each
/// surviving hit to the rechit builder of its subsystem family. Rejected
/// hits are dropped without replacement; the relative order of kept hits is
/// preserved.
///
/// Arguments
/// -----------------
/// * `track`: the input track (read-only).
/// * `snapshot`: the current conditions bundle (builders + topology).
/// * `policy`: the skip rules to apply.
///
/// Return
/// ----------
/// * The ordered kept measurements. An empty vector is a valid result and
///   means "no usable measurements", not an error.
pub fn build_measurements(
    track: &Track,
    snapshot: &ConditionsSnapshot,
    policy: &FilterPolicy,
) -> Result<Vec<Measurement>, RefitError> {
    let topology = snapshot.topology();
    let mut kept = Vec::with_capacity(track.hits.len());
    let mut dropped = 0usize;

    for hit in &track.hits {
        if !hit.valid {
            dropped += 1;
            continue;
        }
        if !keep(hit.id, policy, topology.as_ref()) {
            dropped += 1;
            continue;
        }
        let builder = match hit.id.family() {
            Some(SubsystemFamily::Tracker) => snapshot.tracker_rechit_builder(),
            Some(SubsystemFamily::Muon) => snapshot.muon_rechit_builder(),
            // Ids without a known family never pass `keep`.
            None => {
                dropped += 1;
                continue;
            }
        };
        kept.push(builder.build(hit)?);
    }

    debug!(
        "measurement building: {} kept, {} dropped of {} raw hits",
        kept.len(),
        dropped,
        track.hits.len()
    );

    Ok(kept)
}
