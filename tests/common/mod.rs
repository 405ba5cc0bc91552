#![allow(dead_code)]

//! Shared fixture for the integration tests: a synthetic planar detector
//! with straight-line transport and textbook Kalman gain updates, plus a
//! scripted conditions source whose cache ids can be bumped per record
//! group.
//!
//! The toy model: equally spaced planes perpendicular to the propagation
//! axis, surface `k` at `x = k * SPACING`. The state is 2-dimensional
//! `[offset, slope]`, each plane measures the 1-dimensional offset.

use nalgebra::{DMatrix, DVector, Vector3};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use refit::conditions::source::{
    ConditionsKind, ConditionsSource, ConditionsVersion, DirectionalComponents, GeometryRecord,
    RecHitBuilders, TrackingComponents,
};
use refit::constants::SurfaceId;
use refit::fit::capabilities::{FilteredState, FitUpdater, Propagator, SmootherCombiner};
use refit::fit::Direction;
use refit::geometry::{DetectorGeometry, DetectorTopology, MagneticField};
use refit::measurements::det_id::{DetId, TrackerSystem};
use refit::measurements::rechit::{Measurement, RawHit, RecHitBuilder};
use refit::refit_errors::RefitError;
use refit::track::Track;
use refit::trajectory::TrajectoryState;

pub const SPACING: f64 = 1.0;
pub const SEED_SURFACE: SurfaceId = 0;
pub const MEASUREMENT_VARIANCE: f64 = 1.0e-8;

// ---------------------------------------------------------------------------
// Geometry / field / topology
// ---------------------------------------------------------------------------

/// Planes perpendicular to x, surface `k` at `x = k * SPACING`.
pub struct PlanarGeometry {
    pub n_surfaces: u32,
}

impl PlanarGeometry {
    pub fn x_of(&self, id: SurfaceId) -> Option<f64> {
        (id <= self.n_surfaces).then(|| id as f64 * SPACING)
    }
}

impl DetectorGeometry for PlanarGeometry {
    fn surface_position(&self, id: SurfaceId) -> Option<Vector3<f64>> {
        self.x_of(id).map(|x| Vector3::new(x, 0.0, 0.0))
    }
}

/// Field-free region; the toy transport is straight lines.
pub struct UniformField;

impl MagneticField for UniformField {
    fn in_tesla(&self, _position: &Vector3<f64>) -> Vector3<f64> {
        Vector3::zeros()
    }
}

/// Tracker layer = the id's unit number (the fixture builds ids that way).
pub struct UnitLayerTopology;

impl DetectorTopology for UnitLayerTopology {
    fn layer(&self, id: DetId) -> Option<u32> {
        id.tracker_system().map(|_| id.unit())
    }
}

// ---------------------------------------------------------------------------
// Transport and filter-step capabilities
// ---------------------------------------------------------------------------

/// Straight-line transport between planes (valid because the fixture field
/// is zero everywhere).
pub struct LinePropagator {
    geometry: Arc<PlanarGeometry>,
}

impl Propagator for LinePropagator {
    fn propagate(&self, state: &TrajectoryState, target: SurfaceId) -> Option<TrajectoryState> {
        let x_from = self.geometry.x_of(state.surface)?;
        let x_to = self.geometry.x_of(target)?;
        let dx = x_to - x_from;

        let transport = DMatrix::from_row_slice(2, 2, &[1.0, dx, 0.0, 1.0]);
        let parameters = &transport * &state.parameters;
        let covariance = &transport * &state.covariance * transport.transpose();
        Some(TrajectoryState::new(parameters, covariance, target))
    }
}

/// Decorator failing every propagation onto one specific surface.
pub struct MissAt {
    inner: Box<dyn Propagator>,
    surface: SurfaceId,
}

impl Propagator for MissAt {
    fn propagate(&self, state: &TrajectoryState, target: SurfaceId) -> Option<TrajectoryState> {
        if target == self.surface {
            return None;
        }
        self.inner.propagate(state, target)
    }
}

/// Textbook Kalman gain update for the 1-dimensional offset measurement.
pub struct GainUpdater;

impl FitUpdater for GainUpdater {
    fn update(
        &self,
        predicted: &TrajectoryState,
        measurement: &Measurement,
    ) -> Option<FilteredState> {
        let h = DMatrix::from_row_slice(1, 2, &[1.0, 0.0]);
        let residual = &measurement.local_position - &h * &predicted.parameters;
        let innovation_cov =
            &h * &predicted.covariance * h.transpose() + &measurement.local_covariance;
        let innovation_inv = innovation_cov.try_inverse()?;

        let gain = &predicted.covariance * h.transpose() * &innovation_inv;
        let parameters = &predicted.parameters + &gain * &residual;
        let identity = DMatrix::identity(2, 2);
        let covariance = (&identity - &gain * &h) * &predicted.covariance;
        let chi2_increment = (residual.transpose() * &innovation_inv * &residual)[(0, 0)];

        Some(FilteredState {
            state: TrajectoryState::new(parameters, covariance, predicted.surface),
            chi2_increment,
        })
    }
}

/// Information-weighted mean of two states on the same surface.
pub struct MeanCombiner;

impl SmootherCombiner for MeanCombiner {
    fn combine(&self, filtered: &TrajectoryState, backward: &TrajectoryState) -> TrajectoryState {
        let Some(info_f) = filtered.covariance.clone().try_inverse() else {
            return filtered.clone();
        };
        let Some(info_b) = backward.covariance.clone().try_inverse() else {
            return filtered.clone();
        };
        let Some(covariance) = (&info_f + &info_b).try_inverse() else {
            return filtered.clone();
        };
        let parameters =
            &covariance * (&info_f * &filtered.parameters + &info_b * &backward.parameters);
        TrajectoryState::new(parameters, covariance, filtered.surface)
    }
}

/// Calibration-free rechit construction: the raw reading already is the
/// local measurement. Fails on surfaces the geometry does not know.
pub struct PassThroughBuilder {
    geometry: Arc<PlanarGeometry>,
}

impl RecHitBuilder for PassThroughBuilder {
    fn build(&self, hit: &RawHit) -> Result<Measurement, RefitError> {
        if self.geometry.x_of(hit.surface).is_none() {
            return Err(RefitError::RecHitConstruction {
                id: hit.id,
                reason: format!("surface {} not in geometry", hit.surface),
            });
        }
        Ok(Measurement {
            id: hit.id,
            local_position: hit.raw_local.clone(),
            local_covariance: hit.raw_variance.clone(),
            surface: hit.surface,
        })
    }
}

// ---------------------------------------------------------------------------
// Scripted conditions source
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FetchCounts {
    pub tracking_components: AtomicUsize,
    pub geometry: AtomicUsize,
    pub field: AtomicUsize,
    pub rechit_builders: AtomicUsize,
}

/// Conditions source over the toy detector. Cache ids start at 1 and can be
/// bumped per record group; every fetch is counted. Optionally scripted to
/// fail the field fetch or to miss backward propagation onto one surface.
pub struct ScriptedSource {
    geometry: Arc<PlanarGeometry>,
    version: Mutex<ConditionsVersion>,
    pub counts: FetchCounts,
    fail_field: AtomicBool,
    backward_miss_at: Option<SurfaceId>,
}

impl ScriptedSource {
    pub fn new(n_surfaces: u32) -> Self {
        ScriptedSource {
            geometry: Arc::new(PlanarGeometry { n_surfaces }),
            version: Mutex::new(ConditionsVersion {
                tracking_components: 1,
                geometry: 1,
                field: 1,
                rechit_builders: 1,
            }),
            counts: FetchCounts::default(),
            fail_field: AtomicBool::new(false),
            backward_miss_at: None,
        }
    }

    /// Outside-in propagation (and therefore the inside-out backward sweep)
    /// will miss surface `surface`.
    pub fn with_backward_miss(n_surfaces: u32, surface: SurfaceId) -> Self {
        ScriptedSource {
            backward_miss_at: Some(surface),
            ..Self::new(n_surfaces)
        }
    }

    pub fn bump(&self, kind: ConditionsKind) {
        let mut version = self.version.lock().unwrap();
        match kind {
            ConditionsKind::TrackingComponents => version.tracking_components += 1,
            ConditionsKind::Geometry => version.geometry += 1,
            ConditionsKind::Field => version.field += 1,
            ConditionsKind::RecHitBuilders => version.rechit_builders += 1,
        }
    }

    pub fn fail_field_fetches(&self) {
        self.fail_field.store(true, Ordering::SeqCst);
    }

    fn line_propagator(&self) -> Box<dyn Propagator> {
        Box::new(LinePropagator {
            geometry: Arc::clone(&self.geometry),
        })
    }
}

impl ConditionsSource for ScriptedSource {
    fn version(&self) -> ConditionsVersion {
        *self.version.lock().unwrap()
    }

    fn fetch_tracking_components(&self) -> Result<TrackingComponents, RefitError> {
        self.counts.tracking_components.fetch_add(1, Ordering::SeqCst);

        let inside_out = DirectionalComponents::new(
            Direction::InsideOut,
            Arc::new(LinePropagator {
                geometry: Arc::clone(&self.geometry),
            }),
            Arc::new(GainUpdater),
            Arc::new(MeanCombiner),
        );

        let outside_in_propagator: Arc<dyn Propagator> = match self.backward_miss_at {
            Some(surface) => Arc::new(MissAt {
                inner: self.line_propagator(),
                surface,
            }),
            None => Arc::new(LinePropagator {
                geometry: Arc::clone(&self.geometry),
            }),
        };
        let outside_in = DirectionalComponents::new(
            Direction::OutsideIn,
            outside_in_propagator,
            Arc::new(GainUpdater),
            Arc::new(MeanCombiner),
        );

        TrackingComponents::new(inside_out, outside_in)
    }

    fn fetch_geometry(&self) -> Result<GeometryRecord, RefitError> {
        self.counts.geometry.fetch_add(1, Ordering::SeqCst);
        Ok(GeometryRecord {
            geometry: Arc::new(PlanarGeometry {
                n_surfaces: self.geometry.n_surfaces,
            }),
            topology: Arc::new(UnitLayerTopology),
        })
    }

    fn fetch_field(&self) -> Result<Arc<dyn MagneticField>, RefitError> {
        self.counts.field.fetch_add(1, Ordering::SeqCst);
        if self.fail_field.load(Ordering::SeqCst) {
            return Err(RefitError::ConditionsFetch {
                kind: ConditionsKind::Field,
                reason: "provider offline".to_string(),
            });
        }
        Ok(Arc::new(UniformField))
    }

    fn fetch_rechit_builders(
        &self,
        _tracker_name: &str,
        _muon_name: &str,
    ) -> Result<RecHitBuilders, RefitError> {
        self.counts.rechit_builders.fetch_add(1, Ordering::SeqCst);
        Ok(RecHitBuilders {
            tracker: Arc::new(PassThroughBuilder {
                geometry: Arc::clone(&self.geometry),
            }),
            muon: Arc::new(PassThroughBuilder {
                geometry: Arc::clone(&self.geometry),
            }),
        })
    }
}

// ---------------------------------------------------------------------------
// Synthetic tracks
// ---------------------------------------------------------------------------

/// True offset of the fixture line at surface `id`.
pub fn truth_at(offset: f64, slope: f64, id: SurfaceId) -> f64 {
    offset + slope * (id as f64 * SPACING)
}

/// Seed state at the reference surface, deliberately off the true line with
/// a loose covariance.
pub fn perturbed_seed(offset: f64, slope: f64) -> TrajectoryState {
    TrajectoryState::new(
        DVector::from_vec(vec![offset + 0.5, slope - 0.1]),
        DMatrix::identity(2, 2) * 100.0,
        SEED_SURFACE,
    )
}

pub fn hit(id: DetId, surface: SurfaceId, local: f64, variance: f64) -> RawHit {
    RawHit {
        id,
        surface,
        raw_local: DVector::from_vec(vec![local]),
        raw_variance: DMatrix::from_vec(1, 1, vec![variance]),
        valid: true,
    }
}

/// Tracker-only track: noiseless hits on surfaces `1..=n` along the line
/// `offset + slope * x`.
pub fn straight_tracker_track(n: u32, offset: f64, slope: f64) -> Track {
    let hits = (1..=n)
        .map(|k| {
            hit(
                DetId::tracker(TrackerSystem::InnerBarrel, k),
                k,
                truth_at(offset, slope, k),
                MEASUREMENT_VARIANCE,
            )
        })
        .collect();
    Track::new(hits, perturbed_seed(offset, slope), -1)
}

/// The policy-example track: five tracker hits followed by three DT hits at
/// stations 1, 2, 3.
pub fn mixed_track(offset: f64, slope: f64) -> Track {
    let mut hits: Vec<RawHit> = (1..=5u32)
        .map(|k| {
            hit(
                DetId::tracker(TrackerSystem::InnerBarrel, k),
                k,
                truth_at(offset, slope, k),
                MEASUREMENT_VARIANCE,
            )
        })
        .collect();
    for (station, surface) in [(1u8, 6u32), (2, 7), (3, 8)] {
        hits.push(hit(
            DetId::dt(station, 0, surface),
            surface,
            truth_at(offset, slope, surface),
            MEASUREMENT_VARIANCE,
        ));
    }
    Track::new(hits, perturbed_seed(offset, slope), 1)
}
