//! # Conditions provider interface
//!
//! The external conditions database is reached through the
//! [`ConditionsSource`] trait: one fallible fetch per **record group**, each
//! group tagged with an opaque [`CacheId`]. The grouping matches how the
//! records change together upstream:
//!
//! * `TrackingComponents` – both directions' (propagator, fitter, smoother)
//!   triples,
//! * `Geometry` – tracking geometry plus detector topology,
//! * `Field` – magnetic field map,
//! * `RecHitBuilders` – per-subsystem rechit builders, resolved by name.
//!
//! A fetch never returns a partially built group; the manager composes whole
//! groups into an immutable snapshot.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::constants::CacheId;
use crate::fit::capabilities::{FitUpdater, Propagator, SmootherCombiner};
use crate::fit::Direction;
use crate::geometry::{DetectorGeometry, DetectorTopology, MagneticField};
use crate::measurements::rechit::RecHitBuilder;
use crate::refit_errors::RefitError;

/// Names the record group a conditions operation refers to; used in error
/// reporting and refresh diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConditionsKind {
    TrackingComponents,
    Geometry,
    Field,
    RecHitBuilders,
}

impl fmt::Display for ConditionsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionsKind::TrackingComponents => write!(f, "tracking components"),
            ConditionsKind::Geometry => write!(f, "geometry"),
            ConditionsKind::Field => write!(f, "magnetic field"),
            ConditionsKind::RecHitBuilders => write!(f, "rechit builders"),
        }
    }
}

/// Cache ids of every record group at one point in time.
///
/// Two equal versions guarantee the underlying records are identical, which
/// is what lets [`ensure_up_to_date`](crate::conditions::ConditionsManager::ensure_up_to_date)
/// skip re-fetches entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ConditionsVersion {
    pub tracking_components: CacheId,
    pub geometry: CacheId,
    pub field: CacheId,
    pub rechit_builders: CacheId,
}

/// The (propagator, fitter, smoother) triple of one traversal direction.
///
/// Propagation and fit must agree on the traversal sign convention; building
/// the triple under a single direction tag pins that pairing once, at
/// construction, instead of trusting every call site.
pub struct DirectionalComponents {
    direction: Direction,
    propagator: Arc<dyn Propagator>,
    fitter: Arc<dyn FitUpdater>,
    smoother: Arc<dyn SmootherCombiner>,
}

impl DirectionalComponents {
    pub fn new(
        direction: Direction,
        propagator: Arc<dyn Propagator>,
        fitter: Arc<dyn FitUpdater>,
        smoother: Arc<dyn SmootherCombiner>,
    ) -> Self {
        DirectionalComponents {
            direction,
            propagator,
            fitter,
            smoother,
        }
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    pub fn propagator(&self) -> &dyn Propagator {
        self.propagator.as_ref()
    }

    #[inline]
    pub fn fitter(&self) -> &dyn FitUpdater {
        self.fitter.as_ref()
    }

    #[inline]
    pub fn smoother(&self) -> &dyn SmootherCombiner {
        self.smoother.as_ref()
    }
}

impl fmt::Debug for DirectionalComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectionalComponents")
            .field("direction", &self.direction)
            .finish_non_exhaustive()
    }
}

/// Both directions' component triples, direction-checked at construction.
#[derive(Debug)]
pub struct TrackingComponents {
    inside_out: DirectionalComponents,
    outside_in: DirectionalComponents,
}

impl TrackingComponents {
    /// Bundle the two directional triples.
    ///
    /// Return
    /// ----------
    /// * `Err(RefitError::MismatchedDirectionPairing)` when a triple is
    ///   handed in under the wrong slot; the configuration invariant of the
    ///   pairing is validated here, once, and never per fit call.
    pub fn new(
        inside_out: DirectionalComponents,
        outside_in: DirectionalComponents,
    ) -> Result<Self, RefitError> {
        if inside_out.direction() != Direction::InsideOut {
            return Err(RefitError::MismatchedDirectionPairing {
                expected: Direction::InsideOut,
                actual: inside_out.direction(),
            });
        }
        if outside_in.direction() != Direction::OutsideIn {
            return Err(RefitError::MismatchedDirectionPairing {
                expected: Direction::OutsideIn,
                actual: outside_in.direction(),
            });
        }
        Ok(TrackingComponents {
            inside_out,
            outside_in,
        })
    }

    /// The component triple matching `direction`.
    #[inline]
    pub fn get(&self, direction: Direction) -> &DirectionalComponents {
        match direction {
            Direction::InsideOut => &self.inside_out,
            Direction::OutsideIn => &self.outside_in,
        }
    }
}

/// Geometry record group: tracking geometry plus detector topology, which
/// change together upstream.
#[derive(Clone)]
pub struct GeometryRecord {
    pub geometry: Arc<dyn DetectorGeometry>,
    pub topology: Arc<dyn DetectorTopology>,
}

/// Rechit-builder record group, one builder per subsystem family.
#[derive(Clone)]
pub struct RecHitBuilders {
    pub tracker: Arc<dyn RecHitBuilder>,
    pub muon: Arc<dyn RecHitBuilder>,
}

/// External conditions provider.
///
/// `version` must be cheap: it is queried on every transform call to decide
/// whether any fetch is needed at all. The `fetch_*` methods may block on
/// provider I/O; they are only invoked for groups whose cache id changed.
pub trait ConditionsSource: Send + Sync {
    /// Current cache ids of all record groups.
    fn version(&self) -> ConditionsVersion;

    fn fetch_tracking_components(&self) -> Result<TrackingComponents, RefitError>;

    fn fetch_geometry(&self) -> Result<GeometryRecord, RefitError>;

    fn fetch_field(&self) -> Result<Arc<dyn MagneticField>, RefitError>;

    /// Resolve the per-subsystem rechit builders by configured name.
    fn fetch_rechit_builders(
        &self,
        tracker_name: &str,
        muon_name: &str,
    ) -> Result<RecHitBuilders, RefitError>;
}
