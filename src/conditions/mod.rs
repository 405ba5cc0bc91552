//! # Conditions: versioned snapshot and refresh manager
//!
//! This module defines the [`ConditionsSnapshot`], the immutable bundle of
//! everything the fit needs from the conditions database, and the
//! [`ConditionsManager`] that keeps a current snapshot across conditions
//! change events.
//!
//! ## Overview
//!
//! The original service-pointer pattern ("call `setServices` every event or
//! read stale pointers") is re-architected as an explicitly versioned value:
//!
//! 1. Each **record group** carries an opaque cache id
//!    ([`ConditionsVersion`](crate::conditions::source::ConditionsVersion)).
//! 2. [`ensure_up_to_date`](ConditionsManager::ensure_up_to_date) compares
//!    ids field by field and re-fetches **only** the groups whose id
//!    changed; unchanged groups are reused by shared reference.
//! 3. The result is a fresh immutable [`ConditionsSnapshot`] swapped in as a
//!    whole – concurrent readers observe either the old bundle or the new
//!    one, never a mix.
//!
//! With an unchanged version the call is cheap: a read lock, one comparison,
//! one `Arc` clone, and the very same object graph is returned.
//!
//! ## Failure semantics
//!
//! Conditions are mandatory. Any fetch failure aborts the refresh and leaves
//! the previously held snapshot in place; no partially refreshed bundle is
//! ever exposed.
//!
//! ## See also
//!
//! * [`source`](crate::conditions::source) – provider trait and record
//!   groups.
//! * [`TrackTransformer`](crate::transform::TrackTransformer) – the main
//!   consumer, one `ensure` per transform call.

use log::debug;
use std::sync::{Arc, PoisonError, RwLock};

use crate::fit::Direction;
use crate::geometry::{DetectorGeometry, DetectorTopology, MagneticField};
use crate::measurements::rechit::RecHitBuilder;
use crate::refit_errors::RefitError;

pub mod source;

use source::{
    ConditionsKind, ConditionsSource, ConditionsVersion, DirectionalComponents, GeometryRecord,
    RecHitBuilders, TrackingComponents,
};

/// Immutable, versioned bundle of the objects one transform call fits with.
///
/// Snapshots are shared read-only across all transform calls until the next
/// refresh; a refresh produces a **new** snapshot, never mutates one in
/// place.
pub struct ConditionsSnapshot {
    version: ConditionsVersion,
    components: Arc<TrackingComponents>,
    geometry: GeometryRecord,
    field: Arc<dyn MagneticField>,
    builders: RecHitBuilders,
}

impl ConditionsSnapshot {
    /// Cache ids this snapshot was built against.
    #[inline]
    pub fn version(&self) -> &ConditionsVersion {
        &self.version
    }

    /// The (propagator, fitter, smoother) triple for `direction`.
    #[inline]
    pub fn components(&self, direction: Direction) -> &DirectionalComponents {
        self.components.get(direction)
    }

    /// The tracking geometry handle.
    #[inline]
    pub fn geometry(&self) -> &Arc<dyn DetectorGeometry> {
        &self.geometry.geometry
    }

    /// The detector topology handle.
    #[inline]
    pub fn topology(&self) -> &Arc<dyn DetectorTopology> {
        &self.geometry.topology
    }

    /// The magnetic field handle.
    #[inline]
    pub fn field(&self) -> &Arc<dyn MagneticField> {
        &self.field
    }

    /// Rechit builder for tracker-family hits.
    #[inline]
    pub fn tracker_rechit_builder(&self) -> &dyn RecHitBuilder {
        self.builders.tracker.as_ref()
    }

    /// Rechit builder for muon-family hits.
    #[inline]
    pub fn muon_rechit_builder(&self) -> &dyn RecHitBuilder {
        self.builders.muon.as_ref()
    }
}

/// Keeps the current [`ConditionsSnapshot`] and refreshes it when the
/// requested version disagrees with the held one.
///
/// Refreshes are synchronized behind an `RwLock<Arc<_>>` swap; readers hold
/// the lock only long enough to clone the `Arc` and never lock while
/// fitting.
pub struct ConditionsManager {
    source: Arc<dyn ConditionsSource>,
    tracker_builder_name: String,
    muon_builder_name: String,
    current: RwLock<Option<Arc<ConditionsSnapshot>>>,
}

impl ConditionsManager {
    /// Create a manager over `source`, resolving rechit builders under the
    /// two configured names.
    pub fn new(
        source: Arc<dyn ConditionsSource>,
        tracker_builder_name: impl Into<String>,
        muon_builder_name: impl Into<String>,
    ) -> Self {
        ConditionsManager {
            source,
            tracker_builder_name: tracker_builder_name.into(),
            muon_builder_name: muon_builder_name.into(),
            current: RwLock::new(None),
        }
    }

    /// The currently held snapshot, if any refresh has succeeded yet.
    pub fn current(&self) -> Option<Arc<ConditionsSnapshot>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Refresh against the source's own current version.
    pub fn refresh(&self) -> Result<Arc<ConditionsSnapshot>, RefitError> {
        self.ensure_up_to_date(&self.source.version())
    }

    /// Return a snapshot matching `requested`, re-fetching only the record
    /// groups whose cache id differs from the held snapshot.
    ///
    /// Arguments
    /// -----------------
    /// * `requested`: cache ids the caller's event was recorded under.
    ///
    /// Return
    /// ----------
    /// * The matching snapshot. When no id changed this is the **same**
    ///   object graph as the previous call (reference-identical fields).
    ///
    /// See also
    /// ------------
    /// * [`ConditionsSource`] – performs the per-group fetches.
    pub fn ensure_up_to_date(
        &self,
        requested: &ConditionsVersion,
    ) -> Result<Arc<ConditionsSnapshot>, RefitError> {
        {
            let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(held) = guard.as_ref() {
                if held.version() == requested {
                    return Ok(Arc::clone(held));
                }
            }
        }

        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have refreshed while we waited for the lock.
        if let Some(held) = guard.as_ref() {
            if held.version() == requested {
                return Ok(Arc::clone(held));
            }
        }

        let held = guard.clone();
        let snapshot = self.build_snapshot(held.as_deref(), requested)?;
        *guard = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Compose a snapshot for `requested`, reusing every group whose cache
    /// id matches the held snapshot. A fetch error propagates before any
    /// state changes, so the held snapshot stays exposed untouched.
    fn build_snapshot(
        &self,
        held: Option<&ConditionsSnapshot>,
        requested: &ConditionsVersion,
    ) -> Result<Arc<ConditionsSnapshot>, RefitError> {
        let mut refreshed: Vec<ConditionsKind> = Vec::new();

        let components = match held
            .filter(|h| h.version.tracking_components == requested.tracking_components)
        {
            Some(h) => Arc::clone(&h.components),
            None => {
                refreshed.push(ConditionsKind::TrackingComponents);
                Arc::new(self.source.fetch_tracking_components()?)
            }
        };

        let geometry = match held.filter(|h| h.version.geometry == requested.geometry) {
            Some(h) => h.geometry.clone(),
            None => {
                refreshed.push(ConditionsKind::Geometry);
                self.source.fetch_geometry()?
            }
        };

        let field = match held.filter(|h| h.version.field == requested.field) {
            Some(h) => Arc::clone(&h.field),
            None => {
                refreshed.push(ConditionsKind::Field);
                self.source.fetch_field()?
            }
        };

        let builders = match held.filter(|h| h.version.rechit_builders == requested.rechit_builders)
        {
            Some(h) => h.builders.clone(),
            None => {
                refreshed.push(ConditionsKind::RecHitBuilders);
                self.source
                    .fetch_rechit_builders(&self.tracker_builder_name, &self.muon_builder_name)?
            }
        };

        debug!("conditions refresh: re-fetched {refreshed:?}");

        Ok(Arc::new(ConditionsSnapshot {
            version: *requested,
            components,
            geometry,
            field,
            builders,
        }))
    }
}
