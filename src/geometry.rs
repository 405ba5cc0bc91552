//! # Geometry, field, and topology capability seams
//!
//! The refit engine never owns a detector description. Geometry, magnetic
//! field, and topology are **external collaborators**: they are fetched as
//! part of a [`ConditionsSnapshot`](crate::conditions::ConditionsSnapshot)
//! and consumed through the narrow traits below.
//!
//! ## Overview
//!
//! - [`DetectorGeometry`] – resolve a [`SurfaceId`] to a global reference
//!   position. Propagator and rechit-builder implementations use this to
//!   reach and validate surfaces.
//! - [`MagneticField`] – field vector lookup for curvature-aware
//!   propagators.
//! - [`DetectorTopology`] – tracker layer decomposition for a [`DetId`];
//!   the measurement filter consults it when a tracker section skip rule is
//!   active.
//!
//! All three are object-safe and `Send + Sync`, so implementations can be
//! shared across worker contexts as `Arc<dyn _>` without locking.

use nalgebra::Vector3;

use crate::constants::SurfaceId;
use crate::measurements::det_id::DetId;

/// Read-only view of the tracking geometry.
pub trait DetectorGeometry: Send + Sync {
    /// Global position of the reference point of surface `id`, or `None`
    /// when the geometry does not contain such a surface.
    fn surface_position(&self, id: SurfaceId) -> Option<Vector3<f64>>;
}

/// Read-only view of the magnetic field map.
pub trait MagneticField: Send + Sync {
    /// Field vector in tesla at a global position.
    fn in_tesla(&self, position: &Vector3<f64>) -> Vector3<f64>;
}

/// Read-only view of the detector topology.
///
/// Tracker identifiers keep their layer/section numbering behind this
/// capability; muon identifiers decompose directly on [`DetId`].
pub trait DetectorTopology: Send + Sync {
    /// Layer (section) number of a tracker identifier, or `None` for ids the
    /// topology does not describe.
    fn layer(&self, id: DetId) -> Option<u32>;
}
