//! # Measurements: identifiers, filtering policy, and rechit construction
//!
//! Everything between a track's raw hit list and the fit-ready measurement
//! sequence the Kalman passes consume:
//!
//! * [`det_id`](crate::measurements::det_id) – packed [`DetId`](crate::measurements::det_id::DetId)
//!   with subsystem/station/wheel decomposition.
//! * [`hit_filter`](crate::measurements::hit_filter) – pure per-identifier
//!   eligibility policy with tri-state skip rules.
//! * [`rechit`](crate::measurements::rechit) – the [`RecHitBuilder`](crate::measurements::rechit::RecHitBuilder)
//!   capability and the order-preserving [`build_measurements`](crate::measurements::rechit::build_measurements)
//!   adapter.

pub mod det_id;
pub mod hit_filter;
pub mod rechit;

pub use det_id::{DetId, MuonTechnology, SubsystemFamily, TrackerSystem};
pub use hit_filter::FilterPolicy;
pub use rechit::{build_measurements, Measurement, RawHit, RecHitBuilder};
