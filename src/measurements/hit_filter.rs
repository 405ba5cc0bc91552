//! # Measurement filtering policy
//!
//! Decides, per detector identifier, whether a hit participates in the refit.
//! The decision is a **pure function** of the identifier, the policy record,
//! and the (immutable) detector topology – no hidden state, idempotent by
//! construction.
//!
//! Every skip rule is tri-state: `Some(v)` activates the rule against value
//! `v`, `None` disables it. The original encoding used magic sentinel values
//! for "disabled"; an explicit `Option` removes that trap for station or
//! wheel numbering that could ever collide with the sentinel.

use serde::Serialize;

use crate::geometry::DetectorTopology;
use crate::measurements::det_id::{DetId, MuonTechnology, SubsystemFamily, TrackerSystem};

/// Per-subsystem skip rules, set once at construction and read-only after.
///
/// Defaults keep everything: no skip rule active, RPC hits included.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterPolicy {
    /// Drop DT hits whose station matches.
    pub skip_station_dt: Option<u8>,
    /// Drop CSC hits whose station matches.
    pub skip_station_csc: Option<u8>,
    /// Drop DT hits whose wheel matches.
    pub skip_wheel_dt: Option<i8>,
    /// Tracker system targeted by the section skip rule.
    pub skip_tracker_system: Option<TrackerSystem>,
    /// Layer (section) dropped within `skip_tracker_system`.
    pub skip_tracker_section: Option<u32>,
    /// When `false`, every RPC hit is dropped regardless of station.
    pub rpc_in_the_fit: bool,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        FilterPolicy {
            skip_station_dt: None,
            skip_station_csc: None,
            skip_wheel_dt: None,
            skip_tracker_system: None,
            skip_tracker_section: None,
            rpc_in_the_fit: true,
        }
    }
}

/// Whether the hit identified by `id` is eligible for the fit.
///
/// Dispatches on the subsystem family; ids outside the known layout are
/// never eligible.
pub fn keep(id: DetId, policy: &FilterPolicy, topology: &dyn DetectorTopology) -> bool {
    match id.family() {
        Some(SubsystemFamily::Tracker) => keep_tracker(id, policy, topology),
        Some(SubsystemFamily::Muon) => keep_muon(id, policy),
        None => false,
    }
}

/// Tracker branch: a hit is dropped only when **both** the system and the
/// topology-resolved layer match the active skip rules.
fn keep_tracker(id: DetId, policy: &FilterPolicy, topology: &dyn DetectorTopology) -> bool {
    let (Some(skip_system), Some(skip_section)) =
        (policy.skip_tracker_system, policy.skip_tracker_section)
    else {
        return true;
    };

    if id.tracker_system() != Some(skip_system) {
        return true;
    }

    topology.layer(id) != Some(skip_section)
}

/// Muon branch: station/wheel rules per technology, plus the global RPC
/// switch.
fn keep_muon(id: DetId, policy: &FilterPolicy) -> bool {
    match id.technology() {
        Some(MuonTechnology::Dt) => {
            let station_hit = policy.skip_station_dt.is_some()
                && id.station() == policy.skip_station_dt;
            let wheel_hit =
                policy.skip_wheel_dt.is_some() && id.wheel() == policy.skip_wheel_dt;
            !(station_hit || wheel_hit)
        }
        Some(MuonTechnology::Csc) => {
            !(policy.skip_station_csc.is_some() && id.station() == policy.skip_station_csc)
        }
        Some(MuonTechnology::Rpc) => policy.rpc_in_the_fit,
        None => false,
    }
}
