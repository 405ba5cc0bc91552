//! # Detector identifiers
//!
//! [`DetId`] is the opaque key attached to every raw hit and measurement. The
//! refit engine only ever needs two things from it: **equality** and
//! **decomposition** into the pieces the measurement filter reasons about
//! (subsystem family, tracker system, muon technology, station, wheel).
//! Tracker layer/section numbering is *not* part of the id itself; it is
//! resolved through the [`DetectorTopology`](crate::geometry::DetectorTopology)
//! capability held by the conditions snapshot.
//!
//! The packed layout is an internal convention of this crate:
//!
//! ```text
//! bits 28..32  subsystem family   (1 = tracker, 2 = muon)
//! bits 24..28  tracker system / muon technology
//! bits 20..24  station            (muon only)
//! bits 16..20  wheel + 8          (DT only, offset-coded for negatives)
//! bits  0..16  unit number within the subsystem
//! ```

use serde::Serialize;
use std::fmt;

const FAMILY_SHIFT: u32 = 28;
const SYSTEM_SHIFT: u32 = 24;
const STATION_SHIFT: u32 = 20;
const WHEEL_SHIFT: u32 = 16;
const WHEEL_OFFSET: i8 = 8;

const FAMILY_TRACKER: u32 = 1;
const FAMILY_MUON: u32 = 2;

/// Coarse subsystem family a hit belongs to; selects the rechit builder and
/// the filter branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SubsystemFamily {
    Tracker,
    Muon,
}

/// Tracker sub-structure, numbered as in the source detector description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum TrackerSystem {
    PixelBarrel = 1,
    PixelEndcap = 2,
    InnerBarrel = 3,
    InnerDisks = 4,
    OuterBarrel = 5,
    Endcap = 6,
}

impl TrackerSystem {
    fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(TrackerSystem::PixelBarrel),
            2 => Some(TrackerSystem::PixelEndcap),
            3 => Some(TrackerSystem::InnerBarrel),
            4 => Some(TrackerSystem::InnerDisks),
            5 => Some(TrackerSystem::OuterBarrel),
            6 => Some(TrackerSystem::Endcap),
            _ => None,
        }
    }
}

/// Muon detection technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum MuonTechnology {
    /// Drift tubes (barrel).
    Dt = 1,
    /// Cathode strip chambers (endcap).
    Csc = 2,
    /// Resistive plate chambers (trigger system, the secondary technology).
    Rpc = 3,
}

impl MuonTechnology {
    fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(MuonTechnology::Dt),
            2 => Some(MuonTechnology::Csc),
            3 => Some(MuonTechnology::Rpc),
            _ => None,
        }
    }
}

/// Packed detector identifier.
///
/// Construct through the typed helpers ([`DetId::tracker`], [`DetId::dt`],
/// [`DetId::csc`], [`DetId::rpc`]); decompose through the accessors. Ids
/// compare by raw value only.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DetId(u32);

impl DetId {
    /// Identifier of a tracker module.
    ///
    /// Arguments
    /// ---------
    /// * `system`: the tracker sub-structure the module belongs to.
    /// * `unit`: module number within the system (low 16 bits are kept).
    pub fn tracker(system: TrackerSystem, unit: u32) -> Self {
        DetId(
            FAMILY_TRACKER << FAMILY_SHIFT
                | (system as u32) << SYSTEM_SHIFT
                | (unit & 0xFFFF),
        )
    }

    /// Identifier of a DT chamber at `station` (1..=4) and `wheel` (-2..=2).
    pub fn dt(station: u8, wheel: i8, unit: u32) -> Self {
        DetId(
            FAMILY_MUON << FAMILY_SHIFT
                | (MuonTechnology::Dt as u32) << SYSTEM_SHIFT
                | (station as u32 & 0xF) << STATION_SHIFT
                | ((wheel + WHEEL_OFFSET) as u32 & 0xF) << WHEEL_SHIFT
                | (unit & 0xFFFF),
        )
    }

    /// Identifier of a CSC chamber at `station` (1..=4).
    pub fn csc(station: u8, unit: u32) -> Self {
        DetId(
            FAMILY_MUON << FAMILY_SHIFT
                | (MuonTechnology::Csc as u32) << SYSTEM_SHIFT
                | (station as u32 & 0xF) << STATION_SHIFT
                | (unit & 0xFFFF),
        )
    }

    /// Identifier of an RPC chamber at `station`.
    pub fn rpc(station: u8, unit: u32) -> Self {
        DetId(
            FAMILY_MUON << FAMILY_SHIFT
                | (MuonTechnology::Rpc as u32) << SYSTEM_SHIFT
                | (station as u32 & 0xF) << STATION_SHIFT
                | (unit & 0xFFFF),
        )
    }

    /// Raw packed value.
    pub fn raw(&self) -> u32 {
        self.0
    }

    /// Subsystem family, or `None` for an id outside this crate's layout.
    pub fn family(&self) -> Option<SubsystemFamily> {
        match self.0 >> FAMILY_SHIFT {
            FAMILY_TRACKER => Some(SubsystemFamily::Tracker),
            FAMILY_MUON => Some(SubsystemFamily::Muon),
            _ => None,
        }
    }

    /// Tracker system of a tracker id, `None` otherwise.
    pub fn tracker_system(&self) -> Option<TrackerSystem> {
        match self.family() {
            Some(SubsystemFamily::Tracker) => {
                TrackerSystem::from_code(self.0 >> SYSTEM_SHIFT & 0xF)
            }
            _ => None,
        }
    }

    /// Muon technology of a muon id, `None` otherwise.
    pub fn technology(&self) -> Option<MuonTechnology> {
        match self.family() {
            Some(SubsystemFamily::Muon) => {
                MuonTechnology::from_code(self.0 >> SYSTEM_SHIFT & 0xF)
            }
            _ => None,
        }
    }

    /// Station of a muon id, `None` for tracker ids.
    pub fn station(&self) -> Option<u8> {
        match self.family() {
            Some(SubsystemFamily::Muon) => Some((self.0 >> STATION_SHIFT & 0xF) as u8),
            _ => None,
        }
    }

    /// Wheel of a DT id, `None` for everything else.
    pub fn wheel(&self) -> Option<i8> {
        match self.technology() {
            Some(MuonTechnology::Dt) => {
                Some((self.0 >> WHEEL_SHIFT & 0xF) as i8 - WHEEL_OFFSET)
            }
            _ => None,
        }
    }

    /// Unit number within the subsystem.
    pub fn unit(&self) -> u32 {
        self.0 & 0xFFFF
    }
}

impl fmt::Debug for DetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DetId({self})")
    }
}

impl fmt::Display for DetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.tracker_system(), self.technology()) {
            (Some(system), _) => write!(f, "{:?}/{}", system, self.unit()),
            (_, Some(MuonTechnology::Dt)) => write!(
                f,
                "DT st{} wh{}/{}",
                self.station().unwrap_or_default(),
                self.wheel().unwrap_or_default(),
                self.unit()
            ),
            (_, Some(tech)) => write!(
                f,
                "{:?} st{}/{}",
                tech,
                self.station().unwrap_or_default(),
                self.unit()
            ),
            _ => write!(f, "raw:{:#010x}", self.0),
        }
    }
}
