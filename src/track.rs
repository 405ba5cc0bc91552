//! # Input tracks
//!
//! A [`Track`] is the immutable input of the refit: an ordered sequence of
//! raw hit references plus the coarse state estimate the original
//! reconstruction produced. The engine only reads tracks; refitting never
//! mutates its input.

use ahash::RandomState;
use std::collections::HashMap;

use crate::constants::TrackId;
use crate::measurements::rechit::RawHit;
use crate::trajectory::TrajectoryState;

/// A coarse reconstructed track to be refitted.
#[derive(Debug, Clone)]
pub struct Track {
    /// Raw hits in their original reconstruction order.
    pub hits: Vec<RawHit>,
    /// Approximate state (position/momentum parameters with covariance) used
    /// to seed the forward pass, tied to a reference surface.
    pub seed: TrajectoryState,
    /// Charge estimate from the original reconstruction.
    pub charge: i8,
}

impl Track {
    pub fn new(hits: Vec<RawHit>, seed: TrajectoryState, charge: i8) -> Self {
        Track { hits, seed, charge }
    }

    /// Number of raw hits carried by the track, valid or not.
    #[inline]
    pub fn hit_count(&self) -> usize {
        self.hits.len()
    }
}

/// A full set of tracks keyed by [`TrackId`].
///
/// Uses [`ahash`](https://docs.rs/ahash) for fast hashing.
pub type TrackSet = HashMap<TrackId, Track, RandomState>;
