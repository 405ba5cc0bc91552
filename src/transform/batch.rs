//! # Batch refit over track sets
//!
//! Run the [`TrackTransformer`](crate::transform::TrackTransformer) over a
//! whole [`TrackSet`], collect **per-track outcomes**, and expose convenience
//! helpers to summarize hit counts.
//!
//! ## Result model
//!
//! Batch outcomes are returned as a [`FullRefitResult`]:
//!
//! ```text
//! TrackId → Result<Vec<Trajectory>, RefitError>
//! ```
//!
//! * `Ok(trajectories)` – the refit ran; the vector may be empty (all hits
//!   filtered out, or every direction failed),
//! * `Err(RefitError)` – a failure **isolated** to that track (other tracks
//!   continue to be processed).
//!
//! ## Performance notes
//!
//! * The loop walks the underlying map once; overall time scales with the
//!   number of tracks × the cost of one transform call.
//! * Results are accumulated in a `HashMap` that uses `ahash::RandomState`,
//!   matching the container hasher used elsewhere in the crate.
//! * Tracks themselves are never mutated.

use ahash::RandomState;
use std::collections::HashMap;
use std::fmt;

use crate::constants::TrackId;
use crate::refit_errors::RefitError;
use crate::track::TrackSet;
use crate::trajectory::Trajectory;
use crate::transform::TrackTransformer;

/// Full batch refit results, one entry per processed track.
pub type FullRefitResult = HashMap<TrackId, Result<Vec<Trajectory>, RefitError>, RandomState>;

/// Summary statistics on raw hit counts per track.
///
/// `Display` is compact by default and a pretty multi-line table with the
/// alternate flag (`{:#}`).
#[derive(Debug, Clone, Copy)]
pub struct HitCountStats {
    pub min: usize,
    pub p25: usize,
    pub median: usize,
    pub p95: usize,
    pub max: usize,
}

impl fmt::Display for HitCountStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Hit count per track — summary")?;
            writeln!(f, "-----------------------------")?;
            writeln!(f, "min    : {}", self.min)?;
            writeln!(f, "p25    : {}", self.p25)?;
            writeln!(f, "median : {}", self.median)?;
            writeln!(f, "p95    : {}", self.p95)?;
            write!(f, "max    : {}", self.max)
        } else {
            write!(
                f,
                "min={}, p25={}, median={}, p95={}, max={}",
                self.min, self.p25, self.median, self.p95, self.max
            )
        }
    }
}

/// Batch refit and set-level metrics over a [`TrackSet`].
pub trait TrackSetRefit {
    /// Refit **every track** in the set and collect the results.
    ///
    /// All tracks are processed with the same transformer (and therefore the
    /// same conditions snapshot generation and parameters). Errors are
    /// isolated: one track failing does not prevent others from being
    /// processed.
    fn refit_all(&self, transformer: &TrackTransformer) -> FullRefitResult;

    /// Total number of raw hits across all tracks.
    fn total_hits(&self) -> usize;

    /// Number of tracks in the set.
    fn number_of_tracks(&self) -> usize;

    /// Summary statistics on per-track hit counts, or `None` for an empty
    /// set.
    fn hit_count_stats(&self) -> Option<HitCountStats>;
}

impl TrackSetRefit for TrackSet {
    fn refit_all(&self, transformer: &TrackTransformer) -> FullRefitResult {
        let mut results: FullRefitResult = HashMap::default();
        for (track_id, track) in self.iter() {
            results.insert(*track_id, transformer.transform(track));
        }
        results
    }

    #[inline]
    fn total_hits(&self) -> usize {
        self.values().map(|track| track.hit_count()).sum()
    }

    #[inline]
    fn number_of_tracks(&self) -> usize {
        self.len()
    }

    fn hit_count_stats(&self) -> Option<HitCountStats> {
        let mut counts: Vec<usize> = self.values().map(|track| track.hit_count()).collect();
        if counts.is_empty() {
            return None;
        }

        counts.sort_unstable();

        #[inline]
        fn q_index(n: usize, q: f64) -> usize {
            // Nearest-rank on [0, n-1]; robust for small n.
            let pos = q * (n as f64 - 1.0);
            let idx = pos.round() as isize;
            idx.clamp(0, (n as isize) - 1) as usize
        }

        let n = counts.len();
        Some(HitCountStats {
            min: counts[0],
            p25: counts[q_index(n, 0.25)],
            median: counts[q_index(n, 0.50)],
            p95: counts[q_index(n, 0.95)],
            max: counts[n - 1],
        })
    }
}
