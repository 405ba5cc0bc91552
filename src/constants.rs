//! # Constants and type definitions for Refit
//!
//! This module centralizes the **opaque key aliases** and **engine-wide
//! defaults** used throughout the `refit` library.
//!
//! ## Overview
//!
//! - Opaque identifier aliases (cache tags, surfaces, tracks)
//! - Default tuning constants for the refit engine
//!
//! These definitions are used by all main modules, including the conditions
//! manager, the measurement builders, and the fit/smooth passes.

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Opaque version tag attached to a conditions record group.
///
/// Two fetches of the same record group with equal cache ids are guaranteed
/// to describe identical payloads; the conditions manager compares these tags
/// to decide whether a re-fetch is needed.
pub type CacheId = u64;

/// Opaque key identifying a detector surface within the tracking geometry.
pub type SurfaceId = u32;

/// Identifier of a reconstructed track inside a [`TrackSet`](crate::track::TrackSet).
pub type TrackId = u64;

// -------------------------------------------------------------------------------------------------
// Engine defaults
// -------------------------------------------------------------------------------------------------

/// Default minimum number of measurements a direction must retain for its
/// fit to be attempted.
pub const DEFAULT_MIN_MEASUREMENTS: usize = 2;

/// Default factor applied to the seed (and backward re-seed) covariance so
/// the refit is driven by the measurements rather than the input estimate.
pub const DEFAULT_SEED_ERROR_RESCALE: f64 = 100.0;
