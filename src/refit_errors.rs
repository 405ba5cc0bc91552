use thiserror::Error;

use crate::conditions::source::ConditionsKind;
use crate::measurements::det_id::DetId;

#[derive(Error, Debug, Clone)]
pub enum RefitError {
    #[error("conditions fetch failed for {kind}: {reason}")]
    ConditionsFetch { kind: ConditionsKind, reason: String },

    #[error("mismatched direction pairing: expected {expected}, got {actual}")]
    MismatchedDirectionPairing {
        expected: crate::fit::Direction,
        actual: crate::fit::Direction,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("rechit construction failed for {id}: {reason}")]
    RecHitConstruction { id: DetId, reason: String },
}
