pub mod conditions;
pub mod constants;
pub mod fit;
pub mod geometry;
pub mod measurements;
pub mod refit_errors;
pub mod track;
pub mod trajectory;
pub mod transform;

pub use conditions::{ConditionsManager, ConditionsSnapshot};
pub use fit::Direction;
pub use measurements::{DetId, FilterPolicy};
pub use refit_errors::RefitError;
pub use track::{Track, TrackSet};
pub use trajectory::{Trajectory, TrajectoryState};
pub use transform::{TrackSetRefit, TrackTransformer, TransformerParams};
