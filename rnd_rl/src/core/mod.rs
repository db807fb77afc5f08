//! Core types and abstractions for RND training.

pub mod diagnostics;
pub mod error;
pub mod return_filter;
pub mod rollout;
pub mod running_stats;

pub use diagnostics::NumericalDiagnostics;
pub use error::{ConfigError, RndError};
pub use return_filter::{FilterDecay, NonEpisodicReturnFilter};
pub use rollout::RolloutStorage;
pub use running_stats::{RunningMoments, SharedRunningMoments};
