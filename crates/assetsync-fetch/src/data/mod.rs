//! Immutable data types for conditional fetching.
//!
//! Configuration, the asset descriptor handed to each fetch, the outcome
//! every fetch ends in, and the record persisted between runs.

pub mod max_age;
pub mod options;
pub mod outcome;
pub mod record;

pub use max_age::MaxAge;
pub use options::{AssetDescriptor, DEFAULT_USER_AGENT, FetchConfig};
pub use outcome::UpdateOutcome;
pub use record::AssetRecord;
