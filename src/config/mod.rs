//! Live Configuration
//!
//! A flat set of named tunables mutable at runtime by a host settings UI.
//! Every mutation publishes a new immutable snapshot and bumps a version
//! counter; components cache a snapshot and re-read it when the version moves.

pub mod options;
pub mod store;
pub mod value;

pub use options::{PowerModeOptions, OPTION_NAMES};
pub use store::{ConfigSnapshot, ConfigStore};
pub use value::{ConfigFormat, ConfigValue};
