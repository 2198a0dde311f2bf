//! usbmatch - match attached storage devices against identifying properties
//!
//! Answers "is a device with these properties (serial, vendor, model, UUID,
//! ...) attached?" by asking the UDisks daemon over the system D-Bus.
//!
//! # Backends
//!
//! - **UDisks1** ([`legacy`]): enumerates device object paths and fetches one
//!   property per call. Reports *which* device matched.
//! - **UDisks2** ([`tree`]): fetches the whole object tree and scans cached
//!   properties. Reports only *that* a device matched.
//!
//! Both sit behind [`matcher::DeviceMatcher`]. A constraint whose expected
//! value is empty always holds, so configuration-derived lists can be passed
//! in unfiltered.

pub mod bus;
pub mod cli;
pub mod commands;
pub mod config;
pub mod constraint;
pub mod device;
pub mod error;
pub mod legacy;
pub mod matcher;
pub mod output;
pub mod property;
pub mod strings;
pub mod tree;
pub mod volume;
pub mod wire;

pub use cli::{Cli, Commands};
pub use constraint::{Constraint, ConstraintList};
pub use error::HalError;
pub use matcher::{Backend, MatchOutcome, device_exists, resolve_device};
