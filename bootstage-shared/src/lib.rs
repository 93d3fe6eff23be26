//! Types shared between the bootstage crates.

pub mod errors;

pub use errors::{BootstrapError, BootstrapResult};
