#![doc = include_str!("../README.md")]
#![warn(
    clippy::checked_conversions,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    rust_2018_idioms,
    unused_lifetimes
)]
#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications,
    warnings
)]
#![forbid(unsafe_code)]

pub mod error;
pub mod identity;
pub mod instance_info;

pub use bastion_tee_ra::{EnclaveInfo, EnclaveMode, Measurement, SecurityInfo, SecuritySummary};
pub use error::{CorruptionCause, EiiError};
pub use identity::EnclaveIdentity;
pub use instance_info::{EnclaveInstanceInfo, InstanceSummary};
