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

pub mod attestation;
pub mod chain;
pub mod context;
pub mod error;
pub mod error_handler;
pub mod error_sender;
pub mod handler;
pub mod muxing;
pub mod remote_error;

#[cfg(test)]
mod testing;

pub use attestation::{AttestationEnclaveHandler, AttestationHostHandler};
pub use chain::{Chain, ChainBuilder};
pub use context::ExecutionContext;
pub use error::{HandlerFault, RemoteErrorDecodeError};
pub use error_handler::{ErrorConnection, ErrorHandler, ERROR, NO_ERROR};
pub use error_sender::{ErrorSendingConnection, ErrorSendingHandler};
pub use handler::{Downstream, Handler, HandlerConnected, HasDownstream, Sender};
pub use muxing::{MuxConnection, MuxingHandler};
pub use remote_error::RemoteError;
