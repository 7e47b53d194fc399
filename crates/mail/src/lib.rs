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
pub mod mail;
pub mod post_office;

pub use error::MailError;
pub use mail::{
    decrypt, validate_from, validate_topic, EnclaveMail, EnclaveMailHeader, EncryptedMail,
    MutableMail, DEFAULT_TOPIC, MIN_MAIL_LEN,
};
pub use post_office::PostOffice;
