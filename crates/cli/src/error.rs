use displaydoc::Display;
use thiserror::Error;

#[derive(Debug, Display, Error)]
pub enum Error {
    /// Specified file `{0}` does not exist
    PathNotFile(String),
    /// Invalid measurement `{0}`: expected 32 hex-encoded bytes
    InvalidMeasurement(String),
    /// Invalid key file `{0}`: {1}
    InvalidKey(String, String),
    /// {0} is only available in mock SGX mode
    MockSgxRequired(&'static str),
}
