use displaydoc::Display;
use thiserror::Error;

#[derive(Clone, Debug, Display, Error, PartialEq, Eq)]
pub enum WireError {
    /// needed {needed} more bytes but only {remaining} remain
    Truncated { needed: usize, remaining: usize },
    /// field of {0} bytes does not fit its length prefix
    TooLong(usize),
    /// invalid presence marker {0:#04x}
    InvalidPresenceMarker(u8),
}
