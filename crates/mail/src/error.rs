use bastion_wire::WireError;
use displaydoc::Display;
use thiserror::Error;

#[derive(Clone, Debug, Display, Error, PartialEq, Eq)]
pub enum MailError {
    /// invalid topic `{0}`: topics are non-empty and may only contain `A-Z`, `a-z`, `0-9` and `-`
    InvalidTopic(String),
    /// invalid from header: {0}
    InvalidFrom(String),
    /// mail failed authentication
    AuthenticationFailed,
    /// malformed mail: {0}
    Malformed(String),
    /// mail field too large to encode: {0}
    Encoding(#[from] WireError),
    /// mail body is too large to encrypt
    TooLarge,
    /// sequence numbers are exhausted
    SequenceExhausted,
}
