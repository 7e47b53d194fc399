//! Errors that cross the host/enclave boundary as plain values.
//!
//! Encoding, version 1:
//!
//! ```text
//! version u8 | level
//! level := u16 len | kind | opt(u32 len | message) | opt(level)
//! ```
//!
//! where the trailing optional level is the cause. At most [`MAX_DEPTH`]
//! levels are encoded; deeper causes are dropped.

use std::{
    error::Error,
    fmt::{Display, Formatter},
};

use bastion_wire::{Cursor, WireError, WireWrite};

use crate::error::RemoteErrorDecodeError;

const VERSION: u8 = 1;
pub const MAX_DEPTH: usize = 32;
const DIAGNOSTIC_BYTES: usize = 64;

pub const MALFORMED_KIND: &str = "MalformedRemoteError";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteError {
    pub kind: String,
    pub message: Option<String>,
    pub cause: Option<Box<RemoteError>>,
}

impl RemoteError {
    pub fn new(kind: impl Into<String>, message: Option<String>) -> Self {
        Self {
            kind: kind.into(),
            message,
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: RemoteError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Captures `error` and its chain of sources. The top level takes its kind
    /// from the type name, sources are recorded with kind `source`.
    pub fn from_error<E: Error>(error: &E) -> Self {
        let mut sources = Vec::new();
        let mut source = error.source();
        while let Some(e) = source {
            if sources.len() + 1 == MAX_DEPTH {
                break;
            }
            sources.push(e.to_string());
            source = e.source();
        }

        let cause = sources.into_iter().rev().fold(None, |cause, message| {
            let level = Self::new("source", Some(message));
            Some(match cause {
                Some(cause) => level.with_cause(cause),
                None => level,
            })
        });
        Self {
            kind: short_type_name::<E>().to_string(),
            message: Some(error.to_string()),
            cause: cause.map(Box::new),
        }
    }

    /// The value reported in place of an error payload that could not be
    /// decoded, carrying up to 64 of the raw bytes.
    pub fn diagnostic(raw: &[u8], reason: &RemoteErrorDecodeError) -> Self {
        let shown = &raw[..raw.len().min(DIAGNOSTIC_BYTES)];
        Self::new(
            MALFORMED_KIND,
            Some(format!(
                "{reason}; {} bytes received, starting {}",
                raw.len(),
                hex::encode(shown)
            )),
        )
    }

    /// The same chain of kinds with every message removed.
    pub fn redacted(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            message: None,
            cause: self.cause.as_ref().map(|cause| Box::new(cause.redacted())),
        }
    }

    /// This error followed by each of its causes.
    pub fn chain(&self) -> impl Iterator<Item = &RemoteError> {
        std::iter::successors(Some(self), |e| e.cause.as_deref())
    }

    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        let mut buf = vec![VERSION];
        self.write_level(&mut buf, 0)?;
        Ok(buf)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, RemoteErrorDecodeError> {
        let mut cursor = Cursor::new(bytes);
        let version = cursor.get_u8()?;
        if version != VERSION {
            return Err(RemoteErrorDecodeError::UnsupportedVersion(version));
        }
        Self::read_level(&mut cursor, 0)
    }

    fn write_level(&self, buf: &mut Vec<u8>, depth: usize) -> Result<(), WireError> {
        buf.put_u16_prefixed(self.kind.as_bytes())?;
        buf.put_optional(self.message.as_deref(), |b, message| {
            b.put_u32_prefixed(message.as_bytes())
        })?;
        let cause = self.cause.as_deref().filter(|_| depth + 1 < MAX_DEPTH);
        buf.put_optional(cause, |b, cause| cause.write_level(b, depth + 1))
    }

    fn read_level(cursor: &mut Cursor<'_>, depth: usize) -> Result<Self, RemoteErrorDecodeError> {
        let kind = text(cursor.get_u16_prefixed()?)?;
        let message = cursor
            .get_optional(|c| c.get_u32_prefixed())?
            .map(text)
            .transpose()?;
        let has_cause = cursor.get_optional(|_| Ok(()))?.is_some();

        let cause = if has_cause {
            if depth + 1 == MAX_DEPTH {
                return Err(RemoteErrorDecodeError::TooDeep(MAX_DEPTH));
            }
            Some(Box::new(Self::read_level(cursor, depth + 1)?))
        } else {
            None
        };
        Ok(Self {
            kind,
            message,
            cause,
        })
    }
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {message}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl Error for RemoteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_deref().map(|cause| -> &(dyn Error + 'static) { cause })
    }
}

fn text(bytes: &[u8]) -> Result<String, RemoteErrorDecodeError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| RemoteErrorDecodeError::InvalidUtf8)
}

fn short_type_name<T>() -> &'static str {
    let name = std::any::type_name::<T>();
    let base = name.split('<').next().unwrap_or(name);
    base.rsplit("::").next().unwrap_or(base)
}
