//! Bounds-checked, big-endian reads over a borrowed byte slice.

use crate::error::WireError;

/// A read cursor over a byte slice.
///
/// Every read either consumes exactly the requested bytes or fails with
/// [`WireError::Truncated`] and leaves the position untouched.
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn has_remaining(&self) -> bool {
        self.remaining() > 0
    }

    /// The unread tail, without consuming it.
    pub fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }

    /// Bytes consumed so far.
    pub fn consumed(&self) -> &'a [u8] {
        &self.bytes[..self.pos]
    }

    pub fn get_bytes(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(WireError::Truncated {
                needed: len,
                remaining,
            });
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn get_array<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.get_bytes(N)?);
        Ok(out)
    }

    /// Consumes everything left.
    pub fn get_rest(&mut self) -> &'a [u8] {
        let rest = self.rest();
        self.pos = self.bytes.len();
        rest
    }

    pub fn get_u8(&mut self) -> Result<u8, WireError> {
        Ok(self.get_array::<1>()?[0])
    }

    pub fn get_u16(&mut self) -> Result<u16, WireError> {
        self.get_array().map(u16::from_be_bytes)
    }

    pub fn get_u32(&mut self) -> Result<u32, WireError> {
        self.get_array().map(u32::from_be_bytes)
    }

    pub fn get_u64(&mut self) -> Result<u64, WireError> {
        self.get_array().map(u64::from_be_bytes)
    }

    /// Reads a field prefixed by a 4-byte length.
    pub fn get_u32_prefixed(&mut self) -> Result<&'a [u8], WireError> {
        let start = self.pos;
        let len = self.get_u32()? as usize;
        self.get_bytes(len).map_err(|e| {
            self.pos = start;
            e
        })
    }

    /// Reads a field prefixed by a 2-byte length.
    pub fn get_u16_prefixed(&mut self) -> Result<&'a [u8], WireError> {
        let start = self.pos;
        let len = self.get_u16()? as usize;
        self.get_bytes(len).map_err(|e| {
            self.pos = start;
            e
        })
    }

    /// Reads a field preceded by a presence byte (`0` absent, `1` present).
    pub fn get_optional<T>(
        &mut self,
        read: impl FnOnce(&mut Self) -> Result<T, WireError>,
    ) -> Result<Option<T>, WireError> {
        match self.get_u8()? {
            0 => Ok(None),
            1 => read(self).map(Some),
            other => Err(WireError::InvalidPresenceMarker(other)),
        }
    }
}
