use crate::error::WireError;

/// Big-endian writes onto a growable buffer.
pub trait WireWrite {
    fn put_u8(&mut self, value: u8);

    fn put_u16(&mut self, value: u16);

    fn put_u32(&mut self, value: u32);

    fn put_u64(&mut self, value: u64);

    fn put_slice(&mut self, bytes: &[u8]);

    fn put_u32_prefixed(&mut self, bytes: &[u8]) -> Result<(), WireError> {
        let len = u32::try_from(bytes.len()).map_err(|_| WireError::TooLong(bytes.len()))?;
        self.put_u32(len);
        self.put_slice(bytes);
        Ok(())
    }

    fn put_u16_prefixed(&mut self, bytes: &[u8]) -> Result<(), WireError> {
        let len = u16::try_from(bytes.len()).map_err(|_| WireError::TooLong(bytes.len()))?;
        self.put_u16(len);
        self.put_slice(bytes);
        Ok(())
    }

    /// Writes a presence byte followed by the value when it is `Some`.
    fn put_optional<T>(
        &mut self,
        value: Option<T>,
        write: impl FnOnce(&mut Self, T) -> Result<(), WireError>,
    ) -> Result<(), WireError> {
        match value {
            None => {
                self.put_u8(0);
                Ok(())
            }
            Some(value) => {
                self.put_u8(1);
                write(self, value)
            }
        }
    }
}

impl WireWrite for Vec<u8> {
    fn put_u8(&mut self, value: u8) {
        self.push(value);
    }

    fn put_u16(&mut self, value: u16) {
        self.extend_from_slice(&value.to_be_bytes());
    }

    fn put_u32(&mut self, value: u32) {
        self.extend_from_slice(&value.to_be_bytes());
    }

    fn put_u64(&mut self, value: u64) {
        self.extend_from_slice(&value.to_be_bytes());
    }

    fn put_slice(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}
