//! The attestation blob carried inside an enclave instance info.
//!
//! Encoding: a kind byte followed by length-prefixed fields, so the blob is
//! self-delimiting and can be followed by further data.
//!
//! ```text
//! signed: 0x01 | u32 len | report json | u32 len | report sig | u16 n | n * (u32 len | key | u32 len | sig)
//! mock:   0x02 | u32 len | quote body
//! ```

use bastion_wire::{Cursor, WireError, WireWrite};

use crate::{
    error::AttestationDecodeError,
    report::{ChainLink, SignedReport},
};

const KIND_SIGNED: u8 = 0x01;
const KIND_MOCK: u8 = 0x02;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Attestation {
    /// A quote vouched for by an attestation-service report.
    Signed(SignedReport),
    /// A bare quote body with no signature, only for mock SGX deployments.
    Mock { quote_body: Vec<u8> },
}

impl Attestation {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Signed(_) => "signed",
            Self::Mock { .. } => "mock",
        }
    }

    pub fn write_to(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        match self {
            Self::Signed(report) => {
                buf.put_u8(KIND_SIGNED);
                buf.put_u32_prefixed(&report.report)?;
                buf.put_u32_prefixed(&report.signature)?;
                let links = u16::try_from(report.chain.len())
                    .map_err(|_| WireError::TooLong(report.chain.len()))?;
                buf.put_u16(links);
                for link in &report.chain {
                    buf.put_u32_prefixed(&link.public_key)?;
                    buf.put_u32_prefixed(&link.signature)?;
                }
            }
            Self::Mock { quote_body } => {
                buf.put_u8(KIND_MOCK);
                buf.put_u32_prefixed(quote_body)?;
            }
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    /// Reads one attestation from the cursor, leaving any following bytes unread.
    pub fn read_from(cursor: &mut Cursor<'_>) -> Result<Self, AttestationDecodeError> {
        match cursor.get_u8()? {
            KIND_SIGNED => {
                let report = cursor.get_u32_prefixed()?.to_vec();
                let signature = cursor.get_u32_prefixed()?.to_vec();
                let links = cursor.get_u16()?;
                let chain = (0..links)
                    .map(|_| {
                        Ok(ChainLink {
                            public_key: cursor.get_u32_prefixed()?.to_vec(),
                            signature: cursor.get_u32_prefixed()?.to_vec(),
                        })
                    })
                    .collect::<Result<Vec<_>, WireError>>()?;
                Ok(Self::Signed(SignedReport {
                    report,
                    signature,
                    chain,
                }))
            }
            KIND_MOCK => Ok(Self::Mock {
                quote_body: cursor.get_u32_prefixed()?.to_vec(),
            }),
            other => Err(AttestationDecodeError::UnknownKind(other)),
        }
    }
}
