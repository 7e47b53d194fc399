//! The SGX quote body and the identity fields read from it.
//!
//! Only the 432-byte body (48-byte header followed by the 384-byte report
//! body) is interpreted; any signature data after it is ignored here because
//! trust in the body comes from the attestation report that embeds it.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::VerificationError;

pub type ReportData = [u8; 64];
pub type MrSigner = [u8; 32];

pub const QUOTE_BODY_SIZE: usize = 432;
pub const REPORT_DATA_SIZE: usize = 64;

const QUOTE_VERSION: u16 = 2;
const ATTRIBUTES_OFFSET: usize = 96;
const MR_ENCLAVE_OFFSET: usize = 112;
const MR_SIGNER_OFFSET: usize = 176;
const ISV_PROD_ID_OFFSET: usize = 304;
const ISV_SVN_OFFSET: usize = 306;
const REPORT_DATA_OFFSET: usize = 368;

const DEBUG_FLAG: u64 = 0x2;

/// MRENCLAVE: the hash of the code and initial state loaded into the enclave.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Measurement(#[serde(with = "hex::serde")] pub [u8; 32]);

impl AsRef<[u8]> for Measurement {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl Display for Measurement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnclaveMode {
    Release,
    Debug,
    Mock,
}

/// Identity of the enclave code, as reported by a verified quote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnclaveInfo {
    pub code_hash: Measurement,
    #[serde(with = "hex::serde")]
    pub code_signing_key_hash: MrSigner,
    pub product_id: u16,
    pub revocation_level: u16,
    pub enclave_mode: EnclaveMode,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuoteBody(Vec<u8>);

impl QuoteBody {
    /// Lays out a quote body from its fields, leaving everything else zeroed.
    pub fn new(
        mr_enclave: Measurement,
        mr_signer: MrSigner,
        isv_prod_id: u16,
        isv_svn: u16,
        debug: bool,
        report_data: ReportData,
    ) -> Self {
        let mut body = vec![0u8; QUOTE_BODY_SIZE];
        body[0..2].copy_from_slice(&QUOTE_VERSION.to_le_bytes());
        let flags: u64 = if debug { DEBUG_FLAG } else { 0 };
        body[ATTRIBUTES_OFFSET..ATTRIBUTES_OFFSET + 8].copy_from_slice(&flags.to_le_bytes());
        body[MR_ENCLAVE_OFFSET..MR_ENCLAVE_OFFSET + 32].copy_from_slice(&mr_enclave.0);
        body[MR_SIGNER_OFFSET..MR_SIGNER_OFFSET + 32].copy_from_slice(&mr_signer);
        body[ISV_PROD_ID_OFFSET..ISV_PROD_ID_OFFSET + 2].copy_from_slice(&isv_prod_id.to_le_bytes());
        body[ISV_SVN_OFFSET..ISV_SVN_OFFSET + 2].copy_from_slice(&isv_svn.to_le_bytes());
        body[REPORT_DATA_OFFSET..REPORT_DATA_OFFSET + REPORT_DATA_SIZE]
            .copy_from_slice(&report_data);
        Self(body)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn mr_enclave(&self) -> Measurement {
        Measurement(self.array_chunk(MR_ENCLAVE_OFFSET))
    }

    pub fn mr_signer(&self) -> MrSigner {
        self.array_chunk(MR_SIGNER_OFFSET)
    }

    pub fn report_data(&self) -> ReportData {
        self.array_chunk(REPORT_DATA_OFFSET)
    }

    pub fn isv_prod_id(&self) -> u16 {
        u16::from_le_bytes(self.array_chunk(ISV_PROD_ID_OFFSET))
    }

    pub fn isv_svn(&self) -> u16 {
        u16::from_le_bytes(self.array_chunk(ISV_SVN_OFFSET))
    }

    pub fn is_debug(&self) -> bool {
        let flags = u64::from_le_bytes(self.array_chunk(ATTRIBUTES_OFFSET));
        flags & DEBUG_FLAG != 0
    }

    pub fn enclave_info(&self, mode: EnclaveMode) -> EnclaveInfo {
        EnclaveInfo {
            code_hash: self.mr_enclave(),
            code_signing_key_hash: self.mr_signer(),
            product_id: self.isv_prod_id(),
            revocation_level: self.isv_svn().saturating_sub(1),
            enclave_mode: mode,
        }
    }

    // length is checked on construction, so every fixed offset is in range
    fn array_chunk<const N: usize>(&self, offset: usize) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.0[offset..offset + N]);
        out
    }
}

impl TryFrom<&[u8]> for QuoteBody {
    type Error = VerificationError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() < QUOTE_BODY_SIZE {
            return Err(VerificationError::MalformedQuote(format!(
                "quote body is {} bytes, expected at least {QUOTE_BODY_SIZE}",
                bytes.len()
            )));
        }
        Ok(Self(bytes[..QUOTE_BODY_SIZE].to_vec()))
    }
}
