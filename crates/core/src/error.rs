use bastion_wire::WireError;
use displaydoc::Display;
use thiserror::Error;

/// Faults raised by handler chains. These indicate a chain that was wired
/// incorrectly or a peer that does not speak the same framing.
#[derive(Clone, Debug, Display, Error, PartialEq, Eq)]
pub enum HandlerFault {
    /// a downstream handler is already set on this connection
    DownstreamAlreadySet,
    /// data received before a downstream handler was set
    DownstreamNotSet,
    /// unrecognised discriminator byte {0:#04x}
    UnrecognizedDiscriminator(u8),
    /// no channel with id {0}
    UnknownChannel(u32),
    /// truncated frame: {0}
    Truncated(WireError),
    /// cannot encode frame: {0}
    Encoding(WireError),
    /// attestation exchange failed: {0}
    Attestation(String),
}

#[derive(Clone, Debug, Display, Error, PartialEq, Eq)]
pub enum RemoteErrorDecodeError {
    /// {0}
    Wire(#[from] WireError),
    /// unsupported remote error encoding version {0}
    UnsupportedVersion(u8),
    /// cause chain deeper than {0} levels
    TooDeep(usize),
    /// remote error text is not valid UTF-8
    InvalidUtf8,
}
