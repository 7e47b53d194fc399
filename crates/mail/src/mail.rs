//! Mail composition, encryption and decryption.
//!
//! Wire layout (big-endian), header first and in the clear:
//!
//! ```text
//! version u8 | u16 len | topic | u64 sequence number | opt(u16 len | from)
//!   | opt(u32 len | envelope) | ephemeral key (33) | opt(sender key (33))
//! ```
//!
//! followed by AES-256-GCM over `u32 body len | body | zero padding`, with the
//! encoded header as associated data. `opt(..)` is a presence byte (0 or 1)
//! followed by the value when present.
//!
//! The key and nonce come from HKDF-SHA256 over the ECDH secret between a fresh
//! ephemeral key and the recipient, followed by the static ECDH secret between
//! the sender key and the recipient when the mail is sender-authenticated.

use aes_gcm::{
    aead::{consts::U12, Aead, KeyInit, Payload},
    Aes256Gcm, Key, Nonce,
};
use bastion_wire::{Cursor, WireError, WireWrite};
use hkdf::Hkdf;
use k256::{
    ecdh::{diffie_hellman, EphemeralSecret},
    elliptic_curve::{sec1::ToEncodedPoint, zeroize::Zeroizing},
    PublicKey, SecretKey,
};
use log::debug;
use rand::rngs::OsRng;
use sha2::Sha256;

use crate::error::MailError;

pub const DEFAULT_TOPIC: &str = "default";

const MAIL_VERSION: u8 = 1;
const PUBLIC_KEY_SIZE: usize = 33;
const AES_KEY_SIZE: usize = 32;
const NONCE_SIZE: usize = 12;
const KDF_INFO: &[u8] = b"bastion-mail-v1 aes-256-gcm";
const MAX_FROM_LEN: usize = 255;
const TAG_SIZE: usize = 16;

/// Version, a one byte topic, sequence number, both absent presence bytes, the
/// ephemeral key, an absent sender key, the encrypted body length and the tag.
pub const MIN_MAIL_LEN: usize = 1 + 2 + 1 + 8 + 1 + 1 + PUBLIC_KEY_SIZE + 1 + 4 + TAG_SIZE;

/// Checks that a topic is non-empty and only uses `[A-Za-z0-9-]`.
pub fn validate_topic(topic: &str) -> Result<(), MailError> {
    let valid = !topic.is_empty()
        && topic
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(MailError::InvalidTopic(topic.to_string()))
    }
}

pub fn validate_from(from: &str) -> Result<(), MailError> {
    if from.len() > MAX_FROM_LEN {
        return Err(MailError::InvalidFrom(format!(
            "{} bytes exceeds the {MAX_FROM_LEN} byte limit",
            from.len()
        )));
    }
    if let Some(c) = from.chars().find(|c| !(c.is_ascii_graphic() || *c == ' ')) {
        return Err(MailError::InvalidFrom(format!(
            "character {c:?} is not printable ASCII"
        )));
    }
    Ok(())
}

/// The fields of a mail that travel unencrypted. They are authenticated on
/// decryption but can be read by anyone, including the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnclaveMailHeader {
    pub topic: String,
    pub sequence_number: u64,
    pub from: Option<String>,
    pub envelope: Option<Vec<u8>>,
}

impl EnclaveMailHeader {
    fn write_to(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        buf.put_u8(MAIL_VERSION);
        buf.put_u16_prefixed(self.topic.as_bytes())?;
        buf.put_u64(self.sequence_number);
        buf.put_optional(self.from.as_deref(), |b, from| {
            b.put_u16_prefixed(from.as_bytes())
        })?;
        buf.put_optional(self.envelope.as_deref(), |b, envelope| {
            b.put_u32_prefixed(envelope)
        })?;
        Ok(())
    }

    fn read_from(cursor: &mut Cursor<'_>) -> Result<Self, MailError> {
        let version = cursor.get_u8().map_err(malformed)?;
        if version != MAIL_VERSION {
            return Err(MailError::Malformed(format!(
                "unsupported mail version {version}"
            )));
        }
        let topic = utf8(cursor.get_u16_prefixed().map_err(malformed)?, "topic")?;
        let sequence_number = cursor.get_u64().map_err(malformed)?;
        let from = cursor
            .get_optional(|c| c.get_u16_prefixed())
            .map_err(malformed)?
            .map(|from| utf8(from, "from"))
            .transpose()?;
        let envelope = cursor
            .get_optional(|c| c.get_u32_prefixed().map(<[u8]>::to_vec))
            .map_err(malformed)?;

        Ok(Self {
            topic,
            sequence_number,
            from,
            envelope,
        })
    }
}

/// A mail that is still being composed. Every setter validates its input, so
/// a `MutableMail` can always be encrypted.
#[derive(Clone, Debug)]
pub struct MutableMail {
    body: Vec<u8>,
    recipient: PublicKey,
    sender: Option<SecretKey>,
    header: EnclaveMailHeader,
    min_size: usize,
}

impl MutableMail {
    /// A mail to `recipient`. With a `sender` key the recipient learns, and can
    /// trust, the matching public key.
    pub fn new(body: impl Into<Vec<u8>>, recipient: PublicKey, sender: Option<SecretKey>) -> Self {
        Self {
            body: body.into(),
            recipient,
            sender,
            header: EnclaveMailHeader {
                topic: DEFAULT_TOPIC.to_string(),
                sequence_number: 0,
                from: None,
                envelope: None,
            },
            min_size: 0,
        }
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = body.into();
    }

    pub fn recipient(&self) -> &PublicKey {
        &self.recipient
    }

    pub fn topic(&self) -> &str {
        &self.header.topic
    }

    pub fn set_topic(&mut self, topic: impl Into<String>) -> Result<(), MailError> {
        let topic = topic.into();
        validate_topic(&topic)?;
        self.header.topic = topic;
        Ok(())
    }

    pub fn sequence_number(&self) -> u64 {
        self.header.sequence_number
    }

    pub fn set_sequence_number(&mut self, sequence_number: u64) {
        self.header.sequence_number = sequence_number;
    }

    /// Fails once the sequence number has reached `u64::MAX` rather than
    /// reusing it.
    pub fn increment_sequence_number(&mut self) -> Result<(), MailError> {
        self.header.sequence_number = self
            .header
            .sequence_number
            .checked_add(1)
            .ok_or(MailError::SequenceExhausted)?;
        Ok(())
    }

    pub fn from(&self) -> Option<&str> {
        self.header.from.as_deref()
    }

    pub fn set_from(&mut self, from: Option<String>) -> Result<(), MailError> {
        if let Some(from) = &from {
            validate_from(from)?;
        }
        self.header.from = from;
        Ok(())
    }

    pub fn envelope(&self) -> Option<&[u8]> {
        self.header.envelope.as_deref()
    }

    pub fn set_envelope(&mut self, envelope: Option<Vec<u8>>) {
        self.header.envelope = envelope;
    }

    pub fn min_size(&self) -> usize {
        self.min_size
    }

    /// Pads the encrypted body so that mails below `min_size` bytes are
    /// indistinguishable by length.
    pub fn set_min_size(&mut self, min_size: usize) {
        self.min_size = min_size;
    }

    /// Encrypts the mail under a fresh ephemeral key, so two calls never
    /// produce the same bytes.
    pub fn encrypt(&self) -> Result<EncryptedMail, MailError> {
        let ephemeral = EphemeralSecret::random(&mut OsRng);
        let ephemeral_public = ephemeral.public_key();

        let mut bytes = Vec::new();
        self.header.write_to(&mut bytes)?;
        bytes.put_slice(&sec1(&ephemeral_public));
        bytes.put_optional(self.sender.as_ref(), |b, sender| {
            b.put_slice(&sec1(&sender.public_key()));
            Ok(())
        })?;

        let mut ikm = Zeroizing::new(Vec::with_capacity(2 * AES_KEY_SIZE));
        ikm.extend_from_slice(ephemeral.diffie_hellman(&self.recipient).raw_secret_bytes());
        if let Some(sender) = &self.sender {
            let shared = diffie_hellman(sender.to_nonzero_scalar(), self.recipient.as_affine());
            ikm.extend_from_slice(shared.raw_secret_bytes());
        }
        let (cipher, nonce) = derive_cipher(&ikm, &ephemeral_public, &self.recipient)?;

        let plaintext = self.padded_body()?;
        let ciphertext = cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: &plaintext,
                    aad: &bytes,
                },
            )
            .map_err(|_| MailError::TooLarge)?;
        bytes.extend_from_slice(&ciphertext);

        debug!(
            "Encrypted mail on topic {} with sequence number {} ({} bytes)",
            self.header.topic,
            self.header.sequence_number,
            bytes.len()
        );
        Ok(EncryptedMail(bytes))
    }

    fn padded_body(&self) -> Result<Zeroizing<Vec<u8>>, MailError> {
        let len = u32::try_from(self.body.len()).map_err(|_| MailError::TooLarge)?;
        let mut plaintext = Zeroizing::new(Vec::with_capacity(self.min_size.max(4 + self.body.len())));
        plaintext.put_u32(len);
        plaintext.put_slice(&self.body);
        if plaintext.len() < self.min_size {
            plaintext.resize(self.min_size, 0);
        }
        Ok(plaintext)
    }
}

/// A mail in its wire form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedMail(Vec<u8>);

impl EncryptedMail {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reads the header without decrypting. Nothing returned here is
    /// authenticated until the mail has been decrypted.
    pub fn header(&self) -> Result<EnclaveMailHeader, MailError> {
        EnclaveMailHeader::read_from(&mut Cursor::new(&self.0))
    }

    pub fn decrypt(&self, key: &SecretKey) -> Result<EnclaveMail, MailError> {
        decrypt(self, key)
    }
}

impl From<Vec<u8>> for EncryptedMail {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for EncryptedMail {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A successfully decrypted and authenticated mail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnclaveMail {
    header: EnclaveMailHeader,
    body: Vec<u8>,
    authenticated_sender: Option<PublicKey>,
}

impl EnclaveMail {
    pub fn header(&self) -> &EnclaveMailHeader {
        &self.header
    }

    pub fn topic(&self) -> &str {
        &self.header.topic
    }

    pub fn sequence_number(&self) -> u64 {
        self.header.sequence_number
    }

    pub fn from(&self) -> Option<&str> {
        self.header.from.as_deref()
    }

    pub fn envelope(&self) -> Option<&[u8]> {
        self.header.envelope.as_deref()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// The sender's public key, if the mail was sent with a sender key. Only a
    /// holder of the matching private key could have produced this mail.
    pub fn authenticated_sender(&self) -> Option<&PublicKey> {
        self.authenticated_sender.as_ref()
    }
}

/// Decrypts `mail` with the recipient's private key.
///
/// Input shorter than [`MIN_MAIL_LEN`], or whose header leaves too few bytes
/// for the keys and the tag, is [`MailError::Malformed`]. Any other
/// modification of the bytes, including one that leaves the header
/// unparseable, and the wrong key yield [`MailError::AuthenticationFailed`].
pub fn decrypt(mail: &EncryptedMail, key: &SecretKey) -> Result<EnclaveMail, MailError> {
    if mail.0.len() < MIN_MAIL_LEN {
        return Err(MailError::Malformed(format!(
            "{} bytes is shorter than the smallest mail ({MIN_MAIL_LEN} bytes)",
            mail.0.len()
        )));
    }

    let mut cursor = Cursor::new(&mail.0);
    let header = EnclaveMailHeader::read_from(&mut cursor).map_err(|e| {
        debug!("Rejecting mail whose header does not parse: {e}");
        MailError::AuthenticationFailed
    })?;
    let (ephemeral, sender) = read_keys(&mut cursor)?;
    if cursor.remaining() < TAG_SIZE {
        return Err(MailError::Malformed(format!(
            "mail ends inside the {TAG_SIZE} byte tag"
        )));
    }
    let aad = cursor.consumed();
    let ciphertext = cursor.rest();

    let ephemeral =
        PublicKey::from_sec1_bytes(&ephemeral).map_err(|_| MailError::AuthenticationFailed)?;
    let sender = sender
        .map(|sender| PublicKey::from_sec1_bytes(&sender))
        .transpose()
        .map_err(|_| MailError::AuthenticationFailed)?;

    let mut ikm = Zeroizing::new(Vec::with_capacity(2 * AES_KEY_SIZE));
    let recipient_scalar = key.to_nonzero_scalar();
    ikm.extend_from_slice(diffie_hellman(recipient_scalar, ephemeral.as_affine()).raw_secret_bytes());
    if let Some(sender) = &sender {
        ikm.extend_from_slice(diffie_hellman(recipient_scalar, sender.as_affine()).raw_secret_bytes());
    }
    let (cipher, nonce) = derive_cipher(&ikm, &ephemeral, &key.public_key())?;

    let plaintext = Zeroizing::new(
        cipher
            .decrypt(
                &nonce,
                Payload {
                    msg: ciphertext,
                    aad,
                },
            )
            .map_err(|_| MailError::AuthenticationFailed)?,
    );

    let body = Cursor::new(&plaintext)
        .get_u32_prefixed()
        .map_err(|e| MailError::Malformed(format!("body: {e}")))?
        .to_vec();

    debug!(
        "Decrypted mail on topic {} with sequence number {}",
        header.topic, header.sequence_number
    );
    Ok(EnclaveMail {
        header,
        body,
        authenticated_sender: sender,
    })
}

type RawKey = [u8; PUBLIC_KEY_SIZE];

/// Ephemeral key and optional sender key, which follow the header. Running out
/// of input here is [`MailError::Malformed`], a bad presence byte is not.
fn read_keys(cursor: &mut Cursor<'_>) -> Result<(RawKey, Option<RawKey>), MailError> {
    let keys = cursor.get_array::<PUBLIC_KEY_SIZE>().and_then(|ephemeral| {
        let sender = cursor.get_optional(|c| c.get_array::<PUBLIC_KEY_SIZE>())?;
        Ok((ephemeral, sender))
    });
    keys.map_err(|e| match e {
        WireError::Truncated { .. } => malformed(e),
        e => {
            debug!("Rejecting mail with a bad key section: {e}");
            MailError::AuthenticationFailed
        }
    })
}

fn derive_cipher(
    ikm: &[u8],
    ephemeral: &PublicKey,
    recipient: &PublicKey,
) -> Result<(Aes256Gcm, Nonce<U12>), MailError> {
    let mut salt = sec1(ephemeral);
    salt.extend_from_slice(&sec1(recipient));

    let mut okm = Zeroizing::new([0u8; AES_KEY_SIZE + NONCE_SIZE]);
    Hkdf::<Sha256>::new(Some(salt.as_slice()), ikm)
        .expand(KDF_INFO, &mut okm[..])
        .map_err(|_| MailError::TooLarge)?;

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&okm[..AES_KEY_SIZE]));
    let nonce = *Nonce::from_slice(&okm[AES_KEY_SIZE..]);
    Ok((cipher, nonce))
}

fn sec1(key: &PublicKey) -> Vec<u8> {
    key.to_encoded_point(true).as_bytes().to_vec()
}

fn utf8(bytes: &[u8], field: &str) -> Result<String, MailError> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| MailError::Malformed(format!("{field} is not valid UTF-8")))
}

fn malformed(e: WireError) -> MailError {
    MailError::Malformed(e.to_string())
}
