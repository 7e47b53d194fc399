use k256::{PublicKey, SecretKey};
use log::debug;
use parking_lot::Mutex;

use crate::{
    error::MailError,
    mail::{decrypt, validate_topic, EnclaveMail, EncryptedMail, MutableMail},
};

/// Sends a stream of mail on one topic from one sender key to one recipient.
///
/// Sequence numbers start at zero and are handed out under a lock, so mail
/// created from several threads still carries distinct, gap-free numbers.
/// The recipient uses them to detect dropped or reordered mail, which means
/// only one `PostOffice` may exist per (topic, sender key) pair.
pub struct PostOffice {
    recipient: PublicKey,
    sender: SecretKey,
    topic: String,
    min_size: usize,
    sequence_number: Mutex<u64>,
}

impl PostOffice {
    pub fn new(
        recipient: PublicKey,
        sender: SecretKey,
        topic: impl Into<String>,
    ) -> Result<Self, MailError> {
        let topic = topic.into();
        validate_topic(&topic)?;
        debug!("Opened post office for topic {topic}");

        Ok(Self {
            recipient,
            sender,
            topic,
            min_size: 0,
            sequence_number: Mutex::new(0),
        })
    }

    /// Resumes numbering at `sequence_number`, for a sender that restarts
    /// after mail has already been delivered.
    pub fn with_sequence_number(self, sequence_number: u64) -> Self {
        *self.sequence_number.lock() = sequence_number;
        self
    }

    /// Pads every mail from this post office to at least `min_size` bytes.
    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.min_size = min_size;
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn recipient(&self) -> &PublicKey {
        &self.recipient
    }

    pub fn sender_public_key(&self) -> PublicKey {
        self.sender.public_key()
    }

    /// The number the next mail will carry.
    pub fn next_sequence_number(&self) -> u64 {
        *self.sequence_number.lock()
    }

    /// Skips a sequence number. The recipient will see a gap.
    pub fn increment_sequence_number(&self) -> Result<(), MailError> {
        let mut sequence_number = self.sequence_number.lock();
        *sequence_number = next(*sequence_number)?;
        Ok(())
    }

    pub fn encrypt_mail(&self, body: &[u8]) -> Result<EncryptedMail, MailError> {
        self.send(body, None)
    }

    /// Encrypts `body` with the next sequence number. The number is only used
    /// up when encryption succeeds. `u64::MAX` is never sent: once the counter
    /// reaches it every send fails with [`MailError::SequenceExhausted`].
    pub fn send(&self, body: &[u8], envelope: Option<&[u8]>) -> Result<EncryptedMail, MailError> {
        let mut sequence_number = self.sequence_number.lock();
        let following = next(*sequence_number)?;

        let mut mail = MutableMail::new(body, self.recipient, Some(self.sender.clone()));
        mail.set_topic(self.topic.as_str())?;
        mail.set_sequence_number(*sequence_number);
        mail.set_envelope(envelope.map(<[u8]>::to_vec));
        mail.set_min_size(self.min_size);
        let encrypted = mail.encrypt()?;

        *sequence_number = following;
        Ok(encrypted)
    }

    /// Decrypts a reply addressed to this post office's sender key.
    pub fn decrypt_mail(&self, mail: &EncryptedMail) -> Result<EnclaveMail, MailError> {
        decrypt(mail, &self.sender)
    }
}

fn next(sequence_number: u64) -> Result<u64, MailError> {
    sequence_number
        .checked_add(1)
        .ok_or(MailError::SequenceExhausted)
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeSet, sync::Arc, thread};

    use rand::rngs::OsRng;

    use super::*;

    fn keys() -> (SecretKey, PublicKey) {
        let secret = SecretKey::random(&mut OsRng);
        let public = secret.public_key();
        (secret, public)
    }

    #[test]
    fn numbers_mail_in_order() {
        let (enclave_secret, enclave_public) = keys();
        let (client_secret, client_public) = keys();
        let post_office = PostOffice::new(enclave_public, client_secret, "orders").unwrap();

        for expected in 0..3u64 {
            assert_eq!(post_office.next_sequence_number(), expected);
            let mail = post_office.encrypt_mail(b"hello").unwrap();
            let decrypted = mail.decrypt(&enclave_secret).unwrap();
            assert_eq!(decrypted.sequence_number(), expected);
            assert_eq!(decrypted.topic(), "orders");
            assert_eq!(decrypted.authenticated_sender(), Some(&client_public));
        }
        assert_eq!(post_office.sender_public_key(), client_public);
    }

    #[test]
    fn envelope_travels_in_the_clear() {
        let (_, enclave_public) = keys();
        let (client_secret, _) = keys();
        let post_office = PostOffice::new(enclave_public, client_secret, "default").unwrap();

        let mail = post_office.send(b"body", Some(&b"routing"[..])).unwrap();
        assert_eq!(mail.header().unwrap().envelope.as_deref(), Some(&b"routing"[..]));
    }

    #[test]
    fn invalid_topic_is_rejected_up_front() {
        let (_, enclave_public) = keys();
        let (client_secret, _) = keys();
        assert!(matches!(
            PostOffice::new(enclave_public, client_secret, "a.b"),
            Err(MailError::InvalidTopic(_))
        ));
    }

    #[test]
    fn skipped_number_is_visible() {
        let (_, enclave_public) = keys();
        let (client_secret, _) = keys();
        let post_office = PostOffice::new(enclave_public, client_secret, "default").unwrap();

        post_office.increment_sequence_number().unwrap();
        let mail = post_office.encrypt_mail(b"x").unwrap();
        assert_eq!(mail.header().unwrap().sequence_number, 1);
    }

    #[test]
    fn exhausted_sequence_numbers_stop_sending() {
        let (enclave_secret, enclave_public) = keys();
        let (client_secret, _) = keys();
        let post_office = PostOffice::new(enclave_public, client_secret, "default")
            .unwrap()
            .with_sequence_number(u64::MAX - 1);

        let last = post_office.encrypt_mail(b"last").unwrap();
        assert_eq!(
            last.decrypt(&enclave_secret).unwrap().sequence_number(),
            u64::MAX - 1
        );
        assert_eq!(
            post_office.encrypt_mail(b"one too many"),
            Err(MailError::SequenceExhausted)
        );
        assert_eq!(
            post_office.increment_sequence_number(),
            Err(MailError::SequenceExhausted)
        );
        assert_eq!(post_office.next_sequence_number(), u64::MAX);
    }

    #[test]
    fn replies_decrypt_with_sender_key() {
        let (enclave_secret, enclave_public) = keys();
        let (client_secret, client_public) = keys();
        let post_office = PostOffice::new(enclave_public, client_secret, "default").unwrap();

        let reply = MutableMail::new(b"pong".to_vec(), client_public, Some(enclave_secret))
            .encrypt()
            .unwrap();
        let decrypted = post_office.decrypt_mail(&reply).unwrap();
        assert_eq!(decrypted.body(), b"pong");
        assert_eq!(decrypted.authenticated_sender(), Some(&enclave_public));
    }

    #[test]
    fn concurrent_senders_get_distinct_gap_free_numbers() {
        const THREADS: u64 = 8;
        const PER_THREAD: u64 = 16;

        let (_, enclave_public) = keys();
        let (client_secret, _) = keys();
        let post_office =
            Arc::new(PostOffice::new(enclave_public, client_secret, "concurrent").unwrap());

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let post_office = Arc::clone(&post_office);
                thread::spawn(move || {
                    (0..PER_THREAD)
                        .map(|_| {
                            post_office
                                .encrypt_mail(b"tick")
                                .unwrap()
                                .header()
                                .unwrap()
                                .sequence_number
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let numbers: BTreeSet<u64> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();
        assert_eq!(numbers, (0..THREADS * PER_THREAD).collect::<BTreeSet<_>>());
        assert_eq!(post_office.next_sequence_number(), THREADS * PER_THREAD);
    }
}
