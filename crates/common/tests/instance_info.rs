use std::error::Error;

use bastion_common::{
    CorruptionCause, EiiError, EnclaveIdentity, EnclaveInstanceInfo, Measurement, SecuritySummary,
};
use bastion_tee_ra::{
    mock::{MockAttestor, ReportIssuer, SimulatedAttestor},
    Attestation, AttestationVerifier, Attestor, EncodedKey, SecurityError, VerificationError,
};

const MEASUREMENT: Measurement = Measurement([0x42; 32]);

fn mock_verifier() -> AttestationVerifier {
    AttestationVerifier::new(None, true)
}

fn mock_eii() -> EnclaveInstanceInfo {
    EnclaveIdentity::generate()
        .instance_info(&MockAttestor::new(MEASUREMENT), &mock_verifier())
        .unwrap()
}

#[test]
fn mock_round_trip() {
    let eii = mock_eii();
    let bytes = eii.serialize();
    assert!(bytes.starts_with(b"EII"));

    let decoded = EnclaveInstanceInfo::deserialize(&bytes, &mock_verifier()).unwrap();
    assert_eq!(decoded, eii);
    assert_eq!(decoded.serialize(), bytes);
    assert_eq!(decoded.measurement(), MEASUREMENT);
}

#[test]
fn signed_round_trip() {
    let attestor = SimulatedAttestor::new(ReportIssuer::generate(2), MEASUREMENT);
    let verifier = attestor.issuer().verifier();
    let eii = EnclaveIdentity::generate()
        .instance_info(&attestor, &verifier)
        .unwrap();
    assert_eq!(eii.security_info().summary, SecuritySummary::Secure);

    let decoded = EnclaveInstanceInfo::deserialize(&eii.serialize(), &verifier).unwrap();
    assert_eq!(decoded, eii);
}

#[test]
fn every_strict_prefix_is_rejected() {
    let attestor = SimulatedAttestor::new(ReportIssuer::generate(1), MEASUREMENT);
    let verifier = attestor.issuer().verifier();
    let bytes = EnclaveIdentity::generate()
        .instance_info(&attestor, &verifier)
        .unwrap()
        .serialize();

    for len in 0..=3 {
        assert_eq!(
            EnclaveInstanceInfo::deserialize(&bytes[..len], &verifier),
            Err(EiiError::NotRecognized),
            "prefix of {len} bytes"
        );
    }
    for len in 4..bytes.len() {
        assert!(
            matches!(
                EnclaveInstanceInfo::deserialize(&bytes[..len], &verifier),
                Err(EiiError::Truncated(_))
            ),
            "prefix of {len} bytes"
        );
    }
}

#[test]
fn trailing_bytes_are_ignored() {
    let eii = mock_eii();
    let mut bytes = eii.serialize();
    bytes.extend_from_slice(b"fields from a later version");

    let decoded = EnclaveInstanceInfo::deserialize(&bytes, &mock_verifier()).unwrap();
    assert_eq!(decoded, eii);
    assert_eq!(decoded.serialize(), eii.serialize());
}

#[test]
fn wrong_magic_is_not_recognized() {
    let mut bytes = mock_eii().serialize();
    bytes[0] = b'X';
    assert_eq!(
        EnclaveInstanceInfo::deserialize(&bytes, &mock_verifier()),
        Err(EiiError::NotRecognized)
    );
}

#[test]
fn corrupted_key_is_reported() {
    let mut bytes = mock_eii().serialize();
    // first byte of the data signing key is the SEC1 tag
    bytes[3 + 4] = 0x07;
    let err = EnclaveInstanceInfo::deserialize(&bytes, &mock_verifier()).unwrap_err();
    assert!(matches!(
        err,
        EiiError::Corrupted(CorruptionCause::Key {
            field: "data signing key",
            ..
        })
    ));
    assert!(err.source().and_then(Error::source).is_some());
}

#[test]
fn short_mock_quote_is_corrupted() {
    let keys = EnclaveIdentity::generate().public_keys();
    let attestation = Attestation::Mock {
        quote_body: vec![0; 100],
    };

    let mut bytes = b"EII".to_vec();
    for key in [keys.data_signing_key.encoded(), keys.encryption_key.encoded()] {
        bytes.extend_from_slice(&(key.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&key);
    }
    bytes.extend_from_slice(&attestation.to_bytes().unwrap());

    assert!(matches!(
        EnclaveInstanceInfo::deserialize(&bytes, &mock_verifier()),
        Err(EiiError::Corrupted(CorruptionCause::Quote(
            VerificationError::MalformedQuote(_)
        )))
    ));
}

#[test]
fn keys_from_another_identity_are_rejected() {
    let attestor = MockAttestor::new(MEASUREMENT);
    let attested = EnclaveIdentity::generate().public_keys();
    let impostor = EnclaveIdentity::generate().public_keys();
    let attestation = attestor.attestation(attested).unwrap();

    assert_eq!(
        EnclaveInstanceInfo::new(impostor, attestation, &mock_verifier()),
        Err(EiiError::Binding(SecurityError::AttestationMismatch))
    );
}

#[test]
fn mock_is_rejected_by_strict_verifier() {
    let bytes = mock_eii().serialize();
    assert_eq!(
        EnclaveInstanceInfo::deserialize(&bytes, &AttestationVerifier::new(None, false)),
        Err(EiiError::Verification(VerificationError::MockNotAllowed))
    );
}

#[test]
fn client_to_enclave_mail() {
    let identity = EnclaveIdentity::generate();
    let bytes = identity
        .instance_info(&MockAttestor::new(MEASUREMENT), &mock_verifier())
        .unwrap()
        .serialize();

    // the client only ever sees the serialized form
    let eii = EnclaveInstanceInfo::deserialize(&bytes, &mock_verifier()).unwrap();
    let post_office = eii.create_post_office_default().unwrap();
    let first = post_office.encrypt_mail(b"one").unwrap();
    let second = post_office.encrypt_mail(b"two").unwrap();

    let first = identity.decrypt_mail(&first).unwrap();
    let second = identity.decrypt_mail(&second).unwrap();
    assert_eq!((first.sequence_number(), first.body()), (0, &b"one"[..]));
    assert_eq!((second.sequence_number(), second.body()), (1, &b"two"[..]));
}
