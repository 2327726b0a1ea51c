//! Signature calculation and verification.
//!
//! A signature is the first 48 bits of
//! `SHA-256(secret || header || payload || checksum || link_id || timestamp)` as calculated by
//! [`mavio`] with [`MavSha256`]. The secret is always the digest derived from key material, never
//! the key material itself.

use mavio::protocol::{Signer, SigningConf};
use mavio::utils::MavSha256;
use subtle::ConstantTimeEq;

use crate::protocol::{RawFrame, SignedLinkId, SigningTimestamp};
use crate::signing::SigningContext;

use crate::prelude::*;

/// Creates a [`MavSha256`] signer.
#[inline]
pub fn signer() -> MavSha256 {
    MavSha256::default()
}

/// Signing configuration for a frame sent over `link_id` at `timestamp`.
pub fn signing_conf(
    context: &SigningContext,
    link_id: SignedLinkId,
    timestamp: SigningTimestamp,
) -> SigningConf {
    SigningConf {
        link_id,
        timestamp: timestamp.into(),
        secret: context.secret_key(),
    }
}

/// Signs a `MAVLink 2` frame, replacing any previous signature.
///
/// Sets the signed incompatibility flag first, so the signature covers the final header.
pub fn sign_frame(
    context: &SigningContext,
    frame: &mut RawFrame,
    link_id: SignedLinkId,
    timestamp: SigningTimestamp,
) -> Result<()> {
    let conf = signing_conf(context, link_id, timestamp);
    frame.sign(&conf, &mut signer())
}

/// Verifies frame signature in constant time.
///
/// Returns `false` for unsigned frames and when there is no signing context.
pub fn verify(context: Option<&SigningContext>, frame: &RawFrame) -> bool {
    let (context, signature) = match (context, frame.signature()) {
        (Some(context), Some(signature)) => (context, signature),
        _ => return false,
    };

    let mut signer = signer();
    let expected = Signer::new(&mut signer).calculate(
        frame.frame(),
        signature.link_id,
        signature.timestamp,
        &context.secret_key(),
    );
    expected.as_slice().ct_eq(signature.value.as_slice()).into()
}

#[cfg(test)]
mod engine_tests {
    use super::*;
    use crate::consts::SIGNATURE_LENGTH;
    use crate::protocol::{derive, KeyMaterial, MavLinkId};
    use mavio::dialects::minimal::messages::Heartbeat;
    use sha2::{Digest, Sha256};

    fn context(key: &str) -> SigningContext {
        SigningContext::new(&KeyMaterial::from(key), true).unwrap()
    }

    fn frame() -> RawFrame {
        RawFrame::from_message(0, MavLinkId::new(1, 1), &Heartbeat::default()).unwrap()
    }

    #[test]
    fn signature_is_truncated_sha256_of_derived_secret() {
        let mut frame = frame();
        sign_frame(&context("secret_key"), &mut frame, 3, SigningTimestamp::from_raw(100)).unwrap();
        let bytes = frame.to_bytes().unwrap();
        let value_start = bytes.len() - 6;

        let mut preimage = derive(b"secret_key").as_bytes().to_vec();
        preimage.extend_from_slice(&bytes[..value_start]);
        let hash = Sha256::digest(&preimage);

        assert_eq!(bytes[bytes.len() - SIGNATURE_LENGTH], 3);
        assert_eq!(
            &bytes[value_start - 6..value_start],
            &[100, 0, 0, 0, 0, 0]
        );
        assert_eq!(&bytes[value_start..], &hash[..6]);
    }

    #[test]
    fn sign_and_verify() {
        let context = context("secret_key");
        let mut frame = frame();

        sign_frame(&context, &mut frame, 3, SigningTimestamp::from_raw(100)).unwrap();
        assert!(frame.is_signed());
        assert_eq!(frame.link_id(), Some(3));
        assert!(verify(Some(&context), &frame));

        let parsed = RawFrame::from_bytes(&frame.to_bytes().unwrap()).unwrap();
        assert!(verify(Some(&context), &parsed));
        assert!(parsed
            .frame()
            .clone()
            .try_into_versioned::<mavio::protocol::V2>()
            .unwrap()
            .validate_signature(&mut signer(), &context.secret_key())
            .is_ok());
    }

    #[test]
    fn verification_fails_with_other_key() {
        let mut frame = frame();
        sign_frame(&context("key A"), &mut frame, 0, SigningTimestamp::from_raw(1)).unwrap();

        assert!(!verify(Some(&context("key B")), &frame));
        assert!(!verify(None, &frame));
    }

    #[test]
    fn tampering_is_detected() {
        let context = context("secret_key");
        let mut frame = frame();
        sign_frame(&context, &mut frame, 3, SigningTimestamp::from_raw(100)).unwrap();
        let bytes = frame.to_bytes().unwrap();

        let mut spoofed = bytes.clone();
        let link_id_pos = spoofed.len() - SIGNATURE_LENGTH;
        spoofed[link_id_pos] = 4;
        let spoofed = RawFrame::from_bytes(&spoofed).unwrap();
        assert_eq!(spoofed.link_id(), Some(4));
        assert!(!verify(Some(&context), &spoofed));

        let mut tampered = bytes;
        tampered[12] ^= 0x01;
        let tampered = RawFrame::from_bytes(&tampered).unwrap();
        assert!(!verify(Some(&context), &tampered));
    }

    #[test]
    fn unsigned_frames_never_verify() {
        assert!(!verify(Some(&context("secret_key")), &frame()));
    }
}
