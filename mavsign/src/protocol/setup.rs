use std::fmt::{Debug, Formatter};

use mavio::dialects::common::messages::SetupSigning as SetupSigningMessage;

use crate::consts::{SECRET_KEY_LEN, SETUP_SIGNING_MESSAGE_ID};
use crate::protocol::{ComponentId, KeyMaterial, MavLinkId, RawFrame, SigningTimestamp, SystemId};

use crate::prelude::*;

/// <sup>[`serde`](https://serde.rs)</sup>
/// `SETUP_SIGNING` request that provisions a remote peer with a signing key.
///
/// Carries raw key material, not a derived digest: the receiver runs key derivation on its own.
/// Requests are created on demand by
/// [`SigningChannel::create_setup_signing`](crate::signing::SigningChannel::create_setup_signing),
/// transmitted once and never persisted. Encoding and decoding are performed by the `common`
/// dialect message of [`mavio`].
///
/// **⚠** [`Debug`] output never contains the key.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SetupSigning {
    /// Target system `ID`.
    pub target_system_id: SystemId,
    /// Target component `ID`.
    pub target_component_id: ComponentId,
    /// Raw key material, zero-padded.
    pub secret_key: [u8; SECRET_KEY_LEN],
    /// Initial timestamp for the receiver's replay protection.
    pub initial_timestamp: SigningTimestamp,
}

impl SetupSigning {
    /// Creates request for a `target` device.
    ///
    /// The receiver strips zero padding from the key field, so only key material which survives
    /// this can be provisioned:
    ///
    /// * fails with [`Error::KeyTooLong`] if key material does not fit into [`SECRET_KEY_LEN`]
    ///   bytes;
    /// * fails with [`Error::KeyEndsWithZero`] if key material ends with a zero byte.
    ///
    /// Empty key material is accepted and disables signing on the receiving side.
    pub fn new(
        target: MavLinkId,
        key: &KeyMaterial,
        initial_timestamp: SigningTimestamp,
    ) -> Result<Self> {
        if key.len() > SECRET_KEY_LEN {
            return Err(Error::KeyTooLong(key.len()));
        }
        if key.as_bytes().last() == Some(&0) {
            return Err(Error::KeyEndsWithZero);
        }

        let mut secret_key = [0u8; SECRET_KEY_LEN];
        secret_key[..key.len()].copy_from_slice(key.as_bytes());

        Ok(Self {
            target_system_id: target.system,
            target_component_id: target.component,
            secret_key,
            initial_timestamp,
        })
    }

    /// Target device.
    pub fn target(&self) -> MavLinkId {
        MavLinkId::new(self.target_system_id, self.target_component_id)
    }

    /// Key material with zero padding removed.
    ///
    /// Empty for an all-zero key, which means "disable signing".
    pub fn key_material(&self) -> KeyMaterial {
        let len = self
            .secret_key
            .iter()
            .rposition(|&byte| byte != 0)
            .map_or(0, |pos| pos + 1);
        KeyMaterial::from(&self.secret_key[..len])
    }

    /// Encodes an unsigned `SETUP_SIGNING` frame sent by `sender`.
    pub fn to_frame(&self, sequence: u8, sender: MavLinkId) -> Result<RawFrame> {
        RawFrame::from_message(sequence, sender, &SetupSigningMessage::from(self))
    }

    /// Decodes a `SETUP_SIGNING` frame, validating its checksum.
    ///
    /// Returns `None` for frames carrying other messages.
    pub fn from_frame(frame: &RawFrame) -> Option<Result<Self>> {
        if frame.message_id() != SETUP_SIGNING_MESSAGE_ID {
            return None;
        }

        Some(
            frame
                .frame()
                .decode_message::<SetupSigningMessage>()
                .map(Self::from)
                .map_err(Error::from),
        )
    }
}

impl From<&SetupSigning> for SetupSigningMessage {
    fn from(value: &SetupSigning) -> Self {
        SetupSigningMessage {
            target_system: value.target_system_id,
            target_component: value.target_component_id,
            secret_key: value.secret_key,
            initial_timestamp: value.initial_timestamp.as_raw(),
        }
    }
}

impl From<SetupSigningMessage> for SetupSigning {
    fn from(value: SetupSigningMessage) -> Self {
        Self {
            target_system_id: value.target_system,
            target_component_id: value.target_component,
            secret_key: value.secret_key,
            initial_timestamp: SigningTimestamp::from_raw(value.initial_timestamp),
        }
    }
}

impl Debug for SetupSigning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SetupSigning")
            .field("target_system_id", &self.target_system_id)
            .field("target_component_id", &self.target_component_id)
            .field("initial_timestamp", &self.initial_timestamp)
            .finish_non_exhaustive()
    }
}
