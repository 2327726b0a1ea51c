//! Common constants.

use crate::protocol::MessageId;

/// Length of a derived secret digest in bytes.
pub const SECRET_DIGEST_LEN: usize = mavio::consts::SIGNATURE_SECRET_KEY_LENGTH;
/// Maximum length of raw key material that can be provisioned to a remote peer.
pub const SECRET_KEY_LEN: usize = mavio::consts::SIGNATURE_SECRET_KEY_LENGTH;

/// Largest value representable by a 48-bit signing timestamp.
pub const SIGNING_TIMESTAMP_MAX: u64 = (1 << 48) - 1;

/// Largest payload a frame can carry.
pub const PAYLOAD_MAX_LEN: usize = u8::MAX as usize;

#[doc(inline)]
pub use mavio::consts::{MAVLINK_IFLAG_SIGNED, SIGNATURE_LENGTH, STX_V1, STX_V2};

/// `HEARTBEAT` message `ID`.
pub const HEARTBEAT_MESSAGE_ID: MessageId = 0;
/// `RADIO_STATUS` message `ID`.
pub const RADIO_STATUS_MESSAGE_ID: MessageId = 109;
/// `SETUP_SIGNING` message `ID`.
pub const SETUP_SIGNING_MESSAGE_ID: MessageId = 256;

/// Capacity of a broadcast channel for asynchronous event subscribers.
#[cfg(feature = "async")]
pub const EVENTS_BROADCAST_CAPACITY: usize = 128;
