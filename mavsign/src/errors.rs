//! # Errors
//!
//! Recoverable verification failures are not errors: they are reported as
//! [`Verdict::Rejected`](crate::signing::Verdict::Rejected) together with a
//! [`SigningEvent::Rejected`](crate::signing::SigningEvent::Rejected) notification. [`Error`] covers
//! malformed input and misuse of the API.

use crate::consts::SECRET_KEY_LEN;
use crate::protocol::ChannelId;
use crate::signing::Rejection;

/// Common result type returned by `mavsign` functions.
pub type Result<T> = core::result::Result<T, Error>;

/// `mavsign` top-level error.
#[derive(Clone, Debug, thiserror::Error)]
pub enum Error {
    /// Malformed frame or payload.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Frame encoding or message decoding failed in [`mavio`].
    #[error("MAVLink error: {0}")]
    Mavio(#[from] mavio::error::Error),

    /// Inbound message was dropped by the enforcement policy.
    #[error("{0}")]
    Rejected(#[from] Rejection),

    /// There is no signing channel with the specified `ID`.
    #[error("unknown signing channel: {0}")]
    UnknownChannel(ChannelId),

    /// Operation requires a signing key, but signing is disabled for the channel.
    #[error("signing is disabled for channel {0}")]
    SigningDisabled(ChannelId),

    /// Key material does not fit into a `SETUP_SIGNING` payload.
    #[error("key material is {0} bytes long, at most {SECRET_KEY_LEN} bytes can be provisioned")]
    KeyTooLong(usize),

    /// Key material ends with a zero byte, which is indistinguishable from `SETUP_SIGNING` padding.
    #[error("key material ending with a zero byte can't be provisioned")]
    KeyEndsWithZero,
}

/// Errors related to frame layout.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// Buffer ends before the frame does.
    #[error("frame is truncated after {0} bytes")]
    Truncated(usize),

    /// Buffer does not start with a MAVLink start-of-frame marker.
    #[error("invalid start-of-frame marker: {0:#04x}")]
    InvalidMagic(u8),

    /// Buffer has bytes beyond the frame boundaries.
    #[error("{0} trailing bytes after the end of frame")]
    TrailingBytes(usize),

    /// `MAVLink 1` frames do not support signatures.
    #[error("MAVLink 1 frames can't carry a signature")]
    Unsignable,

    /// Frame checksum does not correspond to any `CRC_EXTRA`, so the frame can't be re-sealed.
    #[error("frame checksum can't be re-sealed")]
    Checksum,

    /// Payload is longer than the message layout allows.
    #[error("payload is too long: expected at most {expected} bytes, got {actual}")]
    PayloadTooLong {
        /// Maximum number of bytes.
        expected: usize,
        /// Actual number of bytes.
        actual: usize,
    },
}
