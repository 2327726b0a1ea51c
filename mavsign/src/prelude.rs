//! # Basic imports

pub use crate::errors::{Error, FrameError, Result};
pub use crate::protocol::{
    ChannelId, ComponentId, KeyMaterial, MavLinkId, MessageId, RawFrame, SetupSigning,
    SignedLinkId, SigningTimestamp, SystemId,
};
pub use crate::signing::{
    Rejection, RejectionReason, SigningChannel, SigningEvent, SigningPolicy, SigningRegistry,
    Verdict,
};
