//! MAVLink protocol entities involved in message signing.
//!
//! Everything in this module describes data: identifiers, keys, timestamps and frames. Behaviour
//! built on top of them lives in [`signing`](crate::signing).

mod frame;
mod ids;
mod key;
mod setup;
mod timestamp;

pub use frame::RawFrame;
pub use ids::{ChannelId, MavLinkId};
pub use key::{derive, KeyMaterial, SecretDigest};
pub use setup::SetupSigning;
pub use timestamp::{SigningTimestamp, UniqueTimestamp};

#[doc(inline)]
pub use mavio::protocol::{
    ComponentId, MavLinkVersion, MavTimestamp, MessageId, SecretKey, SignedLinkId, Signature,
    SigningConf, SystemId,
};
