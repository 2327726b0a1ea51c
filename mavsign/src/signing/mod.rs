//! MAVLink [message signing](https://mavlink.io/en/guide/message_signing.html).
//!
//! Outgoing frames are signed by [`engine`] with the secret held in a channel's
//! [`SigningContext`]. Inbound frames go through the [`LinkIdentityGuard`], the replay check and
//! signature verification as defined by the channel's [`SigningPolicy`], which either accepts the
//! frame or rejects it and notifies subscribers with a [`SigningEvent::Rejected`].
//!
//! [`SigningChannel`] owns all signing state of a channel, while [`SigningRegistry`] addresses
//! channels by [`ChannelId`](crate::protocol::ChannelId).

pub mod engine;

mod channel;
mod context;
mod event;
mod link_guard;
mod policy;
mod registry;

pub use channel::SigningChannel;
pub use context::SigningContext;
pub use event::SigningEvent;
pub use link_guard::LinkIdentityGuard;
pub use policy::{
    Acceptance, Rejection, RejectionReason, SigningPolicy, SigningPolicyBuilder, Verdict,
};
pub use registry::SigningRegistry;
