use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use crate::protocol::{ChannelId, MessageId, RawFrame, SignedLinkId, SigningTimestamp, SystemId};
use crate::signing::{engine, SigningContext};

/// <sup>[`serde`](https://serde.rs)</sup>
/// Enforcement policy of a signing channel.
///
/// # Examples
///
/// ```rust
/// use mavsign::consts::RADIO_STATUS_MESSAGE_ID;
/// use mavsign::signing::SigningPolicy;
///
/// let policy = SigningPolicy::builder()
///     .require_incoming_signed(true)
///     .outgoing_link_id(5)
///     .accept_unsigned(&[RADIO_STATUS_MESSAGE_ID])
///     .build();
///
/// assert!(policy.require_incoming_signed());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SigningPolicy {
    require_incoming_signed: bool,
    sign_outgoing: bool,
    outgoing_link_id: Option<SignedLinkId>,
    accept_unsigned: HashSet<MessageId>,
}

/// Outcome of inbound frame evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Frame should be forwarded upstream.
    Accepted(Acceptance),
    /// Frame should be dropped.
    Rejected(Rejection),
}

/// Grounds on which a frame was accepted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Acceptance {
    /// Signature, link `ID` and timestamp were verified.
    Verified,
    /// Frame is unsigned and the channel does not require signatures.
    Unsigned,
    /// Frame is unsigned, but its message `ID` is explicitly exempted.
    Exempt,
    /// Frame is signed, but there is no secret to verify it and signatures are not required.
    Unverified,
}

/// <sup>[`serde`](https://serde.rs)</sup>
/// Inbound frame dropped by the enforcement policy.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("message #{message_id} from system {system_id} rejected on channel {channel}: {reason}")]
pub struct Rejection {
    /// Channel which received the frame.
    pub channel: ChannelId,
    /// Sender system `ID`.
    pub system_id: SystemId,
    /// Message `ID`.
    pub message_id: MessageId,
    /// Reason of rejection.
    pub reason: RejectionReason,
}

/// <sup>[`serde`](https://serde.rs)</sup>
/// Reason for frame rejection.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RejectionReason {
    /// Frame is unsigned while signatures are required.
    Unsigned,
    /// Link `ID` differs from the one the channel is bound to.
    LinkIdMismatch {
        /// Link `ID` the channel is bound to.
        bound: SignedLinkId,
        /// Link `ID` carried by the frame.
        received: SignedLinkId,
    },
    /// Timestamp is not newer than the last accepted one.
    Replay {
        /// Timestamp carried by the frame.
        timestamp: SigningTimestamp,
        /// Replay baseline.
        baseline: SigningTimestamp,
    },
    /// Signature does not match or can't be verified.
    BadSignature,
}

impl SigningPolicy {
    /// Instantiates an empty [`SigningPolicyBuilder`].
    pub fn builder() -> SigningPolicyBuilder {
        SigningPolicyBuilder::new()
    }

    /// Whether unsigned or invalid inbound frames are rejected.
    ///
    /// Default is `false`.
    pub fn require_incoming_signed(&self) -> bool {
        self.require_incoming_signed
    }

    /// Whether configuring a key enables signing of outgoing frames.
    ///
    /// Default is `true`.
    pub fn sign_outgoing(&self) -> bool {
        self.sign_outgoing
    }

    /// Link `ID` for outgoing frames. When not set, the channel number is used.
    pub fn outgoing_link_id(&self) -> Option<SignedLinkId> {
        self.outgoing_link_id
    }

    /// Message `IDs` accepted unsigned even when signatures are required.
    pub fn accept_unsigned(&self) -> impl Iterator<Item = MessageId> + '_ {
        self.accept_unsigned.iter().copied()
    }

    /// Returns `true` if an unsigned frame with `message_id` is exempted from enforcement.
    pub fn is_exempt(&self, message_id: MessageId) -> bool {
        self.accept_unsigned.contains(&message_id)
    }

    pub(crate) fn set_require_incoming_signed(&mut self, require: bool) {
        self.require_incoming_signed = require;
    }

    /// Evaluates an inbound frame.
    ///
    /// Unsigned frames pass only when signatures are not required or their message `ID` is
    /// exempt. Signed frames with a configured context must pass the link identity check, then
    /// the replay check, then signature verification. On acceptance the context advances its
    /// replay baseline and binds its link `ID`.
    pub fn evaluate(
        &self,
        channel: ChannelId,
        context: Option<&mut SigningContext>,
        frame: &RawFrame,
    ) -> Verdict {
        let reject = |reason| {
            Verdict::Rejected(Rejection {
                channel,
                system_id: frame.system_id(),
                message_id: frame.message_id(),
                reason,
            })
        };

        let (link_id, timestamp) = match (frame.link_id(), frame.timestamp()) {
            (Some(link_id), Some(timestamp)) => (link_id, timestamp),
            _ if !self.require_incoming_signed => {
                return Verdict::Accepted(Acceptance::Unsigned)
            }
            _ if self.is_exempt(frame.message_id()) => {
                return Verdict::Accepted(Acceptance::Exempt)
            }
            _ => return reject(RejectionReason::Unsigned),
        };

        let context = match context {
            Some(context) => context,
            None if !self.require_incoming_signed => {
                return Verdict::Accepted(Acceptance::Unverified)
            }
            None => return reject(RejectionReason::BadSignature),
        };

        if !context.link_guard().permits(link_id) {
            return reject(RejectionReason::LinkIdMismatch {
                bound: context.bound_link_id().unwrap_or_default(),
                received: link_id,
            });
        }

        if let Some(baseline) = context.last_accepted_timestamp() {
            if !context.is_fresh(timestamp) {
                return reject(RejectionReason::Replay { timestamp, baseline });
            }
        }

        if !engine::verify(Some(&*context), frame) {
            return reject(RejectionReason::BadSignature);
        }

        context.accept(link_id, timestamp);
        Verdict::Accepted(Acceptance::Verified)
    }
}

impl Default for SigningPolicy {
    fn default() -> Self {
        SigningPolicyBuilder::new().build()
    }
}

impl Verdict {
    /// Returns `true` if the frame should be forwarded.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted(_))
    }

    /// Rejection details, if the frame was rejected.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Verdict::Accepted(_) => None,
            Verdict::Rejected(rejection) => Some(rejection),
        }
    }
}

impl Display for RejectionReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectionReason::Unsigned => write!(f, "unsigned"),
            RejectionReason::LinkIdMismatch { bound, received } => {
                write!(f, "link identity mismatch (bound to {bound}, got {received})")
            }
            RejectionReason::Replay {
                timestamp,
                baseline,
            } => write!(f, "replayed timestamp {timestamp} (baseline {baseline})"),
            RejectionReason::BadSignature => write!(f, "bad signature"),
        }
    }
}

/// Builder for [`SigningPolicy`].
#[derive(Clone, Debug, Default)]
pub struct SigningPolicyBuilder {
    require_incoming_signed: Option<bool>,
    sign_outgoing: Option<bool>,
    outgoing_link_id: Option<SignedLinkId>,
    accept_unsigned: HashSet<MessageId>,
}

impl SigningPolicyBuilder {
    /// Creates a new instance of [`SigningPolicyBuilder`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Set [`SigningPolicy::require_incoming_signed`].
    pub fn require_incoming_signed(self, require: bool) -> Self {
        Self {
            require_incoming_signed: Some(require),
            ..self
        }
    }

    /// Set [`SigningPolicy::sign_outgoing`].
    ///
    /// Defaults to `true`. Setting it to `false` keeps a keyed channel receive-only: inbound frames
    /// are still verified, but [`SigningChannel::sign_outgoing`](crate::signing::SigningChannel::sign_outgoing)
    /// leaves frames unsigned.
    pub fn sign_outgoing(self, sign: bool) -> Self {
        Self {
            sign_outgoing: Some(sign),
            ..self
        }
    }

    /// Set [`SigningPolicy::outgoing_link_id`].
    pub fn outgoing_link_id(self, link_id: SignedLinkId) -> Self {
        Self {
            outgoing_link_id: Some(link_id),
            ..self
        }
    }

    /// Set [`SigningPolicy::accept_unsigned`].
    ///
    /// Use this to let peers be discovered by unsigned `HEARTBEAT`s or to accept `RADIO_STATUS`
    /// injected by a local radio, while the rest of the traffic has to be signed.
    pub fn accept_unsigned(self, message_ids: &[MessageId]) -> Self {
        Self {
            accept_unsigned: HashSet::from_iter(message_ids.iter().copied()),
            ..self
        }
    }

    /// Builds [`SigningPolicy`].
    pub fn build(self) -> SigningPolicy {
        SigningPolicy {
            require_incoming_signed: self.require_incoming_signed.unwrap_or(false),
            sign_outgoing: self.sign_outgoing.unwrap_or(true),
            outgoing_link_id: self.outgoing_link_id,
            accept_unsigned: self.accept_unsigned,
        }
    }
}

impl From<SigningPolicyBuilder> for SigningPolicy {
    #[inline]
    fn from(value: SigningPolicyBuilder) -> Self {
        value.build()
    }
}

#[cfg(test)]
mod policy_tests {
    use super::*;
    use crate::consts::{HEARTBEAT_MESSAGE_ID, RADIO_STATUS_MESSAGE_ID};
    use crate::protocol::{KeyMaterial, MavLinkId};
    use crate::signing::engine::sign_frame;

    const CHANNEL: ChannelId = ChannelId(1);

    fn context() -> SigningContext {
        SigningContext::new(&KeyMaterial::from("secret_key"), true).unwrap()
    }

    fn unsigned(message_id: MessageId) -> RawFrame {
        RawFrame::new_v2(0, MavLinkId::new(1, 1), message_id, &[1, 2, 3], 0).unwrap()
    }

    fn signed(context: &SigningContext, link_id: SignedLinkId, timestamp: u64) -> RawFrame {
        let mut frame = unsigned(HEARTBEAT_MESSAGE_ID);
        sign_frame(
            context,
            &mut frame,
            link_id,
            SigningTimestamp::from_raw(timestamp),
        )
        .unwrap();
        frame
    }

    fn reason(verdict: Verdict) -> RejectionReason {
        verdict.rejection().unwrap().reason
    }

    #[test]
    fn unsigned_frames_under_lenient_policy() {
        let policy = SigningPolicy::default();
        let mut context = context();

        assert_eq!(
            policy.evaluate(CHANNEL, Some(&mut context), &unsigned(0)),
            Verdict::Accepted(Acceptance::Unsigned)
        );
        assert_eq!(
            policy.evaluate(CHANNEL, None, &unsigned(0)),
            Verdict::Accepted(Acceptance::Unsigned)
        );
    }

    #[test]
    fn unsigned_frames_under_strict_policy() {
        let policy = SigningPolicy::builder()
            .require_incoming_signed(true)
            .accept_unsigned(&[RADIO_STATUS_MESSAGE_ID])
            .build();

        let verdict = policy.evaluate(CHANNEL, None, &unsigned(HEARTBEAT_MESSAGE_ID));
        let rejection = verdict.rejection().unwrap();
        assert_eq!(rejection.reason, RejectionReason::Unsigned);
        assert_eq!(rejection.channel, CHANNEL);
        assert_eq!(rejection.system_id, 1);
        assert_eq!(rejection.message_id, HEARTBEAT_MESSAGE_ID);

        assert_eq!(
            policy.evaluate(CHANNEL, None, &unsigned(RADIO_STATUS_MESSAGE_ID)),
            Verdict::Accepted(Acceptance::Exempt)
        );
    }

    #[test]
    fn signed_frames_without_secret() {
        let frame = signed(&context(), 0, 100);

        assert_eq!(
            SigningPolicy::default().evaluate(CHANNEL, None, &frame),
            Verdict::Accepted(Acceptance::Unverified)
        );

        let strict = SigningPolicy::builder()
            .require_incoming_signed(true)
            .build();
        assert_eq!(
            reason(strict.evaluate(CHANNEL, None, &frame)),
            RejectionReason::BadSignature
        );
    }

    #[test]
    fn verified_frames_update_context() {
        let policy = SigningPolicy::default();
        let sender = context();
        let mut receiver = context();

        let verdict = policy.evaluate(CHANNEL, Some(&mut receiver), &signed(&sender, 3, 100));
        assert_eq!(verdict, Verdict::Accepted(Acceptance::Verified));
        assert_eq!(receiver.bound_link_id(), Some(3));
        assert_eq!(
            receiver.last_accepted_timestamp(),
            Some(SigningTimestamp::from_raw(100))
        );
    }

    #[test]
    fn checks_run_in_order() {
        let policy = SigningPolicy::default();
        let sender = context();
        let mut receiver = context();
        assert!(policy
            .evaluate(CHANNEL, Some(&mut receiver), &signed(&sender, 3, 100))
            .is_accepted());

        // Wrong link and stale timestamp: link identity is checked first.
        assert_eq!(
            reason(policy.evaluate(CHANNEL, Some(&mut receiver), &signed(&sender, 4, 50))),
            RejectionReason::LinkIdMismatch {
                bound: 3,
                received: 4
            }
        );

        // Stale timestamp and forged signature: replay is checked before the signature.
        let forger = SigningContext::new(&KeyMaterial::from("forged"), true).unwrap();
        assert_eq!(
            reason(policy.evaluate(CHANNEL, Some(&mut receiver), &signed(&forger, 3, 100))),
            RejectionReason::Replay {
                timestamp: SigningTimestamp::from_raw(100),
                baseline: SigningTimestamp::from_raw(100),
            }
        );

        assert_eq!(
            reason(policy.evaluate(CHANNEL, Some(&mut receiver), &signed(&forger, 3, 101))),
            RejectionReason::BadSignature
        );

        // Rejections leave the context untouched.
        assert_eq!(receiver.bound_link_id(), Some(3));
        assert_eq!(
            receiver.last_accepted_timestamp(),
            Some(SigningTimestamp::from_raw(100))
        );
    }

    #[test]
    fn signed_exempt_frames_are_verified() {
        let policy = SigningPolicy::builder()
            .require_incoming_signed(true)
            .accept_unsigned(&[HEARTBEAT_MESSAGE_ID])
            .build();
        let forger = SigningContext::new(&KeyMaterial::from("forged"), true).unwrap();
        let mut receiver = context();

        assert_eq!(
            reason(policy.evaluate(CHANNEL, Some(&mut receiver), &signed(&forger, 0, 1))),
            RejectionReason::BadSignature
        );
    }

    #[test]
    fn rejection_messages() {
        let rejection = Rejection {
            channel: CHANNEL,
            system_id: 1,
            message_id: 0,
            reason: RejectionReason::Unsigned,
        };
        assert_eq!(
            rejection.to_string(),
            "message #0 from system 1 rejected on channel #1: unsigned"
        );
        assert_eq!(
            RejectionReason::BadSignature.to_string(),
            "bad signature"
        );
    }
}
