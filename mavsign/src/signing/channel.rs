use std::sync::mpsc;

use crate::protocol::{
    ChannelId, KeyMaterial, MavLinkId, MavLinkVersion, RawFrame, SetupSigning, SignedLinkId,
    SigningTimestamp, UniqueTimestamp,
};
use crate::signing::event::EventBus;
use crate::signing::{engine, Acceptance, SigningContext, SigningEvent, SigningPolicy, Verdict};

use crate::prelude::*;

/// Signing state and behaviour of a single communication channel.
///
/// A channel owns its [`SigningContext`], the raw key material (kept only to provision remote
/// peers), a [`UniqueTimestamp`] clock for outgoing frames and event subscribers. It is expected to
/// be driven by the single thread or task that serializes the channel's traffic: all mutating
/// operations take `&mut self`.
///
/// # Examples
///
/// ```rust
/// use mavsign::prelude::*;
///
/// let mut channel = SigningChannel::new(ChannelId(0), SigningPolicy::default());
/// assert!(channel.init_signing("secret_key"));
/// assert!(channel.is_signing_outgoing());
///
/// assert!(channel.init_signing(""));
/// assert!(channel.context().is_none());
/// ```
#[derive(Debug)]
pub struct SigningChannel {
    id: ChannelId,
    policy: SigningPolicy,
    key: KeyMaterial,
    context: Option<SigningContext>,
    clock: UniqueTimestamp,
    events: EventBus,
}

impl SigningChannel {
    /// Creates a channel with signing disabled.
    pub fn new(id: ChannelId, policy: impl Into<SigningPolicy>) -> Self {
        Self {
            id,
            policy: policy.into(),
            key: KeyMaterial::default(),
            context: None,
            clock: UniqueTimestamp::new(),
            events: EventBus::default(),
        }
    }

    /// Channel `ID`.
    #[inline]
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Enforcement policy.
    #[inline]
    pub fn policy(&self) -> &SigningPolicy {
        &self.policy
    }

    /// Switches rejection of unsigned and invalid inbound frames.
    pub fn set_require_incoming_signed(&mut self, require: bool) {
        self.policy.set_require_incoming_signed(require);
    }

    /// Signing context, `None` when signing is disabled.
    #[inline]
    pub fn context(&self) -> Option<&SigningContext> {
        self.context.as_ref()
    }

    /// Returns `true` if outgoing frames are signed.
    pub fn is_signing_outgoing(&self) -> bool {
        self.context
            .as_ref()
            .is_some_and(|context| context.sign_outgoing())
    }

    /// Link `ID` used to sign outgoing frames.
    pub fn outgoing_link_id(&self) -> SignedLinkId {
        self.policy
            .outgoing_link_id()
            .unwrap_or_else(|| self.id.default_link_id())
    }

    /// Link `ID` the channel is bound to.
    pub fn bound_link_id(&self) -> Option<SignedLinkId> {
        self.context.as_ref().and_then(SigningContext::bound_link_id)
    }

    /// Replay baseline.
    pub fn last_accepted_timestamp(&self) -> Option<SigningTimestamp> {
        self.context
            .as_ref()
            .and_then(SigningContext::last_accepted_timestamp)
    }

    /// Configures signing key.
    ///
    /// Non-empty key material replaces the context with a fresh one: new digest, outgoing signing
    /// as defined by the policy, unbound link `ID` and no replay baseline. Empty key material
    /// disables signing entirely: the context is dropped and
    /// [`SigningPolicy::require_incoming_signed`] is switched off. Re-initialization with the same
    /// key yields the same digest and flags.
    ///
    /// Always returns `true`.
    pub fn init_signing(&mut self, key: impl Into<KeyMaterial>) -> bool {
        let key = key.into();
        self.context = SigningContext::new(&key, self.policy.sign_outgoing());
        self.key = key;

        let enabled = self.context.is_some();
        if enabled {
            log::debug!("[channel {}] signing key configured", self.id);
        } else {
            self.policy.set_require_incoming_signed(false);
            log::debug!("[channel {}] signing disabled", self.id);
        }
        self.events.emit(SigningEvent::SigningChanged {
            channel: self.id,
            enabled,
        });

        true
    }

    /// Configures signing key and reports the outcome to `callback`.
    ///
    /// See [`SigningChannel::init_signing`].
    pub fn init_signing_with<F: FnOnce(bool)>(
        &mut self,
        key: impl Into<KeyMaterial>,
        callback: F,
    ) -> bool {
        let result = self.init_signing(key);
        callback(result);
        result
    }

    /// Signs an outgoing frame, if outgoing signing is enabled.
    ///
    /// Any previous signature is replaced. `MAVLink 1` frames are passed unchanged. Returns `true`
    /// if the frame was signed.
    pub fn sign_outgoing(&mut self, frame: &mut RawFrame) -> Result<bool> {
        let context = match &self.context {
            Some(context) if context.sign_outgoing() => context,
            _ => return Ok(false),
        };
        if frame.version() == MavLinkVersion::V1 {
            return Ok(false);
        }

        let link_id = self.outgoing_link_id();
        let timestamp = self.clock.next();
        engine::sign_frame(context, frame, link_id, timestamp)?;

        log::trace!(
            "[channel {}] signed message #{} with link ID {link_id} at {timestamp}",
            self.id,
            frame.message_id()
        );
        Ok(true)
    }

    /// Evaluates an inbound frame against the channel policy.
    ///
    /// Rejected frames are reported to subscribers as [`SigningEvent::Rejected`]; the channel
    /// keeps evaluating subsequent frames.
    pub fn process_incoming(&mut self, frame: &RawFrame) -> Verdict {
        let bound_before = self.bound_link_id();
        let verdict = self.policy.evaluate(self.id, self.context.as_mut(), frame);

        match &verdict {
            Verdict::Accepted(acceptance) => {
                log::trace!(
                    "[channel {}] accepted message #{} from system {}: {acceptance:?}",
                    self.id,
                    frame.message_id(),
                    frame.system_id()
                );

                if let (Acceptance::Verified, Some(timestamp)) = (acceptance, frame.timestamp()) {
                    self.clock.observe(timestamp);
                }

                let bound_after = self.bound_link_id();
                if let (None, Some(link_id)) = (bound_before, bound_after) {
                    log::debug!("[channel {}] bound to link ID {link_id}", self.id);
                    self.events.emit(SigningEvent::LinkBound {
                        channel: self.id,
                        link_id,
                    });
                }
            }
            Verdict::Rejected(rejection) => {
                log::warn!("{rejection}");
                self.events.emit(SigningEvent::Rejected(rejection.clone()));
            }
        }

        verdict
    }

    /// Checks link `ID` of a signed frame, binding the channel on first use.
    ///
    /// Returns `false` if signing is disabled, the frame is unsigned, or the frame's link `ID`
    /// differs from the bound one.
    pub fn check_signing_link_id(&mut self, frame: &RawFrame) -> bool {
        let (context, link_id) = match (self.context.as_mut(), frame.link_id()) {
            (Some(context), Some(link_id)) => (context, link_id),
            _ => return false,
        };

        let was_bound = context.bound_link_id().is_some();
        if !context.link_guard_mut().check(link_id) {
            return false;
        }
        if !was_bound {
            log::debug!("[channel {}] bound to link ID {link_id}", self.id);
            self.events.emit(SigningEvent::LinkBound {
                channel: self.id,
                link_id,
            });
        }
        true
    }

    /// Creates `SETUP_SIGNING` payload that provisions `target` with the channel's key.
    ///
    /// The payload carries raw key material and a non-zero initial timestamp taken from the
    /// channel clock. Fails with [`Error::SigningDisabled`] if there is no key. Fails with
    /// [`Error::KeyTooLong`] or [`Error::KeyEndsWithZero`] if the receiver would not recover the
    /// same key from the payload.
    pub fn create_setup_signing(&self, target: MavLinkId) -> Result<SetupSigning> {
        if self.context.is_none() {
            return Err(Error::SigningDisabled(self.id));
        }
        SetupSigning::new(target, &self.key, self.clock.next())
    }

    /// Applies `SETUP_SIGNING` received from a remote peer.
    ///
    /// Ignored unless addressed to `own` system. Otherwise runs [`SigningChannel::init_signing`]
    /// with the payload key (an all-zero key disables signing) and seeds the replay baseline with
    /// the payload's initial timestamp. Returns `true` if the payload was applied.
    pub fn apply_setup_signing(&mut self, setup: &SetupSigning, own: MavLinkId) -> bool {
        if setup.target_system_id != own.system {
            log::debug!(
                "[channel {}] ignoring SETUP_SIGNING for system {}",
                self.id,
                setup.target_system_id
            );
            return false;
        }

        self.init_signing(setup.key_material());
        if let Some(context) = self.context.as_mut() {
            context.seed_baseline(setup.initial_timestamp);
            self.clock.observe(setup.initial_timestamp);
        }
        true
    }

    /// Subscribes to signing events.
    pub fn subscribe(&mut self) -> mpsc::Receiver<SigningEvent> {
        self.events.subscribe()
    }

    /// <sup>`async`</sup>
    /// Subscribes to signing events via a Tokio broadcast channel.
    ///
    /// Available only when `async` Cargo feature is set.
    #[cfg(feature = "async")]
    pub fn subscribe_async(&mut self) -> tokio::sync::broadcast::Receiver<SigningEvent> {
        self.events.subscribe_async()
    }
}
