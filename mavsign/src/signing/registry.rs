use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::protocol::{ChannelId, KeyMaterial, MavLinkId, RawFrame, SetupSigning};
use crate::signing::{SigningChannel, SigningPolicy, Verdict};

use crate::prelude::*;

/// Collection of [`SigningChannel`]s addressed by [`ChannelId`].
///
/// This is the entry point for the transport layer and the vehicle manager. Channels are created
/// on demand with the registry's default policy when a key is configured for an unknown channel,
/// and destroyed with [`SigningRegistry::remove`] when the channel is torn down.
#[derive(Debug, Default)]
pub struct SigningRegistry {
    default_policy: SigningPolicy,
    channels: BTreeMap<ChannelId, SigningChannel>,
}

impl SigningRegistry {
    /// Creates an empty registry with a policy for channels created on demand.
    pub fn new(default_policy: impl Into<SigningPolicy>) -> Self {
        Self {
            default_policy: default_policy.into(),
            channels: BTreeMap::new(),
        }
    }

    /// Adds a channel with a specific policy, replacing an existing one.
    pub fn add_channel(
        &mut self,
        id: ChannelId,
        policy: impl Into<SigningPolicy>,
    ) -> &mut SigningChannel {
        let channel = SigningChannel::new(id, policy);
        match self.channels.entry(id) {
            Entry::Occupied(mut entry) => {
                entry.insert(channel);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(channel),
        }
    }

    /// Channel by `ID`.
    pub fn channel(&self, id: ChannelId) -> Option<&SigningChannel> {
        self.channels.get(&id)
    }

    /// Mutable channel by `ID`.
    pub fn channel_mut(&mut self, id: ChannelId) -> Option<&mut SigningChannel> {
        self.channels.get_mut(&id)
    }

    /// Iterator over registered channel `IDs`.
    pub fn channel_ids(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.channels.keys().copied()
    }

    /// Removes a channel together with its signing state.
    pub fn remove(&mut self, id: ChannelId) -> Option<SigningChannel> {
        let channel = self.channels.remove(&id);
        if channel.is_some() {
            log::debug!("[channel {id}] removed");
        }
        channel
    }

    /// Configures signing key for a channel, creating the channel if necessary.
    ///
    /// See [`SigningChannel::init_signing`].
    pub fn init_signing(&mut self, id: ChannelId, key: impl Into<KeyMaterial>) -> bool {
        self.channel_or_default(id).init_signing(key)
    }

    /// Configures signing key for a channel and reports the outcome to `callback`.
    ///
    /// See [`SigningChannel::init_signing_with`].
    pub fn init_signing_with<F: FnOnce(bool)>(
        &mut self,
        id: ChannelId,
        key: impl Into<KeyMaterial>,
        callback: F,
    ) -> bool {
        self.channel_or_default(id).init_signing_with(key, callback)
    }

    /// Checks link `ID` of a signed frame received by a channel.
    ///
    /// Returns `false` for unknown channels. See [`SigningChannel::check_signing_link_id`].
    pub fn check_signing_link_id(&mut self, id: ChannelId, frame: &RawFrame) -> bool {
        self.channels
            .get_mut(&id)
            .is_some_and(|channel| channel.check_signing_link_id(frame))
    }

    /// Creates `SETUP_SIGNING` payload with the key of a channel.
    ///
    /// See [`SigningChannel::create_setup_signing`].
    pub fn create_setup_signing(&self, id: ChannelId, target: MavLinkId) -> Result<SetupSigning> {
        self.channels
            .get(&id)
            .ok_or(Error::UnknownChannel(id))?
            .create_setup_signing(target)
    }

    /// Evaluates an inbound frame received by a channel.
    ///
    /// See [`SigningChannel::process_incoming`].
    pub fn process_incoming(&mut self, id: ChannelId, frame: &RawFrame) -> Result<Verdict> {
        Ok(self
            .channels
            .get_mut(&id)
            .ok_or(Error::UnknownChannel(id))?
            .process_incoming(frame))
    }

    /// Signs an outgoing frame sent through a channel.
    ///
    /// See [`SigningChannel::sign_outgoing`].
    pub fn sign_outgoing(&mut self, id: ChannelId, frame: &mut RawFrame) -> Result<bool> {
        self.channels
            .get_mut(&id)
            .ok_or(Error::UnknownChannel(id))?
            .sign_outgoing(frame)
    }

    fn channel_or_default(&mut self, id: ChannelId) -> &mut SigningChannel {
        let policy = &self.default_policy;
        self.channels
            .entry(id)
            .or_insert_with(|| SigningChannel::new(id, policy.clone()))
    }
}
