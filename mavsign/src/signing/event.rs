use std::sync::mpsc;

use crate::protocol::{ChannelId, SignedLinkId};
use crate::signing::Rejection;

#[cfg(feature = "async")]
use crate::consts::EVENTS_BROADCAST_CAPACITY;

/// <sup>[`serde`](https://serde.rs)</sup>
/// Signing events emitted by a [`SigningChannel`](crate::signing::SigningChannel).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SigningEvent {
    /// Inbound frame was dropped.
    Rejected(Rejection),
    /// Channel was bound to a link `ID`.
    LinkBound {
        /// Channel `ID`.
        channel: ChannelId,
        /// Bound link `ID`.
        link_id: SignedLinkId,
    },
    /// Signing key was configured or removed.
    SigningChanged {
        /// Channel `ID`.
        channel: ChannelId,
        /// Whether a signing key is configured now.
        enabled: bool,
    },
}

/// Fan-out of [`SigningEvent`]s to subscribers.
///
/// Subscribers that went away are pruned on the next emission.
#[derive(Debug, Default)]
pub(crate) struct EventBus {
    subscribers: Vec<mpsc::Sender<SigningEvent>>,
    #[cfg(feature = "async")]
    broadcast: Option<tokio::sync::broadcast::Sender<SigningEvent>>,
}

impl EventBus {
    pub(crate) fn subscribe(&mut self) -> mpsc::Receiver<SigningEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    #[cfg(feature = "async")]
    pub(crate) fn subscribe_async(&mut self) -> tokio::sync::broadcast::Receiver<SigningEvent> {
        self.broadcast
            .get_or_insert_with(|| tokio::sync::broadcast::channel(EVENTS_BROADCAST_CAPACITY).0)
            .subscribe()
    }

    pub(crate) fn emit(&mut self, event: SigningEvent) {
        #[cfg(feature = "async")]
        {
            if let Some(broadcast) = &self.broadcast {
                // Fails only when there are no receivers.
                let _ = broadcast.send(event.clone());
            }
        }

        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}
