use std::fmt::{Display, Formatter};

use crate::protocol::{ComponentId, SignedLinkId, SystemId};

/// <sup>[`serde`](https://serde.rs)</sup>
/// Logical communication channel.
///
/// A channel may multiplex several physical links and owns exactly one signing context. Channel
/// numbering follows MAVLink conventions (`MAVLINK_COMM_0`, `MAVLINK_COMM_1`, ...).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelId(pub u8);

/// <sup>[`serde`](https://serde.rs)</sup>
/// MAVLink device identifier: a pair of `system_id` and `component_id`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MavLinkId {
    /// MAVLink system `ID`.
    pub system: SystemId,
    /// MAVLink component `ID`.
    pub component: ComponentId,
}

impl ChannelId {
    /// Link `ID` used by default to sign frames sent through this channel.
    ///
    /// Equals to the channel number.
    #[inline(always)]
    pub fn default_link_id(&self) -> SignedLinkId {
        self.0
    }
}

impl Display for ChannelId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u8> for ChannelId {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl MavLinkId {
    /// Creates a new [`MavLinkId`].
    pub fn new(system: SystemId, component: ComponentId) -> Self {
        Self { system, component }
    }
}
