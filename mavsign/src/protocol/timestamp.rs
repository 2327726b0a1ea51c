use std::fmt::{Debug, Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use mavio::protocol::MavTimestamp;

use crate::consts::SIGNING_TIMESTAMP_MAX;

/// <sup>[`serde`](https://serde.rs)</sup>
/// MAVLink signing timestamp.
///
/// A 48-bit number of 10 µs ticks since `2015-01-01T00:00:00Z`. Unlike [`MavTimestamp`], signing
/// timestamps are totally ordered, which is what replay protection relies on. Conversions to and
/// from wall clock time and the wire format go through [`MavTimestamp`].
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SigningTimestamp(u64);

/// Source of strictly increasing [`SigningTimestamp`]s.
///
/// Follows the wall clock while it moves forward, otherwise keeps counting one tick at a time
/// from the last issued value. Values observed from remote peers can push the clock forward with
/// [`UniqueTimestamp::observe`], so that outgoing frames are never older than anything already
/// accepted on the channel.
pub struct UniqueTimestamp(AtomicU64);

impl SigningTimestamp {
    /// Creates a timestamp from a raw value, discarding bits above the lower 48.
    #[inline]
    pub fn from_raw(value: u64) -> Self {
        MavTimestamp::from_raw_u64(value).into()
    }

    /// Raw number of 10 µs ticks since the signing epoch.
    #[inline]
    pub fn as_raw(&self) -> u64 {
        self.0
    }

    /// Current wall clock time.
    ///
    /// Never returns zero, even when the system clock is set before the signing epoch.
    pub fn now() -> Self {
        Self::from(SystemTime::now()).max(Self(1))
    }

    /// Converts timestamp to [`SystemTime`].
    pub fn to_system_time(&self) -> SystemTime {
        let micros = MavTimestamp::from(*self).as_micros();
        UNIX_EPOCH + Duration::from_micros(micros as u64)
    }
}

impl From<MavTimestamp> for SigningTimestamp {
    #[inline]
    fn from(value: MavTimestamp) -> Self {
        Self(value.as_raw_u64())
    }
}

impl From<SigningTimestamp> for MavTimestamp {
    #[inline]
    fn from(value: SigningTimestamp) -> Self {
        MavTimestamp::from_raw_u64(value.0)
    }
}

impl From<SystemTime> for SigningTimestamp {
    /// Converts [`SystemTime`] to a signing timestamp, saturating at both ends of the 48-bit range.
    fn from(value: SystemTime) -> Self {
        let earliest = MavTimestamp::default().as_micros();
        let latest = MavTimestamp::from_raw_u64(SIGNING_TIMESTAMP_MAX).as_micros();

        let micros = value
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros()
            .clamp(earliest, latest);

        MavTimestamp::from_micros(micros).into()
    }
}

impl Debug for SigningTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SigningTimestamp").field(&self.0).finish()
    }
}

impl Display for SigningTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl UniqueTimestamp {
    /// Creates a [`UniqueTimestamp`] which is just a moment behind the current time.
    pub fn new() -> Self {
        Self(AtomicU64::new(SigningTimestamp::now().as_raw() - 1))
    }

    /// The last issued or observed timestamp.
    pub fn last(&self) -> SigningTimestamp {
        SigningTimestamp(self.0.load(Ordering::Acquire))
    }

    /// Returns the next timestamp, strictly greater than any previously issued or observed one.
    pub fn next(&self) -> SigningTimestamp {
        let now = SigningTimestamp::now().as_raw();
        let previous = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last + 1).min(SIGNING_TIMESTAMP_MAX))
            })
            .unwrap_or_else(|last| last);
        SigningTimestamp(now.max(previous + 1).min(SIGNING_TIMESTAMP_MAX))
    }

    /// Moves the clock forward to `timestamp` if it is ahead of the last issued value.
    pub fn observe(&self, timestamp: SigningTimestamp) {
        self.0.fetch_max(timestamp.as_raw(), Ordering::AcqRel);
    }
}

impl Default for UniqueTimestamp {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for UniqueTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("UniqueTimestamp").field(&self.last()).finish()
    }
}
