use crate::protocol::SignedLinkId;

/// <sup>[`serde`](https://serde.rs)</sup>
/// Binds a signing context to a single link `ID`.
///
/// Starts [`Unbound`](LinkIdentityGuard::Unbound) and becomes [`Bound`](LinkIdentityGuard::Bound)
/// with the link `ID` of the first accepted signed frame. From then on frames with any other link
/// `ID` fail the check, which prevents physical links multiplexed onto one channel from spoofing
/// each other. A mismatch never changes the state: only a new guard (key rotation or channel
/// teardown) returns to [`Unbound`](LinkIdentityGuard::Unbound).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LinkIdentityGuard {
    /// No link `ID` observed yet.
    #[default]
    Unbound,
    /// Bound to a link `ID`.
    Bound(SignedLinkId),
}

impl LinkIdentityGuard {
    /// Bound link `ID`, if any.
    pub fn bound(&self) -> Option<SignedLinkId> {
        match self {
            LinkIdentityGuard::Unbound => None,
            LinkIdentityGuard::Bound(link_id) => Some(*link_id),
        }
    }

    /// Returns `true` if a frame with `link_id` may pass. Does not change the state.
    pub fn permits(&self, link_id: SignedLinkId) -> bool {
        match self {
            LinkIdentityGuard::Unbound => true,
            LinkIdentityGuard::Bound(bound) => *bound == link_id,
        }
    }

    /// Binds an unbound guard to `link_id`.
    ///
    /// Returns `true` if the guard was bound by this call.
    pub fn bind(&mut self, link_id: SignedLinkId) -> bool {
        match self {
            LinkIdentityGuard::Unbound => {
                *self = LinkIdentityGuard::Bound(link_id);
                true
            }
            LinkIdentityGuard::Bound(_) => false,
        }
    }

    /// Checks `link_id` and binds the guard if it is still unbound.
    pub fn check(&mut self, link_id: SignedLinkId) -> bool {
        if !self.permits(link_id) {
            return false;
        }
        self.bind(link_id);
        true
    }
}

#[cfg(test)]
mod link_guard_tests {
    use super::*;

    #[test]
    fn first_link_id_wins() {
        let mut guard = LinkIdentityGuard::default();

        assert!(guard.check(3));
        assert_eq!(guard.bound(), Some(3));

        assert!(!guard.check(4));
        assert!(!guard.check(0));
        assert!(guard.check(3));
        assert_eq!(guard, LinkIdentityGuard::Bound(3));
    }

    #[test]
    fn permits_does_not_bind() {
        let mut guard = LinkIdentityGuard::default();

        assert!(guard.permits(7));
        assert!(guard.permits(8));
        assert_eq!(guard.bound(), None);

        assert!(guard.bind(7));
        assert!(!guard.bind(8));
        assert!(!guard.permits(8));
    }
}
