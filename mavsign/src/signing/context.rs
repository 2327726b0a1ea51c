use mavio::protocol::SecretKey;

use crate::protocol::{KeyMaterial, SecretDigest, SignedLinkId, SigningTimestamp};
use crate::signing::LinkIdentityGuard;

/// Signing state of a single channel.
///
/// Holds the derived secret (never the raw key), the outgoing signing flag, the
/// [`LinkIdentityGuard`] and the replay baseline. A context exists only while signing is enabled:
/// disabling signing drops it entirely. Key rotation replaces the whole context in one
/// assignment, so verification never observes a new digest together with a stale baseline.
#[derive(Clone, Debug)]
pub struct SigningContext {
    digest: SecretDigest,
    sign_outgoing: bool,
    link_guard: LinkIdentityGuard,
    last_accepted: Option<SigningTimestamp>,
}

impl SigningContext {
    /// Derives a new context from key material.
    ///
    /// Returns `None` for empty key material.
    pub fn new(key: &KeyMaterial, sign_outgoing: bool) -> Option<Self> {
        if key.is_empty() {
            return None;
        }

        Some(Self {
            digest: key.derive(),
            sign_outgoing,
            link_guard: LinkIdentityGuard::Unbound,
            last_accepted: None,
        })
    }

    /// Secret digest used to calculate signatures.
    #[inline]
    pub fn digest(&self) -> &SecretDigest {
        &self.digest
    }

    /// `MAVLink 2` secret key built from the derived digest.
    #[inline]
    pub fn secret_key(&self) -> SecretKey {
        SecretKey::from(&self.digest)
    }

    /// Whether frames sent through the channel are signed.
    #[inline]
    pub fn sign_outgoing(&self) -> bool {
        self.sign_outgoing
    }

    /// Link identity guard.
    #[inline]
    pub fn link_guard(&self) -> &LinkIdentityGuard {
        &self.link_guard
    }

    pub(crate) fn link_guard_mut(&mut self) -> &mut LinkIdentityGuard {
        &mut self.link_guard
    }

    /// Link `ID` the context is bound to.
    #[inline]
    pub fn bound_link_id(&self) -> Option<SignedLinkId> {
        self.link_guard.bound()
    }

    /// Timestamp of the last accepted signed frame or the seeded baseline.
    #[inline]
    pub fn last_accepted_timestamp(&self) -> Option<SigningTimestamp> {
        self.last_accepted
    }

    /// Returns `true` if `timestamp` is strictly newer than the replay baseline.
    ///
    /// Any timestamp is fresh while there is no baseline.
    pub fn is_fresh(&self, timestamp: SigningTimestamp) -> bool {
        match self.last_accepted {
            None => true,
            Some(baseline) => timestamp > baseline,
        }
    }

    /// Seeds replay baseline, used when signing was set up by a remote peer.
    pub fn seed_baseline(&mut self, timestamp: SigningTimestamp) {
        self.last_accepted = Some(self.last_accepted.map_or(timestamp, |last| last.max(timestamp)));
    }

    /// Records an accepted frame: advances the baseline and binds the link `ID` if unbound.
    ///
    /// Returns `true` if the link `ID` was bound by this call.
    pub(crate) fn accept(&mut self, link_id: SignedLinkId, timestamp: SigningTimestamp) -> bool {
        self.seed_baseline(timestamp);
        self.link_guard.bind(link_id)
    }
}

#[cfg(test)]
mod context_tests {
    use super::*;
    use crate::protocol::derive;

    #[test]
    fn empty_key_disables_signing() {
        assert!(SigningContext::new(&KeyMaterial::default(), true).is_none());
    }

    #[test]
    fn context_stores_derived_digest() {
        let context = SigningContext::new(&KeyMaterial::from("secret_key"), true).unwrap();

        assert_eq!(context.digest(), &derive(b"secret_key"));
        assert_ne!(context.digest().as_bytes().as_slice(), b"secret_key".as_slice());
        assert!(context.sign_outgoing());
        assert_eq!(context.bound_link_id(), None);
        assert_eq!(context.last_accepted_timestamp(), None);
    }

    #[test]
    fn baseline_is_monotonic() {
        let mut context = SigningContext::new(&KeyMaterial::from("key"), false).unwrap();
        let t100 = SigningTimestamp::from_raw(100);

        assert!(context.is_fresh(SigningTimestamp::from_raw(1)));
        assert!(context.accept(3, t100));
        assert!(!context.is_fresh(t100));
        assert!(!context.is_fresh(SigningTimestamp::from_raw(99)));
        assert!(context.is_fresh(SigningTimestamp::from_raw(101)));

        context.seed_baseline(SigningTimestamp::from_raw(50));
        assert_eq!(context.last_accepted_timestamp(), Some(t100));
        assert!(!context.accept(3, SigningTimestamp::from_raw(150)));
    }
}
