use std::fmt::{Debug, Formatter};

use mavio::protocol::SecretKey;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::consts::SECRET_DIGEST_LEN;

/// Raw signing key material of arbitrary length.
///
/// Key material is what operators type in and what is transmitted to a remote peer inside a
/// [`SetupSigning`](crate::protocol::SetupSigning) payload. Frames are never signed with key
/// material directly: it is turned into a [`SecretDigest`] by [`derive`] first.
///
/// Empty key material means "signing disabled".
///
/// **⚠** [`Debug`] output never contains the key itself.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct KeyMaterial(Vec<u8>);

/// Fixed-length signing secret derived from [`KeyMaterial`].
///
/// Comparisons are performed in constant time. [`Debug`] output is redacted.
#[derive(Clone)]
pub struct SecretDigest([u8; SECRET_DIGEST_LEN]);

/// Derives a 32-byte [`SecretDigest`] from arbitrary key material using `SHA-256`.
///
/// Deterministic and total: empty input produces a digest as well, it is up to callers to treat
/// empty key material as "signing disabled".
///
/// ```rust
/// use mavsign::protocol::derive;
///
/// assert_eq!(derive(b"secret_key"), derive(b"secret_key"));
/// assert_ne!(derive(b"secret_key"), derive(b"another_key"));
/// ```
pub fn derive(key_material: &[u8]) -> SecretDigest {
    let hash = Sha256::digest(key_material);
    let mut digest = [0u8; SECRET_DIGEST_LEN];
    digest.copy_from_slice(hash.as_slice());
    SecretDigest(digest)
}

impl KeyMaterial {
    /// Creates key material from raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Returns `true` if there is no key material, which disables signing.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length of key material in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Raw key bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }

    /// Derives [`SecretDigest`] from this key material.
    #[inline]
    pub fn derive(&self) -> SecretDigest {
        derive(self.as_bytes())
    }
}

impl Debug for KeyMaterial {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("len", &self.0.len())
            .finish_non_exhaustive()
    }
}

impl From<&str> for KeyMaterial {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl From<String> for KeyMaterial {
    fn from(value: String) -> Self {
        Self(value.into_bytes())
    }
}

impl From<&[u8]> for KeyMaterial {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for KeyMaterial {
    fn from(value: &[u8; N]) -> Self {
        Self(value.to_vec())
    }
}

impl From<Vec<u8>> for KeyMaterial {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl SecretDigest {
    /// Digest bytes.
    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8; SECRET_DIGEST_LEN] {
        &self.0
    }
}

impl From<&SecretDigest> for SecretKey {
    /// Feeds derived digest into [`mavio`] signing as a `MAVLink 2` secret key.
    #[inline]
    fn from(value: &SecretDigest) -> Self {
        SecretKey::from(value.0)
    }
}

impl PartialEq for SecretDigest {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for SecretDigest {}

impl Debug for SecretDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretDigest(..)")
    }
}
