use curve25519_dalek::edwards::CompressedEdwardsY;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::ops::Deref;

use crate::hash::HashDigest;

// Address is a 32 byte account identity, resembling a public key. Addresses
// derived from virtual identities are forced off the ed25519 curve so they can
// never coincide with a key somebody actually controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address([u8; 32]);

impl Default for Address {
    fn default() -> Self {
        Address([0; 32])
    }
}

impl Deref for Address {
    type Target = [u8; 32];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Address {
    pub fn new(bytes: [u8; 32]) -> Self {
        Address(bytes)
    }

    /// The zero address stands for "unset" in optional authority slots
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    fn derive_candidate(identity: &HashDigest, bump: u8) -> [u8; 32] {
        let mut hasher = Sha256::new();

        // Domain separator
        hasher.update(b"CUSTODY_Address");

        hasher.update(**identity);
        hasher.update([bump]);

        hasher.finalize().into()
    }

    /// Verify that a 32-byte array is not a valid point on the ed25519 curve
    pub fn is_off_curve(bytes: &[u8; 32]) -> bool {
        let Ok(compressed_edwards_y) = CompressedEdwardsY::from_slice(bytes.as_ref()) else {
            return true;
        };
        compressed_edwards_y.decompress().is_none()
    }

    /// Try to find the canonical address for a virtual identity
    pub fn try_from_identity(identity: &HashDigest) -> Option<Address> {
        for bump in 0..=255u8 {
            let candidate = Address::derive_candidate(identity, bump);
            if Address::is_off_curve(&candidate) {
                return Some(Address(candidate));
            }
        }
        None
    }

    /// Convert a virtual identity into its deterministic address
    ///
    /// The same identity always maps to the same address; roughly half of all
    /// candidates are off-curve, so the bump loop terminates in practice on
    /// the first few iterations.
    pub fn from_identity(identity: &HashDigest) -> Address {
        Address::try_from_identity(identity).expect("no off-curve address candidate found")
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    fn test_from_identity_deterministic() {
        let identity = HashDigest::compute(b"holder-and-user");

        let addr1 = Address::from_identity(&identity);
        let addr2 = Address::from_identity(&identity);
        assert_eq!(addr1, addr2);

        let other = Address::from_identity(&HashDigest::compute(b"someone-else"));
        assert_ne!(addr1, other);
    }

    #[test]
    fn test_derived_address_is_off_curve() {
        let identity = HashDigest::compute(b"curve-test");
        let addr = Address::from_identity(&identity);
        assert!(Address::is_off_curve(&addr));
    }

    #[test]
    fn test_zero_address() {
        assert!(Address::default().is_zero());
        assert!(!Address::new([7u8; 32]).is_zero());
    }
}
