use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::ops::Deref;

// HashDigest is the 32-byte digest every identifier in the custody engine is
// built from: holder ids, withdrawal ids, category hashes and the virtual
// identities that segregate user deposits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HashDigest([u8; 32]);

/// Identifies a holder record; derived from transaction identity at creation
pub type HolderId = HashDigest;

/// Identifies a pending withdrawal request
pub type WithdrawId = HashDigest;

/// Hash of a category name, keying the contract-call whitelist registry
pub type CategoryHash = HashDigest;

impl Default for HashDigest {
    fn default() -> Self {
        HashDigest([0; 32])
    }
}

impl Deref for HashDigest {
    type Target = [u8; 32];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for HashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl HashDigest {
    pub fn new(bytes: [u8; 32]) -> Self {
        HashDigest(bytes)
    }

    /// Hash an arbitrary byte sequence into a digest
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        HashDigest(hasher.finalize().into())
    }

    /// Combine two digests by hashing their concatenation
    ///
    /// Order matters: `concat(a, b) != concat(b, a)` for distinct inputs.
    pub fn concat(a: &HashDigest, b: &HashDigest) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(a.0);
        hasher.update(b.0);
        HashDigest(hasher.finalize().into())
    }

    /// Combine two digests byte-wise with XOR
    pub fn xor(a: &HashDigest, b: &HashDigest) -> Self {
        let mut out = [0u8; 32];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = a.0[i] ^ b.0[i];
        }
        HashDigest(out)
    }

    /// The all-zero digest stands for "absent" in lookups that never fail
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}
