use alloy_primitives::{keccak256, Address};
use alloy_signer_local::PrivateKeySigner;

use crate::Signatory;

/// Returns a signer whose key is derived from `index`. The same index always yields the same key.
pub fn deterministic_signer(index: u64) -> PrivateKeySigner {
    PrivateKeySigner::from_bytes(&keccak256(index.to_be_bytes())).unwrap()
}

/// The signing parties of a test account.
#[derive(Debug, Clone)]
pub struct TestParties {
    /// The owner key.
    pub owner: PrivateKeySigner,
    /// The guardian key.
    pub guardian: PrivateKeySigner,
    /// The backup guardian key.
    pub guardian_backup: PrivateKeySigner,
}

impl Default for TestParties {
    fn default() -> Self {
        Self {
            owner: deterministic_signer(1),
            guardian: deterministic_signer(2),
            guardian_backup: deterministic_signer(3),
        }
    }
}

impl TestParties {
    /// Returns the owner and guardian signatories, in the order the account expects.
    pub fn owner_and_guardian(&self) -> Vec<Signatory> {
        vec![self.owner.clone().into(), self.guardian.clone().into()]
    }

    /// Returns the owner signatory alone.
    pub fn owner_only(&self) -> Vec<Signatory> {
        vec![self.owner.clone().into()]
    }

    /// Returns the guardian signatory alone.
    pub fn guardian_only(&self) -> Vec<Signatory> {
        vec![self.guardian.clone().into()]
    }

    /// Returns the addresses of the owner, the guardian and the backup guardian.
    pub fn addresses(&self) -> (Address, Address, Address) {
        (self.owner.address(), self.guardian.address(), self.guardian_backup.address())
    }
}
