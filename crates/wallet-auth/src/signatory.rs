//! Signatories and their resolution into signing capabilities.

use alloy_primitives::B256;
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use tracing::trace;

use crate::constants::signature::SIGNATURE_LENGTH;

/// One party signing for a wallet account.
///
/// Signatories are ordered: the aggregated signature carries one slot per signatory in the order
/// the account expects (owner first, then guardian).
#[derive(Debug, Clone)]
pub enum Signatory {
    /// A real signing key.
    RealKey(PrivateKeySigner),
    /// A placeholder that fills its slot with zero bytes. The account must reject it.
    ZeroPlaceholder,
    /// A key generated at resolution time and discarded after signing. The account must reject
    /// it since the key is never registered.
    EphemeralRandom,
}

impl From<PrivateKeySigner> for Signatory {
    fn from(signer: PrivateKeySigner) -> Self {
        Self::RealKey(signer)
    }
}

impl Signatory {
    /// Resolves the signatory into a concrete signing capability.
    ///
    /// [`Signatory::EphemeralRandom`] generates a fresh key on every call.
    pub fn resolve(&self) -> ResolvedSignatory {
        match self {
            Self::RealKey(signer) => ResolvedSignatory::Key(signer.clone()),
            Self::ZeroPlaceholder => ResolvedSignatory::Zeros,
            Self::EphemeralRandom => {
                let signer = PrivateKeySigner::random();
                trace!(address = %signer.address(), "Generated ephemeral signatory");
                ResolvedSignatory::Key(signer)
            }
        }
    }
}

/// A signatory ready to produce one signature slot.
#[derive(Debug, Clone)]
pub enum ResolvedSignatory {
    /// Signs with a key.
    Key(PrivateKeySigner),
    /// Produces a zero-filled slot.
    Zeros,
}

impl ResolvedSignatory {
    /// Signs a prehashed message and returns the `r || s || v` slot.
    pub async fn sign_hash(&self, hash: &B256) -> alloy_signer::Result<[u8; SIGNATURE_LENGTH]> {
        match self {
            Self::Key(signer) => Ok(signer.sign_hash(hash).await?.as_bytes()),
            Self::Zeros => Ok([0u8; SIGNATURE_LENGTH]),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{keccak256, Signature};

    use super::*;

    #[tokio::test]
    async fn test_real_key_signature_recovers() {
        let signer = PrivateKeySigner::random();
        let hash = keccak256("hello");
        let slot = Signatory::from(signer.clone()).resolve().sign_hash(&hash).await.unwrap();

        let signature = Signature::try_from(&slot[..]).unwrap();
        assert_eq!(signature.recover_address_from_prehash(&hash).unwrap(), signer.address());
        assert!(slot[64] == 27 || slot[64] == 28);
    }

    #[tokio::test]
    async fn test_zero_placeholder() {
        let slot = Signatory::ZeroPlaceholder.resolve().sign_hash(&B256::ZERO).await.unwrap();
        assert_eq!(slot, [0u8; SIGNATURE_LENGTH]);
    }

    #[test]
    fn test_ephemeral_keys_are_never_reused() {
        let ResolvedSignatory::Key(a) = Signatory::EphemeralRandom.resolve() else {
            panic!("ephemeral signatory must resolve to a key")
        };
        let ResolvedSignatory::Key(b) = Signatory::EphemeralRandom.resolve() else {
            panic!("ephemeral signatory must resolve to a key")
        };
        assert_ne!(a.address(), b.address());
    }
}
