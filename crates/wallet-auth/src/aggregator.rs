//! Aggregation of per-signatory signatures into one signature byte string.

use alloy_primitives::{eip191_hash_message, Address, Bytes, Signature, B256};
use alloy_sol_types::{Eip712Domain, SolStruct};
use futures::future::try_join_all;
use tracing::{debug, trace};

use crate::{constants::signature::SIGNATURE_LENGTH, Result, Signatory};

/// Produces the concatenated signature of an ordered signatory list.
///
/// Every signatory contributes exactly one [`SIGNATURE_LENGTH`]-byte slot, so the output is always
/// `SIGNATURE_LENGTH * signatories.len()` bytes long. The number of signatories is not checked
/// against what the account expects; a wrong count is left for the account to reject.
#[derive(Debug, Clone, Copy)]
pub struct SignatureAggregator<'a> {
    signatories: &'a [Signatory],
}

impl<'a> SignatureAggregator<'a> {
    /// Creates an aggregator over the given signatories.
    pub const fn new(signatories: &'a [Signatory]) -> Self {
        Self { signatories }
    }

    /// Returns the length of the aggregated signature.
    pub const fn signature_length(&self) -> usize {
        SIGNATURE_LENGTH * self.signatories.len()
    }

    /// Signs a prehashed digest with every signatory.
    ///
    /// Signatories sign concurrently; the slots are concatenated in input order regardless of
    /// completion order.
    pub async fn sign_hash(&self, hash: B256) -> Result<Bytes> {
        let resolved = self.signatories.iter().map(Signatory::resolve).collect::<Vec<_>>();
        let slots =
            try_join_all(resolved.iter().map(|signatory| signatory.sign_hash(&hash))).await?;

        let mut signature = Vec::with_capacity(self.signature_length());
        for slot in &slots {
            signature.extend_from_slice(slot);
        }
        debug!(%hash, signatories = slots.len(), "Aggregated signature");
        Ok(signature.into())
    }

    /// Signs a message with the EIP-191 personal-message prefix.
    pub async fn sign_message(&self, message: &[u8]) -> Result<Bytes> {
        self.sign_hash(eip191_hash_message(message)).await
    }

    /// Signs a typed-data struct under the given domain.
    pub async fn sign_typed_data<T: SolStruct>(
        &self,
        payload: &T,
        domain: &Eip712Domain,
    ) -> Result<Bytes> {
        let hash = payload.eip712_signing_hash(domain);
        trace!(%hash, type_name = T::NAME, "Signing typed data");
        self.sign_hash(hash).await
    }
}

/// Splits an aggregated signature into its slots. A trailing partial slot is returned as is.
pub fn split_signatures(signature: &[u8]) -> Vec<&[u8]> {
    signature.chunks(SIGNATURE_LENGTH).collect()
}

/// Recovers the signer of every slot of an aggregated signature. Slots that do not hold a valid
/// signature (zero slots, partial slots) recover to `None`.
pub fn recover_signers(hash: &B256, signature: &[u8]) -> Vec<Option<Address>> {
    split_signatures(signature)
        .into_iter()
        .map(|slot| {
            let signature = Signature::try_from(slot).ok()?;
            signature.recover_address_from_prehash(hash).ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use alloy_primitives::keccak256;
    use alloy_signer_local::PrivateKeySigner;

    use super::*;

    fn keys() -> (PrivateKeySigner, PrivateKeySigner) {
        (PrivateKeySigner::random(), PrivateKeySigner::random())
    }

    #[tokio::test]
    async fn test_length_is_fixed_per_signatory() {
        let (owner, guardian) = keys();
        let hash = keccak256("digest");
        let lists: [Vec<Signatory>; 4] = [
            vec![],
            vec![owner.clone().into()],
            vec![owner.clone().into(), guardian.clone().into()],
            vec![owner.into(), Signatory::ZeroPlaceholder, Signatory::EphemeralRandom],
        ];

        for (count, signatories) in lists.iter().enumerate() {
            let aggregator = SignatureAggregator::new(signatories);
            let signature = aggregator.sign_hash(hash).await.unwrap();
            assert_eq!(signature.len(), SIGNATURE_LENGTH * count);
            assert_eq!(signature.len(), aggregator.signature_length());
        }
    }

    #[tokio::test]
    async fn test_order_is_preserved() {
        let (owner, guardian) = keys();
        let hash = keccak256("digest");

        let signatories: Vec<Signatory> = vec![owner.clone().into(), guardian.clone().into()];
        let signature = SignatureAggregator::new(&signatories).sign_hash(hash).await.unwrap();
        assert_eq!(
            recover_signers(&hash, &signature),
            vec![Some(owner.address()), Some(guardian.address())]
        );

        let reversed: Vec<Signatory> = vec![guardian.clone().into(), owner.clone().into()];
        let signature = SignatureAggregator::new(&reversed).sign_hash(hash).await.unwrap();
        assert_eq!(
            recover_signers(&hash, &signature),
            vec![Some(guardian.address()), Some(owner.address())]
        );
    }

    #[tokio::test]
    async fn test_zero_placeholder_slot() {
        let (owner, _) = keys();
        let hash = keccak256("digest");
        let signatories = vec![owner.clone().into(), Signatory::ZeroPlaceholder];
        let signature = SignatureAggregator::new(&signatories).sign_hash(hash).await.unwrap();

        assert!(signature[SIGNATURE_LENGTH..].iter().all(|b| *b == 0));
        assert_eq!(recover_signers(&hash, &signature), vec![Some(owner.address()), None]);
    }

    #[tokio::test]
    async fn test_zeros_only_does_not_fail() {
        let signatories = vec![Signatory::ZeroPlaceholder];
        let signature =
            SignatureAggregator::new(&signatories).sign_hash(keccak256("digest")).await.unwrap();
        assert_eq!(signature.as_ref(), &[0u8; SIGNATURE_LENGTH][..]);
    }

    #[tokio::test]
    async fn test_ephemeral_signer_is_unknown() {
        let (owner, _) = keys();
        let hash = keccak256("digest");
        let signatories = vec![Signatory::EphemeralRandom];
        let signature = SignatureAggregator::new(&signatories).sign_hash(hash).await.unwrap();

        let recovered = recover_signers(&hash, &signature);
        assert_eq!(recovered.len(), 1);
        assert!(recovered[0].is_some());
        assert_ne!(recovered[0], Some(owner.address()));
    }

    #[tokio::test]
    async fn test_message_signing_uses_eip191() {
        let (owner, _) = keys();
        let message = keccak256("message");
        let signatories = vec![owner.clone().into()];
        let signature = SignatureAggregator::new(&signatories)
            .sign_message(message.as_slice())
            .await
            .unwrap();

        assert_eq!(
            recover_signers(&eip191_hash_message(message), &signature),
            vec![Some(owner.address())]
        );
    }

    #[test]
    fn test_split_partial_slot() {
        let signature = [1u8; SIGNATURE_LENGTH + 10];
        let slots = split_signatures(&signature);
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[1].len(), 10);
    }
}
