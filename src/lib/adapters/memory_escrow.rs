use std::collections::HashMap;
use std::sync::Arc;

use alloy::primitives::{keccak256, Address, B256};
use tokio::sync::Mutex;
use tracing::debug;

use super::abi::{
    access_dleq_value_hash, access_proof_value_hash, condition_id, encode_access_dleq_fulfill,
    encode_access_proof_fulfill,
};
use crate::crypto::context::CryptoContext;
use crate::crypto::dleq::check_proof;
use crate::domain::transfer::{TransferEvent, TransferState};
use crate::ports::escrow::{Escrow, EscrowError};
use crate::ports::{AccessDleqFulfillment, AccessProofFulfillment, TxReceipt};

#[derive(Debug, Clone)]
struct Agreement {
    state: TransferState,
    /// Condition values fixed when the buyer locked payment.
    value_hash: B256,
    access_proof: Option<AccessProofFulfillment>,
    access_dleq: Option<AccessDleqFulfillment>,
}

/// In-memory implementation of `Escrow` for PoC and testing.
///
/// Mirrors what the deployed conditions enforce: a fulfilment must match the
/// condition values the agreement was created with, and a DLEQ fulfilment must
/// carry a proof bound to its condition id. SNARK proofs are not checked here;
/// on chain that is the verifier contract's job.
pub struct InMemoryEscrow {
    ctx: Arc<CryptoContext>,
    dleq_condition: Address,
    agreements: Mutex<HashMap<B256, Agreement>>,
}

impl InMemoryEscrow {
    pub fn new(ctx: Arc<CryptoContext>, dleq_condition: Address) -> Self {
        Self {
            ctx,
            dleq_condition,
            agreements: Mutex::new(HashMap::new()),
        }
    }

    /// Buyer locks payment; `value_hash` fixes the condition values.
    pub async fn lock_payment(&self, agreement_id: B256, value_hash: B256) -> Result<(), EscrowError> {
        let mut agreements = self.agreements.lock().await;
        let state = match agreements.get(&agreement_id) {
            Some(existing) => existing.state.advance(TransferEvent::LockPayment)?,
            None => TransferState::SecretCommitted.advance(TransferEvent::LockPayment)?,
        };
        agreements.insert(
            agreement_id,
            Agreement {
                state,
                value_hash,
                access_proof: None,
                access_dleq: None,
            },
        );
        Ok(())
    }

    /// Pay the provider once the key is recoverable.
    pub async fn release(&self, agreement_id: B256) -> Result<TxReceipt, EscrowError> {
        self.apply(agreement_id, TransferEvent::ReleaseEscrow).await
    }

    /// Expire the agreement; the buyer is refunded.
    pub async fn expire(&self, agreement_id: B256) -> Result<TxReceipt, EscrowError> {
        self.apply(agreement_id, TransferEvent::Timeout).await
    }

    pub async fn state(&self, agreement_id: B256) -> Option<TransferState> {
        self.agreements
            .lock()
            .await
            .get(&agreement_id)
            .map(|a| a.state)
    }

    async fn apply(&self, agreement_id: B256, event: TransferEvent) -> Result<TxReceipt, EscrowError> {
        let mut agreements = self.agreements.lock().await;
        let agreement = agreements
            .get_mut(&agreement_id)
            .ok_or(EscrowError::AgreementNotFound(agreement_id))?;
        agreement.state = agreement.state.advance(event)?;
        debug!(%agreement_id, state = ?agreement.state, "escrow transition");
        Ok(TxReceipt {
            tx_hash: keccak256([agreement_id.as_slice(), &[event as u8]].concat()),
            success: true,
        })
    }

    /// Submit then accept, or leave the agreement untouched on any failure.
    fn accept(agreement: &mut Agreement) -> Result<(), EscrowError> {
        let next = agreement
            .state
            .advance(TransferEvent::SubmitProof)?
            .advance(TransferEvent::AcceptProof)?;
        agreement.state = next;
        Ok(())
    }
}

impl Escrow for InMemoryEscrow {
    fn dleq_condition(&self) -> Address {
        self.dleq_condition
    }

    async fn fulfill_access_proof(
        &self,
        agreement_id: B256,
        fulfillment: AccessProofFulfillment,
    ) -> Result<TxReceipt, EscrowError> {
        let mut agreements = self.agreements.lock().await;
        let agreement = agreements
            .get_mut(&agreement_id)
            .ok_or(EscrowError::AgreementNotFound(agreement_id))?;

        let value_hash = access_proof_value_hash(
            fulfillment.orig_hash,
            fulfillment.buyer.to_pair(),
            fulfillment.provider.to_pair(),
        );
        if value_hash != agreement.value_hash {
            return Err(EscrowError::Rejected(
                "fulfilment does not match the agreed condition values".into(),
            ));
        }
        if fulfillment.proof.is_empty() {
            return Err(EscrowError::Rejected("empty proof".into()));
        }

        Self::accept(agreement)?;
        let calldata = encode_access_proof_fulfill(agreement_id, &fulfillment);
        agreement.access_proof = Some(fulfillment);
        debug!(%agreement_id, "access-proof condition fulfilled");
        Ok(TxReceipt {
            tx_hash: keccak256(&calldata),
            success: true,
        })
    }

    async fn fulfill_access_dleq(
        &self,
        agreement_id: B256,
        fulfillment: AccessDleqFulfillment,
    ) -> Result<TxReceipt, EscrowError> {
        let mut agreements = self.agreements.lock().await;
        let agreement = agreements
            .get_mut(&agreement_id)
            .ok_or(EscrowError::AgreementNotFound(agreement_id))?;

        let value_hash = access_dleq_value_hash(
            fulfillment.cipher,
            fulfillment.secret_id.to_pair(),
            fulfillment.provider.to_pair(),
            fulfillment.buyer.to_pair(),
        );
        if value_hash != agreement.value_hash {
            return Err(EscrowError::Rejected(
                "fulfilment does not match the agreed condition values".into(),
            ));
        }

        let label = condition_id(agreement_id, self.dleq_condition, value_hash);
        check_proof(
            &self.ctx,
            label,
            &fulfillment.secret_id,
            &fulfillment.provider,
            &fulfillment.buyer,
            &fulfillment.proof,
            &fulfillment.reencrypt,
        )
        .map_err(|e| EscrowError::Rejected(e.to_string()))?;

        Self::accept(agreement)?;
        let calldata = encode_access_dleq_fulfill(agreement_id, &fulfillment);
        agreement.access_dleq = Some(fulfillment);
        debug!(%agreement_id, "access-dleq condition fulfilled");
        Ok(TxReceipt {
            tx_hash: keccak256(&calldata),
            success: true,
        })
    }

    async fn access_proof_fulfilled(
        &self,
        agreement_id: B256,
    ) -> Result<Option<AccessProofFulfillment>, EscrowError> {
        let agreements = self.agreements.lock().await;
        let agreement = agreements
            .get(&agreement_id)
            .ok_or(EscrowError::AgreementNotFound(agreement_id))?;
        Ok(agreement.access_proof.clone())
    }

    async fn access_dleq_fulfilled(
        &self,
        agreement_id: B256,
    ) -> Result<Option<AccessDleqFulfillment>, EscrowError> {
        let agreements = self.agreements.lock().await;
        let agreement = agreements
            .get(&agreement_id)
            .ok_or(EscrowError::AgreementNotFound(agreement_id))?;
        Ok(agreement.access_dleq.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Bytes, U256};

    use crate::domain::cipher::MimcCipher;
    use crate::domain::keys::BabyjubPublicKey;

    fn fulfillment() -> AccessProofFulfillment {
        AccessProofFulfillment {
            orig_hash: U256::from(1u64),
            buyer: BabyjubPublicKey::new(U256::from(2u64), U256::from(3u64)),
            provider: BabyjubPublicKey::new(U256::from(4u64), U256::from(5u64)),
            cipher: MimcCipher::new(U256::from(6u64), U256::from(7u64)),
            proof: Bytes::from(vec![1, 2, 3]),
        }
    }

    fn value_hash(f: &AccessProofFulfillment) -> B256 {
        access_proof_value_hash(f.orig_hash, f.buyer.to_pair(), f.provider.to_pair())
    }

    fn escrow() -> InMemoryEscrow {
        InMemoryEscrow::new(CryptoContext::shared(), Address::repeat_byte(0xd1))
    }

    #[tokio::test]
    async fn test_unknown_agreement() {
        let escrow = escrow();
        let err = escrow
            .fulfill_access_proof(B256::repeat_byte(1), fulfillment())
            .await
            .unwrap_err();
        assert!(matches!(err, EscrowError::AgreementNotFound(_)));
    }

    #[tokio::test]
    async fn test_fulfil_then_release() {
        let escrow = escrow();
        let id = B256::repeat_byte(1);
        let f = fulfillment();
        escrow.lock_payment(id, value_hash(&f)).await.unwrap();
        assert_eq!(escrow.state(id).await, Some(TransferState::AgreementLocked));

        let receipt = escrow.fulfill_access_proof(id, f.clone()).await.unwrap();
        assert!(receipt.success);
        assert_eq!(escrow.state(id).await, Some(TransferState::KeyRecoverable));
        assert_eq!(escrow.access_proof_fulfilled(id).await.unwrap(), Some(f));

        escrow.release(id).await.unwrap();
        assert_eq!(escrow.state(id).await, Some(TransferState::EscrowReleased));
    }

    #[tokio::test]
    async fn test_mismatched_values_rejected_and_state_kept() {
        let escrow = escrow();
        let id = B256::repeat_byte(2);
        escrow.lock_payment(id, B256::ZERO).await.unwrap();
        let err = escrow.fulfill_access_proof(id, fulfillment()).await.unwrap_err();
        assert!(matches!(err, EscrowError::Rejected(_)));
        assert_eq!(escrow.state(id).await, Some(TransferState::AgreementLocked));
        assert_eq!(escrow.access_proof_fulfilled(id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_double_fulfil_rejected() {
        let escrow = escrow();
        let id = B256::repeat_byte(3);
        let f = fulfillment();
        escrow.lock_payment(id, value_hash(&f)).await.unwrap();
        escrow.fulfill_access_proof(id, f.clone()).await.unwrap();
        let err = escrow.fulfill_access_proof(id, f).await.unwrap_err();
        assert!(matches!(err, EscrowError::Transition(_)));
    }

    #[tokio::test]
    async fn test_timeout_blocks_release() {
        let escrow = escrow();
        let id = B256::repeat_byte(4);
        let f = fulfillment();
        escrow.lock_payment(id, value_hash(&f)).await.unwrap();
        escrow.expire(id).await.unwrap();
        assert_eq!(escrow.state(id).await, Some(TransferState::TimedOut));
        assert!(escrow.fulfill_access_proof(id, f).await.is_err());
        assert!(escrow.release(id).await.is_err());
    }

    #[tokio::test]
    async fn test_relock_rejected() {
        let escrow = escrow();
        let id = B256::repeat_byte(5);
        escrow.lock_payment(id, B256::ZERO).await.unwrap();
        assert!(matches!(
            escrow.lock_payment(id, B256::ZERO).await,
            Err(EscrowError::Transition(_))
        ));
    }
}
