use std::future::Future;

use alloy::primitives::{Address, B256};

use super::{AccessDleqFulfillment, AccessProofFulfillment, TxReceipt};
use crate::domain::transfer::TransitionError;

/// Port for the on-chain escrow holding the buyer's payment.
///
/// Implementations:
/// - `InMemoryEscrow` (for PoC/testing)
pub trait Escrow: Send + Sync {
    /// Address of the DLEQ access condition; part of every DLEQ label.
    fn dleq_condition(&self) -> Address;

    /// Submit ciphertext and SNARK proof for an agreement.
    fn fulfill_access_proof(
        &self,
        agreement_id: B256,
        fulfillment: AccessProofFulfillment,
    ) -> impl Future<Output = Result<TxReceipt, EscrowError>> + Send;

    /// Submit re-encryption and DLEQ proof for an agreement.
    fn fulfill_access_dleq(
        &self,
        agreement_id: B256,
        fulfillment: AccessDleqFulfillment,
    ) -> impl Future<Output = Result<TxReceipt, EscrowError>> + Send;

    /// The accepted access-proof fulfilment, if any (the `Fulfilled` event).
    fn access_proof_fulfilled(
        &self,
        agreement_id: B256,
    ) -> impl Future<Output = Result<Option<AccessProofFulfillment>, EscrowError>> + Send;

    /// The accepted DLEQ fulfilment, if any.
    fn access_dleq_fulfilled(
        &self,
        agreement_id: B256,
    ) -> impl Future<Output = Result<Option<AccessDleqFulfillment>, EscrowError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum EscrowError {
    #[error("no agreement: {0}")]
    AgreementNotFound(B256),

    #[error("condition rejected fulfilment: {0}")]
    Rejected(String),

    #[error("invalid lifecycle transition: {0}")]
    Transition(#[from] TransitionError),
}
