use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use alloy::sol;
use alloy::sol_types::{SolCall, SolValue};

use crate::ports::{AccessDleqFulfillment, AccessProofFulfillment};

sol! {
    interface IAccessProofCondition {
        function fulfill(
            bytes32 agreementId,
            uint256 origHash,
            uint256[2] buyer,
            uint256[2] provider,
            uint256[2] cipher,
            bytes proof
        ) external returns (uint8);

        event Fulfilled(
            bytes32 indexed agreementId,
            uint256 origHash,
            uint256[2] buyer,
            uint256[2] provider,
            uint256[2] cipher,
            bytes proof,
            bytes32 conditionId
        );
    }

    interface IAccessDLEQCondition {
        function fulfill(
            bytes32 agreementId,
            uint256 cipher,
            uint256[2] secretId,
            uint256[2] provider,
            uint256[2] buyer,
            uint256[2] reencrypt,
            uint256[2] proof
        ) external returns (uint8);
    }

    interface IAgreementTemplate {
        function authorizeAgreementTemplate(
            bytes32 agreementId,
            bytes[] params,
            uint256 priceIdx
        ) external;
    }
}

/// `keccak256(abi.encode(origHash, buyer, provider))`
pub fn access_proof_value_hash(orig_hash: U256, buyer: [U256; 2], provider: [U256; 2]) -> B256 {
    keccak256((orig_hash, buyer, provider).abi_encode_params())
}

/// `keccak256(abi.encode(cipher, secretId, provider, buyer))`
pub fn access_dleq_value_hash(
    cipher: U256,
    secret_id: [U256; 2],
    provider: [U256; 2],
    buyer: [U256; 2],
) -> B256 {
    keccak256((cipher, secret_id, provider, buyer).abi_encode_params())
}

/// `keccak256(abi.encodePacked(agreementId, condition, valueHash))`
pub fn condition_id(agreement_id: B256, condition: Address, value_hash: B256) -> B256 {
    keccak256((agreement_id, condition, value_hash).abi_encode_packed())
}

/// Label of a DLEQ proof: the id of the DLEQ condition instance of this agreement.
pub fn dleq_condition_id(
    agreement_id: B256,
    condition: Address,
    cipher: U256,
    secret_id: [U256; 2],
    provider: [U256; 2],
    buyer: [U256; 2],
) -> B256 {
    condition_id(
        agreement_id,
        condition,
        access_dleq_value_hash(cipher, secret_id, provider, buyer),
    )
}

/// Calldata of `AccessProofCondition.fulfill`.
pub fn encode_access_proof_fulfill(agreement_id: B256, f: &AccessProofFulfillment) -> Bytes {
    IAccessProofCondition::fulfillCall {
        agreementId: agreement_id,
        origHash: f.orig_hash,
        buyer: f.buyer.to_pair(),
        provider: f.provider.to_pair(),
        cipher: f.cipher.to_pair(),
        proof: f.proof.clone(),
    }
    .abi_encode()
    .into()
}

/// Calldata of `AccessDLEQCondition.fulfill`.
pub fn encode_access_dleq_fulfill(agreement_id: B256, f: &AccessDleqFulfillment) -> Bytes {
    IAccessDLEQCondition::fulfillCall {
        agreementId: agreement_id,
        cipher: f.cipher,
        secretId: f.secret_id.to_pair(),
        provider: f.provider.to_pair(),
        buyer: f.buyer.to_pair(),
        reencrypt: f.reencrypt.to_pair(),
        proof: f.proof.to_pair(),
    }
    .abi_encode()
    .into()
}

/// Parameters of the lock-payment condition instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockPaymentParams {
    pub did: B256,
    pub reward_address: Address,
    pub token_address: Address,
    pub amounts: Vec<U256>,
    pub receivers: Vec<Address>,
}

/// Parameters of the escrow-payment condition instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscrowPaymentParams {
    pub did: B256,
    pub amounts: Vec<U256>,
    pub receivers: Vec<Address>,
    pub return_address: Address,
    pub lock_payment_address: Address,
    pub token_address: Address,
    pub lock_condition: B256,
    pub release_conditions: Vec<B256>,
}

/// The three condition instances a network node authorizes in one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationBatch {
    pub agreement_id: B256,
    /// `cipher, secretId.x, secretId.y, provider.x, provider.y, buyer.x, buyer.y`
    pub dleq_values: [U256; 7],
    pub lock_payment: LockPaymentParams,
    pub escrow_payment: EscrowPaymentParams,
    pub price_idx: U256,
}

impl AuthorizationBatch {
    pub fn new(
        agreement_id: B256,
        f: &AccessDleqFulfillment,
        lock_payment: LockPaymentParams,
        escrow_payment: EscrowPaymentParams,
        price_idx: U256,
    ) -> Self {
        Self {
            agreement_id,
            dleq_values: [
                f.cipher,
                f.secret_id.x,
                f.secret_id.y,
                f.provider.x,
                f.provider.y,
                f.buyer.x,
                f.buyer.y,
            ],
            lock_payment,
            escrow_payment,
            price_idx,
        }
    }

    /// The `bytes[] params` argument, one ABI blob per condition.
    pub fn encode_params(&self) -> Vec<Bytes> {
        let [c, sx, sy, px, py, bx, by] = self.dleq_values;
        let lock = &self.lock_payment;
        let escrow = &self.escrow_payment;
        vec![
            (c, sx, sy, px, py, bx, by).abi_encode_params().into(),
            (
                lock.did,
                lock.reward_address,
                lock.token_address,
                lock.amounts.clone(),
                lock.receivers.clone(),
            )
                .abi_encode_params()
                .into(),
            (
                escrow.did,
                escrow.amounts.clone(),
                escrow.receivers.clone(),
                escrow.return_address,
                escrow.lock_payment_address,
                escrow.token_address,
                escrow.lock_condition,
                escrow.release_conditions.clone(),
            )
                .abi_encode_params()
                .into(),
        ]
    }

    /// Calldata of `authorizeAgreementTemplate(agreementId, params, priceIdx)`.
    pub fn calldata(&self) -> Bytes {
        IAgreementTemplate::authorizeAgreementTemplateCall {
            agreementId: self.agreement_id,
            params: self.encode_params(),
            priceIdx: self.price_idx,
        }
        .abi_encode()
        .into()
    }
}
