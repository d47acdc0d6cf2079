use std::sync::Arc;

use alloy::primitives::{B256, U256};
use tracing::{debug, info, instrument, warn};

use crate::adapters::abi::dleq_condition_id;
use crate::crypto::context::CryptoContext;
use crate::crypto::dleq;
use crate::crypto::ecdh::ecdh;
use crate::crypto::keys::secret_to_public;
use crate::crypto::poseidon::hash_block;
use crate::crypto::signature::sign;
use crate::domain::cipher::PlaintextBlock;
use crate::domain::keys::{Account, BabyjubPublicKey, Babysig, Secret};
use crate::domain::proof::DleqTransfer;
use crate::error::DtpError;
use crate::ports::assets::{AssetResolver, ServiceAttributes};
use crate::ports::escrow::Escrow;
use crate::ports::prover::Prover;
use crate::ports::{AccessDleqFulfillment, AccessProofFulfillment, TxReceipt};
use crate::scheme::{DleqClaim, DleqInput, DleqScheme, ProofScheme, SnarkInput, SnarkScheme};

/// Provider- and buyer-side key transfer over an escrow.
///
/// Generic over `Prover` (SNARK backend) and `Escrow` (condition contracts).
/// The buyer only ever needs its own secret and what the escrow exposes.
pub struct Dtp<P: Prover, E: Escrow> {
    ctx: Arc<CryptoContext>,
    snark: SnarkScheme<P>,
    dleq: DleqScheme,
    escrow: E,
}

impl<P: Prover, E: Escrow> Dtp<P, E> {
    pub fn new(ctx: Arc<CryptoContext>, prover: P, escrow: E) -> Self {
        Self {
            snark: SnarkScheme::new(ctx.clone(), prover),
            dleq: DleqScheme::new(ctx.clone()),
            ctx,
            escrow,
        }
    }

    pub fn context(&self) -> &CryptoContext {
        &self.ctx
    }

    pub fn escrow(&self) -> &E {
        &self.escrow
    }

    pub fn babyjub_account(&self, passphrase: &str) -> Account {
        Account::from_passphrase(&self.ctx, passphrase)
    }

    pub fn sign_babyjub(&self, account: &Account, msg: U256) -> Babysig {
        sign(&self.ctx, account.passphrase(), msg)
    }

    /// Attributes of an `access-proof` service: `_hash` and `_providerPub`.
    pub fn publish_commitment(
        &self,
        data: &PlaintextBlock,
        provider_pub: &BabyjubPublicKey,
    ) -> ServiceAttributes {
        ServiceAttributes::AccessProof {
            hash: hash_block(data),
            provider_pub: *provider_pub,
        }
    }

    /// Attributes of an `access-dleq` service: the masked key, the secret
    /// anchor `xG` and the provider's G1 key.
    pub fn publish_dleq(
        &self,
        passwd: U256,
        secret: &Secret,
        provider_pub: &BabyjubPublicKey,
    ) -> Result<ServiceAttributes, DtpError> {
        Ok(ServiceAttributes::AccessDleq {
            cipher: dleq::mask(&self.ctx, passwd, secret, provider_pub)?,
            secret_id: dleq::secret_to_public(&self.ctx, secret),
            provider_pub: *provider_pub,
        })
    }

    /// Encrypt `data` for the buyer, prove it, and fulfil the access-proof condition.
    #[instrument(skip_all, fields(%agreement_id))]
    pub async fn transfer_key(
        &self,
        agreement_id: B256,
        data: &PlaintextBlock,
        provider_secret: &Secret,
        buyer_pub: &BabyjubPublicKey,
        provider_pub: &BabyjubPublicKey,
    ) -> Result<TxReceipt, DtpError> {
        let input = SnarkInput {
            buyer_pub: *buyer_pub,
            provider_pub: *provider_pub,
            provider_secret: *provider_secret,
            data: *data,
        };
        let transfer = self.snark.prove(&input).await?;
        debug!(orig_hash = %transfer.orig_hash, "key-transfer proof generated");

        let fulfillment = AccessProofFulfillment {
            orig_hash: transfer.orig_hash,
            buyer: *buyer_pub,
            provider: *provider_pub,
            cipher: transfer.cipher,
            proof: transfer.proof.calldata,
        };
        let receipt = self
            .escrow
            .fulfill_access_proof(agreement_id, fulfillment)
            .await?;
        info!(tx_hash = %receipt.tx_hash, "access-proof condition fulfilled");
        Ok(receipt)
    }

    /// Decrypt the key the provider submitted for this agreement.
    #[instrument(skip_all, fields(%agreement_id))]
    pub async fn read_key(
        &self,
        agreement_id: B256,
        buyer_secret: &Secret,
        provider_pub: &BabyjubPublicKey,
    ) -> Result<PlaintextBlock, DtpError> {
        let fulfillment = self
            .escrow
            .access_proof_fulfilled(agreement_id)
            .await?
            .ok_or_else(|| {
                DtpError::ExternalDependencyError(format!(
                    "access-proof condition of {agreement_id} not fulfilled"
                ))
            })?;
        if fulfillment.provider != *provider_pub {
            warn!("fulfilment was submitted under another provider key");
            return Err(DtpError::ProofVerificationFailed(
                "fulfilment provider does not match".into(),
            ));
        }

        let k = ecdh(&self.ctx, buyer_secret, provider_pub)?;
        let data = self.ctx.mimc().decrypt(&fulfillment.cipher, k)?;
        if hash_block(&data) != fulfillment.orig_hash {
            return Err(DtpError::ProofVerificationFailed(
                "decrypted key does not match the committed hash".into(),
            ));
        }
        Ok(data)
    }

    /// Re-encrypt the secret anchor for the buyer and fulfil the DLEQ condition.
    #[instrument(skip_all, fields(%agreement_id))]
    pub async fn transfer_key_dleq(
        &self,
        agreement_id: B256,
        cipher: U256,
        provider_secret: &Secret,
        secret_id: &BabyjubPublicKey,
        buyer_pub: &BabyjubPublicKey,
    ) -> Result<TxReceipt, DtpError> {
        let provider_pub = dleq::secret_to_public(&self.ctx, provider_secret);
        let label = dleq_condition_id(
            agreement_id,
            self.escrow.dleq_condition(),
            cipher,
            secret_id.to_pair(),
            provider_pub.to_pair(),
            buyer_pub.to_pair(),
        );
        debug!(%label, "DLEQ label");

        let transfer = self
            .dleq
            .prove(&DleqInput {
                label,
                provider_secret: *provider_secret,
                secret_id: *secret_id,
                buyer_pub: *buyer_pub,
            })
            .await?;

        let fulfillment = AccessDleqFulfillment {
            cipher,
            secret_id: *secret_id,
            provider: provider_pub,
            buyer: *buyer_pub,
            reencrypt: transfer.reencrypt,
            proof: transfer.proof,
        };
        let receipt = self
            .escrow
            .fulfill_access_dleq(agreement_id, fulfillment)
            .await?;
        info!(tx_hash = %receipt.tx_hash, "access-dleq condition fulfilled");
        Ok(receipt)
    }

    /// Check the submitted re-encryption and recover the masked key.
    #[instrument(skip_all, fields(%agreement_id))]
    pub async fn read_key_dleq(
        &self,
        agreement_id: B256,
        cipher: U256,
        buyer_secret: &Secret,
        provider_pub: &BabyjubPublicKey,
    ) -> Result<U256, DtpError> {
        let fulfillment = self
            .escrow
            .access_dleq_fulfilled(agreement_id)
            .await?
            .ok_or_else(|| {
                DtpError::ExternalDependencyError(format!(
                    "access-dleq condition of {agreement_id} not fulfilled"
                ))
            })?;
        if fulfillment.cipher != cipher || fulfillment.provider != *provider_pub {
            return Err(DtpError::ProofVerificationFailed(
                "fulfilment does not match the published asset".into(),
            ));
        }

        let claim = DleqClaim {
            label: dleq_condition_id(
                agreement_id,
                self.escrow.dleq_condition(),
                cipher,
                fulfillment.secret_id.to_pair(),
                provider_pub.to_pair(),
                fulfillment.buyer.to_pair(),
            ),
            secret_id: fulfillment.secret_id,
            provider_pub: *provider_pub,
            buyer_pub: fulfillment.buyer,
        };
        let transfer = DleqTransfer {
            proof: fulfillment.proof,
            reencrypt: fulfillment.reencrypt,
        };
        self.dleq.verify(&claim, &transfer).await?;

        Ok(dleq::recover_key(
            &self.ctx,
            cipher,
            buyer_secret,
            provider_pub,
            &fulfillment.reencrypt,
        )?)
    }

    /// Provider side: look up the asset and run whichever scheme it was published with.
    #[instrument(skip_all, fields(%did, %agreement_id))]
    pub async fn transfer_for_asset<A: AssetResolver>(
        &self,
        assets: &A,
        did: &str,
        agreement_id: B256,
        provider_secret: &Secret,
        buyer_pub: &BabyjubPublicKey,
    ) -> Result<TxReceipt, DtpError> {
        let attributes = assets.service_attributes(did).await?;
        info!(scheme = %attributes.kind(), "transferring key");

        match attributes {
            ServiceAttributes::AccessProof { hash, provider_pub } => {
                if secret_to_public(&self.ctx, provider_secret) != provider_pub {
                    return Err(DtpError::ProofGenerationFailed(
                        "provider secret does not match the published key".into(),
                    ));
                }
                let data = assets.plaintext(did).await?;
                if hash_block(&data) != hash {
                    return Err(DtpError::ProofGenerationFailed(
                        "stored plaintext does not match the published hash".into(),
                    ));
                }
                self.transfer_key(agreement_id, &data, provider_secret, buyer_pub, &provider_pub)
                    .await
            }
            ServiceAttributes::AccessDleq {
                cipher,
                secret_id,
                provider_pub,
            } => {
                if dleq::secret_to_public(&self.ctx, provider_secret) != provider_pub {
                    return Err(DtpError::ProofGenerationFailed(
                        "provider secret does not match the published key".into(),
                    ));
                }
                self.transfer_key_dleq(agreement_id, cipher, provider_secret, &secret_id, buyer_pub)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;

    use crate::adapters::abi::access_proof_value_hash;
    use crate::adapters::memory_escrow::InMemoryEscrow;
    use crate::adapters::mock_prover::MockProver;
    use crate::crypto::signature::verify;

    fn dtp() -> Dtp<MockProver, InMemoryEscrow> {
        let ctx = CryptoContext::shared();
        Dtp::new(
            ctx.clone(),
            MockProver::new(ctx.clone()),
            InMemoryEscrow::new(ctx, Address::repeat_byte(0xd1)),
        )
    }

    #[test]
    fn test_account_signs_its_address() {
        let dtp = dtp();
        let account = dtp.babyjub_account("abc");
        let address = U256::from_be_slice(Address::repeat_byte(0x42).as_slice());
        let sig = dtp.sign_babyjub(&account, address);
        assert!(verify(dtp.context(), account.public(), address, &sig));
    }

    #[test]
    fn test_publish_commitment() {
        let dtp = dtp();
        let provider = dtp.babyjub_account("abc");
        let data = PlaintextBlock::new([3u8; 32]);
        let attrs = dtp.publish_commitment(&data, provider.public());
        assert_eq!(
            attrs,
            ServiceAttributes::AccessProof {
                hash: hash_block(&data),
                provider_pub: *provider.public(),
            }
        );
    }

    #[tokio::test]
    async fn test_read_key_before_fulfilment() {
        let dtp = dtp();
        let provider = dtp.babyjub_account("abc");
        let buyer = dtp.babyjub_account("abd");
        let id = B256::repeat_byte(7);
        dtp.escrow().lock_payment(id, B256::ZERO).await.unwrap();

        let err = dtp
            .read_key(id, buyer.secret(), provider.public())
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_transfer_and_read() {
        let dtp = dtp();
        let provider = dtp.babyjub_account("abc");
        let buyer = dtp.babyjub_account("abd");
        let data = PlaintextBlock::new(*b"passwd_32_letters_1234567890asdf");
        let id = B256::repeat_byte(8);
        let value_hash = access_proof_value_hash(
            hash_block(&data),
            buyer.public().to_pair(),
            provider.public().to_pair(),
        );
        dtp.escrow().lock_payment(id, value_hash).await.unwrap();

        dtp.transfer_key(id, &data, provider.secret(), buyer.public(), provider.public())
            .await
            .unwrap();
        let read = dtp.read_key(id, buyer.secret(), provider.public()).await.unwrap();
        assert_eq!(read, data);
    }
}
