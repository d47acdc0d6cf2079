use std::sync::Arc;

use alloy::primitives::{keccak256, Bytes, U256};

use crate::crypto::context::CryptoContext;
use crate::domain::proof::SnarkProof;
use crate::domain::witness::KeyTransferWitness;
use crate::ports::prover::{Prover, ProverError};

/// In-process stand-in for the PLONK prover, for tests and demos.
///
/// Instead of a proof it checks every relation of the witness directly and
/// emits `keccak256(signals)` as the "proof", which `verify_key_transfer`
/// recomputes. It proves nothing to a third party.
pub struct MockProver {
    ctx: Arc<CryptoContext>,
}

impl MockProver {
    pub fn new(ctx: Arc<CryptoContext>) -> Self {
        Self { ctx }
    }

    fn seal(signals: &[U256]) -> Bytes {
        let mut words = Vec::with_capacity(signals.len() * 32);
        for s in signals {
            words.extend_from_slice(&s.to_be_bytes::<32>());
        }
        Bytes::from(keccak256(&words).to_vec())
    }
}

impl Prover for MockProver {
    async fn prove_key_transfer(
        &self,
        witness: &KeyTransferWitness,
    ) -> Result<SnarkProof, ProverError> {
        witness
            .check(&self.ctx)
            .map_err(|e| ProverError::WitnessError(e.to_string()))?;
        let public_signals = witness.public_signals().to_vec();
        Ok(SnarkProof {
            calldata: Self::seal(&public_signals),
            proof: serde_json::json!({ "protocol": "mock" }),
            public_signals,
        })
    }

    async fn verify_key_transfer(&self, proof: &SnarkProof) -> Result<bool, ProverError> {
        Ok(proof.calldata == Self::seal(&proof.public_signals))
    }
}
