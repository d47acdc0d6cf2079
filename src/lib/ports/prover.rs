use std::future::Future;

use crate::domain::proof::SnarkProof;
use crate::domain::witness::KeyTransferWitness;

/// Port for key-transfer proof generation and off-chain verification.
///
/// Implementations:
/// - `SnarkjsProver` (shells out to `snarkjs plonk fullprove`)
/// - `MockProver` (witness check only, for tests)
pub trait Prover: Send + Sync {
    /// Generate a proof for the key-transfer circuit.
    ///
    /// The returned public signals must equal `witness.public_signals()`.
    fn prove_key_transfer(
        &self,
        witness: &KeyTransferWitness,
    ) -> impl Future<Output = Result<SnarkProof, ProverError>> + Send;

    /// Check a proof against the verification key. `Ok(false)` is a rejection.
    fn verify_key_transfer(
        &self,
        proof: &SnarkProof,
    ) -> impl Future<Output = Result<bool, ProverError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum ProverError {
    #[error("circuit artifact missing: {0}")]
    ArtifactMissing(String),

    #[error("proof generation failed: {0}")]
    ProofFailed(String),

    #[error("witness generation failed: {0}")]
    WitnessError(String),

    #[error("witness serialization error: {0}")]
    WitnessSerialization(String),

    #[error("prover binary not found: {0}")]
    BinaryNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
