use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::{B256, U256};
use serde::{Deserialize, Serialize};

use crate::crypto::context::CryptoContext;
use crate::crypto::dleq::{check_proof, make_proof};
use crate::domain::cipher::PlaintextBlock;
use crate::domain::keys::{BabyjubPublicKey, Secret};
use crate::domain::proof::{DleqTransfer, SnarkProof, SnarkTransfer};
use crate::domain::witness::KeyTransferWitness;
use crate::error::DtpError;
use crate::ports::prover::Prover;

/// Which proof-of-transfer scheme an asset was published with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemeKind {
    /// MiMC ciphertext + PLONK proof, BabyJubjub keys.
    AccessProof,
    /// Proxy re-encryption + Chaum-Pedersen proof, BN254 G1 keys.
    AccessDleq,
}

impl SchemeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemeKind::AccessProof => "access-proof",
            SchemeKind::AccessDleq => "access-dleq",
        }
    }
}

impl fmt::Display for SchemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access-proof" => Ok(SchemeKind::AccessProof),
            "access-dleq" => Ok(SchemeKind::AccessDleq),
            other => Err(format!("unknown scheme: {other}")),
        }
    }
}

/// A proof-of-correct-transfer scheme.
///
/// `prove` runs on the provider and yields what gets submitted to the escrow;
/// `verify` is what anyone holding the public claim can check.
pub trait ProofScheme: Send + Sync {
    const KIND: SchemeKind;

    type Input: Send + Sync;
    type Claim: Send + Sync;
    type Artifact: Send + Sync;

    fn prove(
        &self,
        input: &Self::Input,
    ) -> impl Future<Output = Result<Self::Artifact, DtpError>> + Send;

    fn verify(
        &self,
        claim: &Self::Claim,
        artifact: &Self::Artifact,
    ) -> impl Future<Output = Result<(), DtpError>> + Send;
}

// ── SNARK ────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct SnarkInput {
    pub buyer_pub: BabyjubPublicKey,
    pub provider_pub: BabyjubPublicKey,
    pub provider_secret: Secret,
    pub data: PlaintextBlock,
}

/// Public values the proof is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnarkClaim {
    pub buyer_pub: BabyjubPublicKey,
    pub provider_pub: BabyjubPublicKey,
    /// `_hash` published with the asset.
    pub orig_hash: U256,
}

pub struct SnarkScheme<P: Prover> {
    ctx: Arc<CryptoContext>,
    prover: P,
}

impl<P: Prover> SnarkScheme<P> {
    pub fn new(ctx: Arc<CryptoContext>, prover: P) -> Self {
        Self { ctx, prover }
    }

    pub fn prover(&self) -> &P {
        &self.prover
    }

    /// Provider-side re-check: rebuild the witness and compare it with the
    /// proof's public signals before trusting the external verifier.
    pub async fn verify_transfer(
        &self,
        input: &SnarkInput,
        proof: &SnarkProof,
    ) -> Result<(), DtpError> {
        let witness = KeyTransferWitness::new(
            &self.ctx,
            &input.buyer_pub,
            &input.provider_pub,
            &input.provider_secret,
            &input.data,
        )?;
        if proof.public_signals != witness.public_signals() {
            return Err(DtpError::ProofVerificationFailed(
                "public signals differ from the recomputed witness".into(),
            ));
        }
        self.check_with_prover(proof).await
    }

    async fn check_with_prover(&self, proof: &SnarkProof) -> Result<(), DtpError> {
        if !self.prover.verify_key_transfer(proof).await? {
            return Err(DtpError::ProofVerificationFailed(
                "verifier rejected the proof".into(),
            ));
        }
        Ok(())
    }
}

impl<P: Prover> ProofScheme for SnarkScheme<P> {
    const KIND: SchemeKind = SchemeKind::AccessProof;

    type Input = SnarkInput;
    type Claim = SnarkClaim;
    type Artifact = SnarkTransfer;

    async fn prove(&self, input: &SnarkInput) -> Result<SnarkTransfer, DtpError> {
        let witness = KeyTransferWitness::new(
            &self.ctx,
            &input.buyer_pub,
            &input.provider_pub,
            &input.provider_secret,
            &input.data,
        )?;
        witness.check(&self.ctx)?;

        let proof = self.prover.prove_key_transfer(&witness).await?;
        if proof.public_signals != witness.public_signals() {
            return Err(DtpError::ProofGenerationFailed(
                "prover returned foreign public signals".into(),
            ));
        }
        Ok(SnarkTransfer {
            cipher: witness.cipher(),
            orig_hash: witness.hash_plain,
            proof,
        })
    }

    async fn verify(&self, claim: &SnarkClaim, artifact: &SnarkTransfer) -> Result<(), DtpError> {
        claim.buyer_pub.point(&self.ctx)?;
        claim.provider_pub.point(&self.ctx)?;
        if artifact.orig_hash != claim.orig_hash {
            return Err(DtpError::ProofVerificationFailed(
                "ciphertext does not commit to the published hash".into(),
            ));
        }
        let expected = [
            claim.buyer_pub.x,
            claim.buyer_pub.y,
            claim.provider_pub.x,
            claim.provider_pub.y,
            artifact.cipher.xl,
            artifact.cipher.xr,
            claim.orig_hash,
        ];
        if artifact.proof.public_signals != expected {
            return Err(DtpError::ProofVerificationFailed(
                "public signals do not match the claim".into(),
            ));
        }
        self.check_with_prover(&artifact.proof).await
    }
}

// ── DLEQ ─────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DleqInput {
    /// Condition id of the agreement the proof is bound to.
    pub label: B256,
    pub provider_secret: Secret,
    pub secret_id: BabyjubPublicKey,
    pub buyer_pub: BabyjubPublicKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DleqClaim {
    pub label: B256,
    pub secret_id: BabyjubPublicKey,
    pub provider_pub: BabyjubPublicKey,
    pub buyer_pub: BabyjubPublicKey,
}

pub struct DleqScheme {
    ctx: Arc<CryptoContext>,
}

impl DleqScheme {
    pub fn new(ctx: Arc<CryptoContext>) -> Self {
        Self { ctx }
    }

    fn prove_now(&self, input: &DleqInput) -> Result<DleqTransfer, DtpError> {
        let mut rng = rand::thread_rng();
        Ok(make_proof(
            &self.ctx,
            input.label,
            &input.provider_secret,
            &input.secret_id,
            &input.buyer_pub,
            &mut rng,
        )?)
    }
}

impl ProofScheme for DleqScheme {
    const KIND: SchemeKind = SchemeKind::AccessDleq;

    type Input = DleqInput;
    type Claim = DleqClaim;
    type Artifact = DleqTransfer;

    async fn prove(&self, input: &DleqInput) -> Result<DleqTransfer, DtpError> {
        self.prove_now(input)
    }

    async fn verify(&self, claim: &DleqClaim, artifact: &DleqTransfer) -> Result<(), DtpError> {
        check_proof(
            &self.ctx,
            claim.label,
            &claim.secret_id,
            &claim.provider_pub,
            &claim.buyer_pub,
            &artifact.proof,
            &artifact.reencrypt,
        )?;
        Ok(())
    }
}
