use std::path::Path;
use std::process::Output;

use alloy::primitives::{Bytes, U256};
use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::CircuitArtifacts;
use crate::crypto::field::parse_scalar;
use crate::domain::proof::SnarkProof;
use crate::domain::witness::KeyTransferWitness;
use crate::ports::prover::{Prover, ProverError};

/// Format a scalar as the decimal string circom inputs expect.
fn format_signal(value: &U256) -> String {
    value.to_string()
}

/// JSON input for the key-transfer circuit.
///
/// Field names **must** match the circom signal names exactly.
#[derive(Serialize)]
struct KeyTransferInput {
    #[serde(rename = "xL_in")]
    xl_in: String,
    #[serde(rename = "xR_in")]
    xr_in: String,
    provider_k: String,
    buyer_x: String,
    buyer_y: String,
    provider_x: String,
    provider_y: String,
    #[serde(rename = "cipher_xL_in")]
    cipher_xl_in: String,
    #[serde(rename = "cipher_xR_in")]
    cipher_xr_in: String,
    hash_plain: String,
}

impl From<&KeyTransferWitness> for KeyTransferInput {
    fn from(w: &KeyTransferWitness) -> Self {
        Self {
            xl_in: format_signal(&w.xl_in),
            xr_in: format_signal(&w.xr_in),
            provider_k: format_signal(&w.provider_k.value()),
            buyer_x: format_signal(&w.buyer_x),
            buyer_y: format_signal(&w.buyer_y),
            provider_x: format_signal(&w.provider_x),
            provider_y: format_signal(&w.provider_y),
            cipher_xl_in: format_signal(&w.cipher_xl_in),
            cipher_xr_in: format_signal(&w.cipher_xr_in),
            hash_plain: format_signal(&w.hash_plain),
        }
    }
}

/// SnarkjsProver generates PLONK proofs by shelling out to the `snarkjs` CLI.
///
/// This prover:
/// 1. Writes the witness as `input.json` in a scratch directory
/// 2. Runs `snarkjs plonk fullprove` against the circuit wasm and zkey
/// 3. Checks `public.json` against the witness signals
/// 4. Runs `snarkjs zkey export soliditycalldata` for the on-chain proof bytes
pub struct SnarkjsProver {
    artifacts: CircuitArtifacts,
    snarkjs: String,
}

impl SnarkjsProver {
    pub fn new(artifacts: CircuitArtifacts, snarkjs: impl Into<String>) -> Self {
        Self {
            artifacts,
            snarkjs: snarkjs.into(),
        }
    }

    fn format_input_json(witness: &KeyTransferWitness) -> Result<String, ProverError> {
        serde_json::to_string(&KeyTransferInput::from(witness))
            .map_err(|e| ProverError::WitnessSerialization(e.to_string()))
    }

    fn check_artifacts(&self) -> Result<(), ProverError> {
        match self.artifacts.missing() {
            Some(path) => Err(ProverError::ArtifactMissing(path.display().to_string())),
            None => Ok(()),
        }
    }

    async fn run(&self, args: &[&str], cwd: &Path) -> Result<Output, ProverError> {
        debug!(bin = %self.snarkjs, ?args, "running snarkjs");
        Command::new(&self.snarkjs)
            .args(args)
            .current_dir(cwd)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ProverError::BinaryNotFound(self.snarkjs.clone()),
                _ => ProverError::IoError(e),
            })
    }
}

fn path_arg(path: &Path) -> Result<&str, ProverError> {
    path.to_str()
        .ok_or_else(|| ProverError::ArtifactMissing(format!("non-UTF-8 path: {}", path.display())))
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

/// Public signals as written by snarkjs (`public.json`, decimal strings).
fn parse_public_signals(json: &str) -> Result<Vec<U256>, ProverError> {
    let raw: Vec<String> = serde_json::from_str(json)
        .map_err(|e| ProverError::ProofFailed(format!("malformed public.json: {e}")))?;
    raw.iter()
        .map(|s| {
            parse_scalar(s).map_err(|e| ProverError::ProofFailed(format!("public signal: {e}")))
        })
        .collect()
}

fn format_public_signals(signals: &[U256]) -> Result<String, ProverError> {
    let raw: Vec<String> = signals.iter().map(format_signal).collect();
    serde_json::to_string(&raw).map_err(|e| ProverError::WitnessSerialization(e.to_string()))
}

/// Proof bytes from `zkey export soliditycalldata`.
///
/// Older snarkjs prints `0x<proof>,[signals]`; newer prints `[words],[signals]`
/// with the proof as quoted 32-byte words.
fn parse_calldata(out: &str) -> Result<Bytes, ProverError> {
    let out = out.trim();
    let malformed = || ProverError::ProofFailed(format!("unexpected calldata output: {out}"));

    if out.starts_with('[') {
        let end = out.find(']').ok_or_else(malformed)?;
        let words: Vec<String> = serde_json::from_str(&out[..=end]).map_err(|_| malformed())?;
        let mut bytes = Vec::with_capacity(words.len() * 32);
        for word in &words {
            let value = parse_scalar(word).map_err(|_| malformed())?;
            bytes.extend_from_slice(&value.to_be_bytes::<32>());
        }
        return Ok(bytes.into());
    }

    let first = out.split(',').next().unwrap_or_default().trim();
    let hex = first.strip_prefix("0x").ok_or_else(malformed)?;
    hex::decode(hex).map(Bytes::from).map_err(|_| malformed())
}

impl Prover for SnarkjsProver {
    async fn prove_key_transfer(
        &self,
        witness: &KeyTransferWitness,
    ) -> Result<SnarkProof, ProverError> {
        self.check_artifacts()?;
        let input = Self::format_input_json(witness)?;

        let scratch = tempfile::tempdir()?;
        let dir = scratch.path();
        tokio::fs::write(dir.join("input.json"), input).await?;

        // 1. Witness + proof in one go
        let fullprove = self
            .run(
                &[
                    "plonk",
                    "fullprove",
                    "input.json",
                    path_arg(&self.artifacts.wasm)?,
                    path_arg(&self.artifacts.zkey)?,
                    "proof.json",
                    "public.json",
                ],
                dir,
            )
            .await?;
        if !fullprove.status.success() {
            let stderr = stderr_of(&fullprove);
            return Err(if stderr.contains("Assert Failed") || stderr.contains("Error in template") {
                ProverError::WitnessError(stderr)
            } else {
                ProverError::ProofFailed(format!("snarkjs plonk fullprove failed: {stderr}"))
            });
        }

        // 2. The circuit must have exposed exactly the signals we committed to
        let public_signals =
            parse_public_signals(&tokio::fs::read_to_string(dir.join("public.json")).await?)?;
        if public_signals != witness.public_signals() {
            warn!("public signals from prover differ from witness");
            return Err(ProverError::ProofFailed(
                "public signals do not match the witness".into(),
            ));
        }
        let proof_json = tokio::fs::read_to_string(dir.join("proof.json")).await?;
        let proof: serde_json::Value = serde_json::from_str(&proof_json)
            .map_err(|e| ProverError::ProofFailed(format!("malformed proof.json: {e}")))?;

        // 3. Calldata for the on-chain verifier
        let export = self
            .run(
                &["zkey", "export", "soliditycalldata", "public.json", "proof.json"],
                dir,
            )
            .await?;
        if !export.status.success() {
            return Err(ProverError::ProofFailed(format!(
                "snarkjs zkey export soliditycalldata failed: {}",
                stderr_of(&export)
            )));
        }
        let calldata = parse_calldata(&String::from_utf8_lossy(&export.stdout))?;

        debug!(bytes = calldata.len(), "key-transfer proof generated");
        Ok(SnarkProof {
            calldata,
            proof,
            public_signals,
        })
    }

    async fn verify_key_transfer(&self, proof: &SnarkProof) -> Result<bool, ProverError> {
        if !self.artifacts.vkey.exists() {
            return Err(ProverError::ArtifactMissing(
                self.artifacts.vkey.display().to_string(),
            ));
        }
        let scratch = tempfile::tempdir()?;
        let dir = scratch.path();
        tokio::fs::write(
            dir.join("public.json"),
            format_public_signals(&proof.public_signals)?,
        )
        .await?;
        let proof_json = serde_json::to_string(&proof.proof)
            .map_err(|e| ProverError::WitnessSerialization(e.to_string()))?;
        tokio::fs::write(dir.join("proof.json"), proof_json).await?;

        let output = self
            .run(
                &[
                    "plonk",
                    "verify",
                    path_arg(&self.artifacts.vkey)?,
                    "public.json",
                    "proof.json",
                ],
                dir,
            )
            .await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let accepted = output.status.success() && stdout.contains("OK");
        debug!(accepted, "snarkjs plonk verify");
        Ok(accepted)
    }
}
