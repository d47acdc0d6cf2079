//! `dtp` command line: key derivation, hashing, MiMC encryption, BabyJubjub
//! signatures, DLEQ proofs and SNARK key-transfer proofs.
//!
//! Every command prints one JSON document on stdout. Scalars and coordinates
//! are accepted as `0x` hex or decimal; points are written `x,y`.
//!
//! Examples:
//!   dtp keygen abc
//!   dtp hash 0x706173737764...
//!   dtp encrypt --data 0x... --secret abc --passphrase --peer 0x..,0x..
//!   dtp prove --config dtp.toml --data 0x... --buyer 0x..,0x..

use std::path::PathBuf;
use std::sync::Arc;

use alloy::primitives::B256;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing::{error, info};

use dtp::adapters::snarkjs_prover::SnarkjsProver;
use dtp::config::{ConfigError, DtpConfig};
use dtp::crypto::dleq;
use dtp::crypto::ecdh::ecdh;
use dtp::crypto::field::{parse_scalar, to_hex};
use dtp::crypto::keys::{make_key, secret_to_public};
use dtp::crypto::poseidon::hash_block;
use dtp::crypto::signature;
use dtp::domain::cipher::{MimcCipher, PlaintextBlock};
use dtp::domain::keys::{BabyjubPublicKey, Babysig, Secret};
use dtp::domain::proof::{DleqProof, DleqTransfer};
use dtp::scheme::{DleqClaim, DleqInput, DleqScheme, ProofScheme, SnarkInput, SnarkScheme};
use dtp::{CryptoContext, DtpError};

#[derive(Parser)]
#[command(name = "dtp", about = "Data transfer proof tooling")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// A secret given either directly as a scalar or as a passphrase.
#[derive(clap::Args)]
struct SecretArg {
    /// Scalar (`0x` hex or decimal), or a passphrase with `--passphrase`.
    #[arg(long)]
    secret: String,
    /// Derive the secret from `--secret` with `makeKey`.
    #[arg(long)]
    passphrase: bool,
}

impl SecretArg {
    fn resolve(&self) -> Result<Secret, DtpError> {
        if self.passphrase {
            Ok(make_key(&self.secret))
        } else {
            Ok(Secret::parse(&self.secret)?)
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Derive the secret and both public keys of a passphrase.
    Keygen { passphrase: String },
    /// Poseidon commitment of a 32-byte block.
    Hash { data: String },
    /// MiMC-encrypt a block under the ECDH key with `peer`.
    Encrypt {
        #[arg(long)]
        data: String,
        #[command(flatten)]
        secret: SecretArg,
        #[arg(long, value_parser = parse_point)]
        peer: BabyjubPublicKey,
    },
    /// Decrypt a MiMC ciphertext under the ECDH key with `peer`.
    Decrypt {
        #[arg(long)]
        xl: String,
        #[arg(long)]
        xr: String,
        #[command(flatten)]
        secret: SecretArg,
        #[arg(long, value_parser = parse_point)]
        peer: BabyjubPublicKey,
    },
    /// Sign a message with a passphrase-derived key.
    Sign {
        #[arg(long)]
        passphrase: String,
        #[arg(long)]
        msg: String,
    },
    /// Verify a signature given as JSON (`{"R8":[..],"S":..}`).
    Verify {
        #[arg(long, value_parser = parse_point)]
        public: BabyjubPublicKey,
        #[arg(long)]
        msg: String,
        #[arg(long)]
        signature: String,
    },
    /// Re-encrypt a secret anchor for a buyer and prove it (BN254 G1 keys).
    DleqProve {
        #[arg(long)]
        label: B256,
        #[command(flatten)]
        secret: SecretArg,
        #[arg(long, value_parser = parse_point)]
        secret_id: BabyjubPublicKey,
        #[arg(long, value_parser = parse_point)]
        buyer: BabyjubPublicKey,
    },
    /// Check a DLEQ re-encryption proof.
    DleqVerify {
        #[arg(long)]
        label: B256,
        #[arg(long, value_parser = parse_point)]
        secret_id: BabyjubPublicKey,
        #[arg(long, value_parser = parse_point)]
        provider: BabyjubPublicKey,
        #[arg(long, value_parser = parse_point)]
        buyer: BabyjubPublicKey,
        #[arg(long, value_parser = parse_point)]
        reencrypt: BabyjubPublicKey,
        #[arg(long)]
        e: String,
        #[arg(long)]
        f: String,
    },
    /// Generate a key-transfer proof with snarkjs; the provider secret comes from the config.
    Prove {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        data: String,
        #[arg(long, value_parser = parse_point)]
        buyer: BabyjubPublicKey,
    },
}

fn parse_point(s: &str) -> Result<BabyjubPublicKey, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y, got {s}"))?;
    let x = parse_scalar(x).map_err(|e| e.to_string())?;
    let y = parse_scalar(y).map_err(|e| e.to_string())?;
    Ok(BabyjubPublicKey::new(x, y))
}

async fn run(ctx: &Arc<CryptoContext>, command: Command) -> Result<Value, DtpError> {
    match command {
        Command::Keygen { passphrase } => {
            let secret = make_key(&passphrase);
            Ok(json!({
                "secret": secret.to_hex(),
                "babyjub": secret_to_public(ctx, &secret),
                "bn254": dleq::secret_to_public(ctx, &secret),
            }))
        }
        Command::Hash { data } => {
            let data = PlaintextBlock::from_hex(&data)?;
            Ok(json!({ "hash": to_hex(hash_block(&data)) }))
        }
        Command::Encrypt { data, secret, peer } => {
            let data = PlaintextBlock::from_hex(&data)?;
            let k = ecdh(ctx, &secret.resolve()?, &peer)?;
            Ok(json!({ "cipher": ctx.mimc().encrypt(&data, k) }))
        }
        Command::Decrypt {
            xl,
            xr,
            secret,
            peer,
        } => {
            let cipher = MimcCipher::new(parse_scalar(&xl)?, parse_scalar(&xr)?);
            let k = ecdh(ctx, &secret.resolve()?, &peer)?;
            let data = ctx.mimc().decrypt(&cipher, k)?;
            Ok(json!({ "data": data.to_hex() }))
        }
        Command::Sign { passphrase, msg } => {
            let sig = signature::sign(ctx, &passphrase, parse_scalar(&msg)?);
            Ok(json!({ "signature": sig }))
        }
        Command::Verify {
            public,
            msg,
            signature: sig,
        } => {
            let sig: Babysig = serde_json::from_str(&sig)
                .map_err(|e| DtpError::InvalidScalarRange(format!("signature JSON: {e}")))?;
            signature::check(ctx, &public, parse_scalar(&msg)?, &sig)?;
            Ok(json!({ "valid": true }))
        }
        Command::DleqProve {
            label,
            secret,
            secret_id,
            buyer,
        } => {
            let scheme = DleqScheme::new(ctx.clone());
            let transfer = scheme
                .prove(&DleqInput {
                    label,
                    provider_secret: secret.resolve()?,
                    secret_id,
                    buyer_pub: buyer,
                })
                .await?;
            Ok(json!(transfer))
        }
        Command::DleqVerify {
            label,
            secret_id,
            provider,
            buyer,
            reencrypt,
            e,
            f,
        } => {
            let scheme = DleqScheme::new(ctx.clone());
            let claim = DleqClaim {
                label,
                secret_id,
                provider_pub: provider,
                buyer_pub: buyer,
            };
            let transfer = DleqTransfer {
                proof: DleqProof {
                    e: parse_scalar(&e)?,
                    f: parse_scalar(&f)?,
                },
                reencrypt,
            };
            scheme.verify(&claim, &transfer).await?;
            Ok(json!({ "valid": true }))
        }
        Command::Prove {
            config,
            data,
            buyer,
        } => {
            let config = DtpConfig::load(&config)?;
            let provider_secret = config.provider_secret()?.ok_or_else(|| {
                DtpError::Config(ConfigError::Validation(
                    "prove needs a [provider] section".into(),
                ))
            })?;
            let prover = SnarkjsProver::new(config.artifacts(), config.snarkjs_bin());
            let scheme = SnarkScheme::new(ctx.clone(), prover);
            let input = SnarkInput {
                buyer_pub: buyer,
                provider_pub: secret_to_public(ctx, &provider_secret),
                provider_secret,
                data: PlaintextBlock::from_hex(&data)?,
            };
            info!("running snarkjs, this takes a while");
            let transfer = scheme.prove(&input).await?;
            Ok(json!(transfer))
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let ctx = CryptoContext::shared();

    match run(&ctx, cli.command).await {
        Ok(value) => println!("{value:#}"),
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;

    #[test]
    fn test_parse_point() {
        let p = parse_point("0x01,2").unwrap();
        assert_eq!(p, BabyjubPublicKey::new(U256::from(1u64), U256::from(2u64)));
        assert!(parse_point("0x01").is_err());
        assert!(parse_point("zz,1").is_err());
    }

    #[tokio::test]
    async fn test_encrypt_then_decrypt_commands() {
        let ctx = CryptoContext::shared();
        let buyer = secret_to_public(&ctx, &make_key("abd"));
        let provider = secret_to_public(&ctx, &make_key("abc"));
        let data = PlaintextBlock::new(*b"passwd_32_letters_1234567890asdf");

        let out = run(
            &ctx,
            Command::Encrypt {
                data: data.to_hex(),
                secret: SecretArg {
                    secret: "abc".into(),
                    passphrase: true,
                },
                peer: buyer,
            },
        )
        .await
        .unwrap();
        let cipher: MimcCipher = serde_json::from_value(out["cipher"].clone()).unwrap();

        let out = run(
            &ctx,
            Command::Decrypt {
                xl: to_hex(cipher.xl),
                xr: to_hex(cipher.xr),
                secret: SecretArg {
                    secret: "abd".into(),
                    passphrase: true,
                },
                peer: provider,
            },
        )
        .await
        .unwrap();
        assert_eq!(out["data"], data.to_hex());
    }

    #[tokio::test]
    async fn test_sign_then_verify_commands() {
        let ctx = CryptoContext::shared();
        let out = run(
            &ctx,
            Command::Sign {
                passphrase: "abc".into(),
                msg: "42".into(),
            },
        )
        .await
        .unwrap();
        let sig = out["signature"].to_string();

        let verified = run(
            &ctx,
            Command::Verify {
                public: secret_to_public(&ctx, &make_key("abc")),
                msg: "42".into(),
                signature: sig.clone(),
            },
        )
        .await;
        assert!(verified.is_ok());

        let rejected = run(
            &ctx,
            Command::Verify {
                public: secret_to_public(&ctx, &make_key("abc")),
                msg: "43".into(),
                signature: sig,
            },
        )
        .await;
        assert!(matches!(rejected, Err(DtpError::ProofVerificationFailed(_))));
    }
}
