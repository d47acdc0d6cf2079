//! Chaum-Pedersen proof that a re-encryption `yR` uses the same exponent as
//! the provider key `yG`, on BN254 G1.
//!
//! ```text
//! R  = xG + zG              (secret anchor + buyer key)
//! yR = y·R
//! w1 = t·G,  w2 = t·R       (t random)
//! e  = H(label, yG, yR, w1, w2)
//! f  = t − y·e
//! ```
//!
//! `H` is keccak256 over nine 32-byte big-endian words, the layout of
//! Solidity's `keccak256(abi.encodePacked(uint256[]))`, reduced into `Fr`.
//! The buyer recovers `x·yG = yR − z·yG` and unmasks the published cipher.

use alloy::primitives::{keccak256, B256, U256};
use ark_bn254::{Fr, G1Affine, G1Projective};
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::PrimeField;
use ark_std::rand::Rng;
use ark_std::UniformRand;

use super::babyjub::PointError;
use super::bn254::point_to_u256;
use super::context::CryptoContext;
use super::field::{field_to_u256, u256_to_field, EncodingError};
use crate::domain::keys::{BabyjubPublicKey, Secret};
use crate::domain::proof::{DleqProof, DleqTransfer};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DleqError {
    #[error("DLEQ point: {0}")]
    Point(#[from] PointError),

    #[error("DLEQ scalar: {0}")]
    Scalar(#[from] EncodingError),

    #[error("recomputed challenge does not match")]
    ChallengeMismatch,
}

/// `secret · G` on BN254 G1.
pub fn secret_to_public(ctx: &CryptoContext, secret: &Secret) -> BabyjubPublicKey {
    let g1 = ctx.bn254();
    BabyjubPublicKey::from_g1(&g1.mul_generator(&g1.scalar(secret.value())))
}

fn push_point(words: &mut Vec<u8>, p: &G1Affine) {
    let (x, y) = point_to_u256(p);
    words.extend_from_slice(&x.to_be_bytes::<32>());
    words.extend_from_slice(&y.to_be_bytes::<32>());
}

fn challenge(label: B256, yg: &G1Affine, yr: &G1Affine, w1: &G1Affine, w2: &G1Affine) -> Fr {
    let mut words = Vec::with_capacity(9 * 32);
    words.extend_from_slice(label.as_slice());
    for p in [yg, yr, w1, w2] {
        push_point(&mut words, p);
    }
    Fr::from_be_bytes_mod_order(keccak256(&words).as_slice())
}

/// Provider side: re-encrypt the secret anchor `xG` for buyer `zG` and prove it.
pub fn make_proof<R: Rng + ?Sized>(
    ctx: &CryptoContext,
    label: B256,
    provider_secret: &Secret,
    secret_id: &BabyjubPublicKey,
    buyer_pub: &BabyjubPublicKey,
    rng: &mut R,
) -> Result<DleqTransfer, DleqError> {
    let g1 = ctx.bn254();
    let xg = secret_id.g1_point(ctx)?;
    let zg = buyer_pub.g1_point(ctx)?;
    let y = g1.scalar(provider_secret.value());

    let yg = g1.mul_generator(&y);
    let r = (xg + zg).into_affine();
    let yr = (r * y).into_affine();

    let t = Fr::rand(rng);
    let w1 = g1.mul_generator(&t);
    let w2 = (r * t).into_affine();

    let e = challenge(label, &yg, &yr, &w1, &w2);
    let f = t - y * e;

    Ok(DleqTransfer {
        proof: DleqProof {
            e: field_to_u256(e),
            f: field_to_u256(f),
        },
        reencrypt: BabyjubPublicKey::from_g1(&yr),
    })
}

/// Verify a re-encryption proof against its label.
pub fn check_proof(
    ctx: &CryptoContext,
    label: B256,
    secret_id: &BabyjubPublicKey,
    provider_pub: &BabyjubPublicKey,
    buyer_pub: &BabyjubPublicKey,
    proof: &DleqProof,
    reencrypt: &BabyjubPublicKey,
) -> Result<(), DleqError> {
    let g = ctx.bn254().generator();
    let xg = secret_id.g1_point(ctx)?;
    let yg = provider_pub.g1_point(ctx)?;
    let zg = buyer_pub.g1_point(ctx)?;
    let yr = reencrypt.g1_point(ctx)?;
    let e: Fr = u256_to_field(proof.e)?;
    let f: Fr = u256_to_field(proof.f)?;

    let r: G1Projective = xg + zg;
    let w1 = (g * f + yg * e).into_affine();
    let w2 = (r * f + yr * e).into_affine();

    if challenge(label, &yg, &yr, &w1, &w2) != e {
        return Err(DleqError::ChallengeMismatch);
    }
    Ok(())
}

/// Publish-time masking: `passwd XOR (x·yG).x`.
pub fn mask(
    ctx: &CryptoContext,
    passwd: U256,
    secret: &Secret,
    provider_pub: &BabyjubPublicKey,
) -> Result<U256, DleqError> {
    let yg = provider_pub.g1_point(ctx)?;
    let shared = (yg * ctx.bn254().scalar(secret.value())).into_affine();
    Ok(unmask(passwd, &shared))
}

/// Inverse of [`mask`] given the shared point `x·yG`.
pub fn unmask(cipher: U256, shared: &G1Affine) -> U256 {
    let (x, _) = point_to_u256(shared);
    cipher ^ x
}

/// Buyer side: `R' = yR − z·yG`, then unmask.
pub fn recover_key(
    ctx: &CryptoContext,
    cipher: U256,
    buyer_secret: &Secret,
    provider_pub: &BabyjubPublicKey,
    reencrypt: &BabyjubPublicKey,
) -> Result<U256, DleqError> {
    let yg = provider_pub.g1_point(ctx)?;
    let yr = reencrypt.g1_point(ctx)?;
    let z = ctx.bn254().scalar(buyer_secret.value());
    let shared = (yr.into_group() - yg * z).into_affine();
    Ok(unmask(cipher, &shared))
}
