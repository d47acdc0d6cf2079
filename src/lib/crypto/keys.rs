use alloy::primitives::{keccak256, U256};

use super::context::CryptoContext;
use crate::domain::keys::{BabyjubPublicKey, Secret};

/// Bytes of the keccak digest kept as the secret.
///
/// Keys in circulation are the first 58 hex digits of the digest, i.e. 232
/// bits. That is below both the BabyJubjub subgroup order and the BN254 scalar
/// field, so no reduction ever applies.
pub const SECRET_BYTES: usize = 29;

/// Derive a secret scalar from a passphrase: truncated `keccak256(utf8(passphrase))`.
pub fn make_key(passphrase: &str) -> Secret {
    let digest = keccak256(passphrase.as_bytes());
    Secret::new(U256::from_be_slice(&digest[..SECRET_BYTES]))
}

/// `secret · Base8` on BabyJubjub.
pub fn secret_to_public(ctx: &CryptoContext, secret: &Secret) -> BabyjubPublicKey {
    let bj = ctx.babyjub();
    BabyjubPublicKey::from_point(&bj.mul(&bj.base8(), secret.value()))
}
