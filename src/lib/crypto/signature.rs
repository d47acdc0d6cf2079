use alloy::primitives::U256;
use ark_bn254::Fr;

use super::babyjub::{BabyJubPoint, PointError, SUB_ORDER};
use super::context::CryptoContext;
use super::field::{field_to_u256, u256_to_field_reduced};
use super::keys::make_key;
use super::poseidon::poseidon5;
use crate::domain::keys::{BabyjubPublicKey, Babysig};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("signature point: {0}")]
    Point(#[from] PointError),

    #[error("S is not below the subgroup order")]
    ScalarRange,

    #[error("signature equation does not hold")]
    Mismatch,
}

fn challenge(r8: &BabyJubPoint, a: &BabyJubPoint, msg: U256) -> U256 {
    field_to_u256(poseidon5(
        r8.x(),
        r8.y(),
        a.x(),
        a.y(),
        u256_to_field_reduced::<Fr>(msg),
    ))
}

/// Sign `msg` with the key derived from `passphrase`.
///
/// The nonce is `makeKey(passphrase ++ "a") mod l`, so signing the same
/// message twice yields the same signature.
pub fn sign(ctx: &CryptoContext, passphrase: &str, msg: U256) -> Babysig {
    let bj = ctx.babyjub();
    let base8 = bj.base8();

    let r = make_key(&format!("{passphrase}a")).value() % SUB_ORDER;
    let s = make_key(passphrase).value();
    let r8 = bj.mul(&base8, r);
    let a = bj.mul(&base8, s);

    let hm = challenge(&r8, &a, msg);
    let big_s = r.add_mod(hm.mul_mod(s, SUB_ORDER), SUB_ORDER);

    let (rx, ry) = r8.to_u256();
    Babysig {
        r8: [rx, ry],
        s: big_s,
    }
}

/// Check `8·S·Base8 == 8·R8 + 8·hm·A`, reporting why a signature is rejected.
pub fn check(
    ctx: &CryptoContext,
    public: &BabyjubPublicKey,
    msg: U256,
    sig: &Babysig,
) -> Result<(), SignatureError> {
    let bj = ctx.babyjub();
    let r8 = bj.subgroup_point(sig.r8[0], sig.r8[1])?;
    let a = public.point(ctx)?;
    if sig.s >= SUB_ORDER {
        return Err(SignatureError::ScalarRange);
    }

    let hm = challenge(&r8, &a, msg);
    let left = bj.mul_cofactor(&bj.mul(&bj.base8(), sig.s));
    let right = bj.mul_cofactor(&bj.add(&r8, &bj.mul(&a, hm)));
    if left != right {
        return Err(SignatureError::Mismatch);
    }
    Ok(())
}

pub fn verify(ctx: &CryptoContext, public: &BabyjubPublicKey, msg: U256, sig: &Babysig) -> bool {
    check(ctx, public, msg, sig).is_ok()
}
