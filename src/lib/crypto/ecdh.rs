use alloy::primitives::U256;

use super::babyjub::PointError;
use super::context::CryptoContext;
use crate::domain::keys::{BabyjubPublicKey, Secret};

/// Shared key `(secret · peer).x` on BabyJubjub.
///
/// The peer key must be a subgroup point; anything else is rejected before
/// the multiplication.
pub fn ecdh(
    ctx: &CryptoContext,
    secret: &Secret,
    peer: &BabyjubPublicKey,
) -> Result<U256, PointError> {
    let bj = ctx.babyjub();
    let peer = peer.point(ctx)?;
    if peer.is_identity() {
        return Err(PointError::Identity);
    }
    let (x, _) = bj.mul(&peer, secret.value()).to_u256();
    Ok(x)
}
