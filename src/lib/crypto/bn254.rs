use alloy::primitives::U256;
use ark_bn254::{Fq, Fr, G1Affine};
use ark_ec::{AffineRepr, CurveGroup};

use super::babyjub::PointError;
use super::field::{field_to_u256, u256_to_field, u256_to_field_reduced};

/// BN254 G1, the group the DLEQ re-encryption path works in.
#[derive(Debug, Clone)]
pub struct Bn254Group {
    generator: G1Affine,
}

impl Bn254Group {
    pub(crate) fn new() -> Self {
        Self {
            generator: G1Affine::generator(),
        }
    }

    /// The generator `(1, 2)`.
    pub fn generator(&self) -> G1Affine {
        self.generator
    }

    /// Reduce an integer into the G1 scalar field.
    pub fn scalar(&self, value: U256) -> Fr {
        u256_to_field_reduced(value)
    }

    pub fn mul_generator(&self, k: &Fr) -> G1Affine {
        (self.generator * k).into_affine()
    }

    /// Decode wire coordinates. `(0, 0)` is the point at infinity.
    pub fn point(&self, x: U256, y: U256) -> Result<G1Affine, PointError> {
        if x.is_zero() && y.is_zero() {
            return Ok(G1Affine::identity());
        }
        let x: Fq = u256_to_field(x)?;
        let y: Fq = u256_to_field(y)?;
        let p = G1Affine::new_unchecked(x, y);
        if !p.is_on_curve() {
            return Err(PointError::NotOnCurve);
        }
        if !p.is_in_correct_subgroup_assuming_on_curve() {
            return Err(PointError::NotInSubgroup);
        }
        Ok(p)
    }

    /// Decode a point used as a public key; the identity is rejected.
    pub fn public_point(&self, x: U256, y: U256) -> Result<G1Affine, PointError> {
        let p = self.point(x, y)?;
        if p.is_zero() {
            return Err(PointError::Identity);
        }
        Ok(p)
    }
}

/// Wire coordinates of a G1 point; infinity encodes as `(0, 0)`.
pub fn point_to_u256(p: &G1Affine) -> (U256, U256) {
    if p.is_zero() {
        return (U256::ZERO, U256::ZERO);
    }
    (field_to_u256(p.x), field_to_u256(p.y))
}
