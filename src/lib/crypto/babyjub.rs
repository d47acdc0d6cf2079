use alloy::primitives::{uint, U256};
use ark_bn254::Fr;
use ark_ff::{Field, MontFp, One, Zero};

use super::field::{field_to_u256, u256_to_field, EncodingError};

/// Twisted Edwards coefficient `a` of BabyJubjub (circomlib form).
const COEFF_A: Fr = MontFp!("168700");
/// Twisted Edwards coefficient `d` of BabyJubjub (circomlib form).
const COEFF_D: Fr = MontFp!("168696");

/// Generator of the prime-order subgroup (circomlib `Base8`).
const BASE8_X: Fr =
    MontFp!("5299619240641551281634865583518297030282874472190772894086521144482721001553");
const BASE8_Y: Fr =
    MontFp!("16950150798460657717958625567821834550301663161624707787222815936182638968203");

/// Order of the prime-order subgroup generated by `Base8`.
pub const SUB_ORDER: U256 =
    uint!(2736030358979909402780800718157159386076813972158567259200215660948447373041_U256);

/// An affine BabyJubjub point.
///
/// Coordinates are elements of the BN254 scalar field. Values built through
/// [`BabyJubjub::point`] are guaranteed to lie on the curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BabyJubPoint {
    x: Fr,
    y: Fr,
}

impl BabyJubPoint {
    /// The neutral element `(0, 1)`.
    pub fn identity() -> Self {
        Self {
            x: Fr::zero(),
            y: Fr::one(),
        }
    }

    pub fn x(&self) -> Fr {
        self.x
    }

    pub fn y(&self) -> Fr {
        self.y
    }

    /// Coordinates as integers `(x, y)`.
    pub fn to_u256(&self) -> (U256, U256) {
        (field_to_u256(self.x), field_to_u256(self.y))
    }

    pub fn is_identity(&self) -> bool {
        self.x.is_zero() && self.y.is_one()
    }
}

/// Extended projective coordinates `(X : Y : Z)` with `x = X/Z`, `y = Y/Z`.
#[derive(Debug, Clone, Copy)]
struct Projective {
    x: Fr,
    y: Fr,
    z: Fr,
}

impl From<BabyJubPoint> for Projective {
    fn from(p: BabyJubPoint) -> Self {
        Self {
            x: p.x,
            y: p.y,
            z: Fr::one(),
        }
    }
}

/// BabyJubjub curve parameters and group law.
///
/// `a·x² + y² = 1 + d·x²·y²` over the BN254 scalar field. The addition law is
/// complete (a is a square, d is not), so no input on the curve hits a zero
/// denominator.
#[derive(Debug, Clone)]
pub struct BabyJubjub {
    base8: BabyJubPoint,
}

impl BabyJubjub {
    pub(crate) fn new() -> Self {
        Self {
            base8: BabyJubPoint {
                x: BASE8_X,
                y: BASE8_Y,
            },
        }
    }

    /// The prime-order generator `Base8`.
    pub fn base8(&self) -> BabyJubPoint {
        self.base8
    }

    /// Build a point from wire coordinates, rejecting non-canonical or off-curve values.
    ///
    /// Subgroup membership is not checked here; see [`BabyJubjub::in_subgroup`].
    pub fn point(&self, x: U256, y: U256) -> Result<BabyJubPoint, PointError> {
        let x: Fr = u256_to_field(x)?;
        let y: Fr = u256_to_field(y)?;
        let p = BabyJubPoint { x, y };
        if !self.in_curve(&p) {
            return Err(PointError::NotOnCurve);
        }
        Ok(p)
    }

    /// Like [`BabyJubjub::point`], additionally requiring membership of the prime-order subgroup.
    pub fn subgroup_point(&self, x: U256, y: U256) -> Result<BabyJubPoint, PointError> {
        let p = self.point(x, y)?;
        if !self.in_subgroup(&p) {
            return Err(PointError::NotInSubgroup);
        }
        Ok(p)
    }

    pub fn in_curve(&self, p: &BabyJubPoint) -> bool {
        let x2 = p.x.square();
        let y2 = p.y.square();
        COEFF_A * x2 + y2 == Fr::one() + COEFF_D * x2 * y2
    }

    pub fn in_subgroup(&self, p: &BabyJubPoint) -> bool {
        self.in_curve(p) && self.mul(p, SUB_ORDER).is_identity()
    }

    pub fn add(&self, p: &BabyJubPoint, q: &BabyJubPoint) -> BabyJubPoint {
        self.to_affine(add_projective(&(*p).into(), &(*q).into()))
    }

    pub fn negate(&self, p: &BabyJubPoint) -> BabyJubPoint {
        BabyJubPoint { x: -p.x, y: p.y }
    }

    /// Multiply by an unreduced integer scalar (double-and-add, most significant bit first).
    pub fn mul(&self, p: &BabyJubPoint, k: U256) -> BabyJubPoint {
        let base = Projective::from(*p);
        let mut acc = Projective::from(BabyJubPoint::identity());
        for i in (0..k.bit_len()).rev() {
            acc = add_projective(&acc, &acc);
            if k.bit(i) {
                acc = add_projective(&acc, &base);
            }
        }
        self.to_affine(acc)
    }

    /// Multiply by the cofactor 8.
    pub fn mul_cofactor(&self, p: &BabyJubPoint) -> BabyJubPoint {
        let mut acc = Projective::from(*p);
        for _ in 0..3 {
            acc = add_projective(&acc, &acc);
        }
        self.to_affine(acc)
    }

    fn to_affine(&self, p: Projective) -> BabyJubPoint {
        let z_inv = p
            .z
            .inverse()
            .expect("projective Z is non-zero for points on the curve");
        BabyJubPoint {
            x: p.x * z_inv,
            y: p.y * z_inv,
        }
    }
}

/// Unified projective addition (add-2008-bbjlp); also used for doubling.
fn add_projective(p: &Projective, q: &Projective) -> Projective {
    let a = p.z * q.z;
    let b = a.square();
    let c = p.x * q.x;
    let d = p.y * q.y;
    let e = COEFF_D * c * d;
    let f = b - e;
    let g = b + e;
    let x3 = a * f * ((p.x + p.y) * (q.x + q.y) - c - d);
    let y3 = a * g * (d - COEFF_A * c);
    let z3 = f * g;
    Projective {
        x: x3,
        y: y3,
        z: z3,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PointError {
    #[error("coordinate encoding: {0}")]
    Encoding(#[from] EncodingError),

    #[error("point is not on the curve")]
    NotOnCurve,

    #[error("point is not in the prime-order subgroup")]
    NotInSubgroup,

    #[error("point is the identity")]
    Identity,
}
