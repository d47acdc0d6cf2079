use std::fmt;

use alloy::primitives::U256;
use ark_bn254::G1Affine;
use serde::{Deserialize, Serialize};

use crate::crypto::babyjub::{BabyJubPoint, PointError};
use crate::crypto::context::CryptoContext;
use crate::crypto::field::{hex_u256, hex_u256_pair, parse_scalar, to_hex, EncodingError};
use crate::crypto::keys::{make_key, secret_to_public};

/// A private scalar derived from a passphrase.
///
/// `Debug` is redacted; use [`Secret::to_hex`] to export it deliberately.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Secret(U256);

impl Secret {
    pub fn new(value: U256) -> Self {
        Self(value)
    }

    /// See [`make_key`].
    pub fn from_passphrase(passphrase: &str) -> Self {
        make_key(passphrase)
    }

    /// Parse from `0x` hex or decimal.
    pub fn parse(s: &str) -> Result<Self, EncodingError> {
        parse_scalar(s).map(Self)
    }

    pub fn value(&self) -> U256 {
        self.0
    }

    pub fn to_hex(&self) -> String {
        to_hex(self.0)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(..)")
    }
}

/// Wire form of a public key: affine coordinates as 64-hex scalars.
///
/// Carries BabyJubjub keys on the SNARK path and BN254 G1 keys on the DLEQ
/// path; it is validated into the right group at use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BabyjubPublicKey {
    #[serde(with = "hex_u256")]
    pub x: U256,
    #[serde(with = "hex_u256")]
    pub y: U256,
}

impl BabyjubPublicKey {
    pub fn new(x: U256, y: U256) -> Self {
        Self { x, y }
    }

    pub fn from_point(p: &BabyJubPoint) -> Self {
        let (x, y) = p.to_u256();
        Self { x, y }
    }

    pub fn from_g1(p: &G1Affine) -> Self {
        let (x, y) = crate::crypto::bn254::point_to_u256(p);
        Self { x, y }
    }

    pub fn to_pair(&self) -> [U256; 2] {
        [self.x, self.y]
    }

    /// Validate as a BabyJubjub point in the prime-order subgroup.
    pub fn point(&self, ctx: &CryptoContext) -> Result<BabyJubPoint, PointError> {
        ctx.babyjub().subgroup_point(self.x, self.y)
    }

    /// Validate as a non-identity BN254 G1 point.
    pub fn g1_point(&self, ctx: &CryptoContext) -> Result<G1Affine, PointError> {
        ctx.bn254().public_point(self.x, self.y)
    }
}

/// A BabyJubjub signature `(R8, S)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Babysig {
    #[serde(rename = "R8", with = "hex_u256_pair")]
    pub r8: [U256; 2],
    #[serde(rename = "S", with = "hex_u256")]
    pub s: U256,
}

/// Passphrase-derived BabyJubjub identity.
#[derive(Clone)]
pub struct Account {
    passphrase: String,
    secret: Secret,
    public: BabyjubPublicKey,
}

impl Account {
    pub fn from_passphrase(ctx: &CryptoContext, passphrase: impl Into<String>) -> Self {
        let passphrase = passphrase.into();
        let secret = make_key(&passphrase);
        let public = secret_to_public(ctx, &secret);
        Self {
            passphrase,
            secret,
            public,
        }
    }

    /// The passphrase; signing derives its nonce from it.
    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    pub fn secret(&self) -> &Secret {
        &self.secret
    }

    pub fn public(&self) -> &BabyjubPublicKey {
        &self.public
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_debug_redacted() {
        let s = Secret::from_passphrase("abc");
        let dbg = format!("{s:?}");
        assert_eq!(dbg, "Secret(..)");
    }

    #[test]
    fn test_secret_parse_hex_and_decimal() {
        assert_eq!(Secret::parse("0x10").unwrap(), Secret::parse("16").unwrap());
        assert!(Secret::parse("nope").is_err());
    }

    #[test]
    fn test_account_matches_derivation() {
        let ctx = CryptoContext::shared();
        let acc = Account::from_passphrase(&ctx, "abc");
        assert_eq!(*acc.secret(), make_key("abc"));
        assert_eq!(*acc.public(), secret_to_public(&ctx, acc.secret()));
        assert!(acc.public().point(&ctx).is_ok());
        assert!(format!("{acc:?}").ends_with(", .. }"));
    }

    #[test]
    fn test_public_key_serde_leading_zeros() {
        let key = BabyjubPublicKey::new(U256::from(1u64), U256::from(0xabu64));
        let json = serde_json::to_string(&key).unwrap();
        assert!(json.contains("0x00000000000000000000000000000000000000000000000000000000000000ab"));
        let back: BabyjubPublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_babysig_serde_field_names() {
        let sig = Babysig {
            r8: [U256::from(1u64), U256::from(2u64)],
            s: U256::from(3u64),
        };
        let json = serde_json::to_value(sig).unwrap();
        assert!(json.get("R8").is_some());
        assert!(json.get("S").is_some());
        let back: Babysig = serde_json::from_value(json).unwrap();
        assert_eq!(back, sig);
    }
}
