use alloy::primitives::{keccak256, U256};
use ark_bn254::Fr;
use ark_ff::{Field, PrimeField, Zero};

use super::field::{field_to_u256, u256_to_field_reduced};
use crate::domain::cipher::{MimcCipher, PlaintextBlock};

/// Seed for the round-constant chain.
pub const SEED: &str = "mimcsponge";
/// Number of Feistel rounds.
pub const NROUNDS: usize = 220;

/// MiMC sponge permutation used as a symmetric cipher over two field elements.
///
/// Compatible with circomlib's `MiMCSponge(2, 220, 1)` template, so a ciphertext
/// produced here can be checked by the key-transfer circuit.
#[derive(Debug, Clone)]
pub struct MimcSponge {
    constants: Vec<Fr>,
}

impl MimcSponge {
    pub(crate) fn new() -> Self {
        Self {
            constants: round_constants(),
        }
    }

    pub fn constants(&self) -> &[Fr] {
        &self.constants
    }

    /// Run the forward permutation on `(xl, xr)` keyed by `k`.
    pub fn permute(&self, xl: Fr, xr: Fr, k: Fr) -> (Fr, Fr) {
        let (mut xl, mut xr) = (xl, xr);
        for (i, c) in self.constants.iter().enumerate() {
            let t = if i == 0 { xl + k } else { xl + k + c };
            let t5 = pow5(t);
            if i < NROUNDS - 1 {
                (xl, xr) = (xr + t5, xl);
            } else {
                xr += t5;
            }
        }
        (xl, xr)
    }

    /// Inverse of [`MimcSponge::permute`].
    pub fn invert(&self, xl: Fr, xr: Fr, k: Fr) -> (Fr, Fr) {
        let (mut xl, mut xr) = (xl, xr);
        for (i, c) in self.constants.iter().rev().enumerate() {
            let t = if i == 0 { xl + k } else { xl + k + c };
            let t5 = pow5(t);
            if i < NROUNDS - 1 {
                (xl, xr) = (xr - t5, xl);
            } else {
                xr -= t5;
            }
        }
        (xl, xr)
    }

    /// Encrypt a 32-byte block under a shared key.
    pub fn encrypt(&self, data: &PlaintextBlock, key: U256) -> MimcCipher {
        let (left, right) = data.split();
        let (xl, xr) = self.permute(
            u256_to_field_reduced(left),
            u256_to_field_reduced(right),
            u256_to_field_reduced(key),
        );
        MimcCipher::new(field_to_u256(xl), field_to_u256(xr))
    }

    /// Decrypt a ciphertext back to the 32-byte block.
    ///
    /// Fails if a recovered half does not fit in 128 bits, which is what a
    /// wrong key or a tampered ciphertext produces.
    pub fn decrypt(&self, cipher: &MimcCipher, key: U256) -> Result<PlaintextBlock, MimcError> {
        let (xl, xr) = self.invert(
            u256_to_field_reduced(cipher.xl),
            u256_to_field_reduced(cipher.xr),
            u256_to_field_reduced(key),
        );
        PlaintextBlock::join(field_to_u256(xl), field_to_u256(xr)).ok_or(MimcError::NonCanonicalBlock)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MimcError {
    #[error("decrypted halves exceed 128 bits (wrong key or corrupted ciphertext)")]
    NonCanonicalBlock,
}

fn pow5(t: Fr) -> Fr {
    let t2 = t.square();
    t2.square() * t
}

/// keccak256 chain seeded with [`SEED`]; first and last constants are zero.
fn round_constants() -> Vec<Fr> {
    let mut constants = vec![Fr::zero(); NROUNDS];
    let mut c = keccak256(SEED.as_bytes());
    for slot in constants.iter_mut().take(NROUNDS - 1).skip(1) {
        c = keccak256(c);
        *slot = Fr::from_be_bytes_mod_order(c.as_slice());
    }
    constants
}
