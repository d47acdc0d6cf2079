use alloy::primitives::U256;
use ark_bn254::Fr;
use light_poseidon::{Poseidon, PoseidonHasher};

use super::field::{field_to_u256, u256_to_field_reduced};
use crate::domain::cipher::PlaintextBlock;

fn hash_fields(inputs: &[Fr]) -> Fr {
    let mut hasher =
        Poseidon::<Fr>::new_circom(inputs.len()).expect("Failed to create Poseidon hasher");
    hasher
        .hash(inputs)
        .expect("Failed to compute Poseidon hash")
}

/// Poseidon hash with 2 inputs (plaintext commitment).
pub fn poseidon2(a: Fr, b: Fr) -> Fr {
    hash_fields(&[a, b])
}

/// Poseidon hash with 5 inputs (signature challenge).
pub fn poseidon5(a: Fr, b: Fr, c: Fr, d: Fr, e: Fr) -> Fr {
    hash_fields(&[a, b, c, d, e])
}

/// Commitment to a plaintext block: `Poseidon(left, right)` over its 128-bit halves.
pub fn hash_block(data: &PlaintextBlock) -> U256 {
    let (left, right) = data.split();
    field_to_u256(poseidon2(
        u256_to_field_reduced(left),
        u256_to_field_reduced(right),
    ))
}
