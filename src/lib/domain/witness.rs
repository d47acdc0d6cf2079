use std::fmt;

use alloy::primitives::U256;

use super::cipher::{MimcCipher, PlaintextBlock};
use super::keys::{BabyjubPublicKey, Secret};
use super::proof::KEY_TRANSFER_SIGNALS;
use crate::crypto::babyjub::PointError;
use crate::crypto::context::CryptoContext;
use crate::crypto::ecdh::ecdh;
use crate::crypto::keys::secret_to_public;
use crate::crypto::poseidon::hash_block;

/// Witness (public + private inputs) for the key-transfer circuit.
///
/// Field names follow the circuit's signal names.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyTransferWitness {
    // === Private Inputs ===
    /// Left 128-bit half of the plaintext
    pub xl_in: U256,
    /// Right 128-bit half of the plaintext
    pub xr_in: U256,
    /// Provider's BabyJubjub secret
    pub provider_k: Secret,

    // === Public Inputs ===
    pub buyer_x: U256,
    pub buyer_y: U256,
    pub provider_x: U256,
    pub provider_y: U256,
    pub cipher_xl_in: U256,
    pub cipher_xr_in: U256,
    /// Poseidon commitment to the plaintext
    pub hash_plain: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WitnessError {
    #[error("witness point: {0}")]
    Point(#[from] PointError),

    #[error("plaintext half exceeds 128 bits")]
    PlaintextRange,

    #[error("provider key does not match provider_k")]
    ProviderKeyMismatch,

    #[error("ciphertext is not the encryption of the plaintext under the shared key")]
    CipherMismatch,

    #[error("hash_plain does not commit to the plaintext")]
    HashMismatch,
}

impl KeyTransferWitness {
    /// Build the witness: derive the shared key, encrypt, commit.
    pub fn new(
        ctx: &CryptoContext,
        buyer_pub: &BabyjubPublicKey,
        provider_pub: &BabyjubPublicKey,
        provider_k: &Secret,
        data: &PlaintextBlock,
    ) -> Result<Self, PointError> {
        let k = ecdh(ctx, provider_k, buyer_pub)?;
        let cipher = ctx.mimc().encrypt(data, k);
        let (xl_in, xr_in) = data.split();
        Ok(Self {
            xl_in,
            xr_in,
            provider_k: *provider_k,
            buyer_x: buyer_pub.x,
            buyer_y: buyer_pub.y,
            provider_x: provider_pub.x,
            provider_y: provider_pub.y,
            cipher_xl_in: cipher.xl,
            cipher_xr_in: cipher.xr,
            hash_plain: hash_block(data),
        })
    }

    pub fn buyer(&self) -> BabyjubPublicKey {
        BabyjubPublicKey::new(self.buyer_x, self.buyer_y)
    }

    pub fn provider(&self) -> BabyjubPublicKey {
        BabyjubPublicKey::new(self.provider_x, self.provider_y)
    }

    pub fn cipher(&self) -> MimcCipher {
        MimcCipher::new(self.cipher_xl_in, self.cipher_xr_in)
    }

    /// Public signals in circuit order.
    pub fn public_signals(&self) -> [U256; KEY_TRANSFER_SIGNALS] {
        [
            self.buyer_x,
            self.buyer_y,
            self.provider_x,
            self.provider_y,
            self.cipher_xl_in,
            self.cipher_xr_in,
            self.hash_plain,
        ]
    }

    /// Recompute every relation the circuit enforces.
    pub fn check(&self, ctx: &CryptoContext) -> Result<(), WitnessError> {
        let data =
            PlaintextBlock::join(self.xl_in, self.xr_in).ok_or(WitnessError::PlaintextRange)?;
        self.provider().point(ctx)?;
        if secret_to_public(ctx, &self.provider_k) != self.provider() {
            return Err(WitnessError::ProviderKeyMismatch);
        }
        let k = ecdh(ctx, &self.provider_k, &self.buyer())?;
        if ctx.mimc().encrypt(&data, k) != self.cipher() {
            return Err(WitnessError::CipherMismatch);
        }
        if hash_block(&data) != self.hash_plain {
            return Err(WitnessError::HashMismatch);
        }
        Ok(())
    }
}

// Private inputs stay out of logs.
impl fmt::Debug for KeyTransferWitness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyTransferWitness")
            .field("public_signals", &self.public_signals())
            .finish_non_exhaustive()
    }
}
