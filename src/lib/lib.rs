//! Data transfer proofs.
//!
//! A provider hands a content key to a buyer through an escrow together with a
//! publicly checkable proof that the value is a correct, buyer-specific
//! encryption of a secret committed at publish time. Two proof schemes are
//! supported:
//!
//! - [`scheme::SnarkScheme`]: MiMC-sponge encryption under a BabyJubjub ECDH key,
//!   proven with an external PLONK prover (`snarkjs`).
//! - [`scheme::DleqScheme`]: proxy re-encryption on BN254 G1 with a
//!   Chaum-Pedersen proof bound to the agreement label.

pub mod adapters;
pub mod config;
pub mod crypto;
pub mod domain;
pub mod dtp;
pub mod error;
pub mod ports;
pub mod scheme;

pub use crypto::context::CryptoContext;
pub use error::DtpError;
