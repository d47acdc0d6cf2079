use std::sync::Arc;

use once_cell::sync::Lazy;

use super::babyjub::BabyJubjub;
use super::bn254::Bn254Group;
use super::mimc::MimcSponge;

static SHARED: Lazy<Arc<CryptoContext>> = Lazy::new(|| Arc::new(CryptoContext::new()));

/// Immutable curve and cipher parameters.
///
/// Building the MiMC round constants costs a few hundred keccak calls, so one
/// context is normally built per process and handed to every operation.
#[derive(Debug, Clone)]
pub struct CryptoContext {
    babyjub: BabyJubjub,
    mimc: MimcSponge,
    bn254: Bn254Group,
}

impl CryptoContext {
    pub fn new() -> Self {
        Self {
            babyjub: BabyJubjub::new(),
            mimc: MimcSponge::new(),
            bn254: Bn254Group::new(),
        }
    }

    /// The process-wide context, built on first use.
    pub fn shared() -> Arc<CryptoContext> {
        Arc::clone(&SHARED)
    }

    pub fn babyjub(&self) -> &BabyJubjub {
        &self.babyjub
    }

    pub fn mimc(&self) -> &MimcSponge {
        &self.mimc
    }

    pub fn bn254(&self) -> &Bn254Group {
        &self.bn254
    }
}

impl Default for CryptoContext {
    fn default() -> Self {
        Self::new()
    }
}
