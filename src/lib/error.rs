use crate::config::ConfigError;
use crate::crypto::babyjub::PointError;
use crate::crypto::dleq::DleqError;
use crate::crypto::field::EncodingError;
use crate::crypto::mimc::MimcError;
use crate::crypto::signature::SignatureError;
use crate::domain::witness::WitnessError;
use crate::ports::assets::AssetError;
use crate::ports::escrow::EscrowError;
use crate::ports::prover::ProverError;

/// Crate-level error taxonomy. Every cryptographic check fails closed into one
/// of these; nothing degrades to a weaker result.
#[derive(Debug, thiserror::Error)]
pub enum DtpError {
    #[error("invalid curve point: {0}")]
    InvalidCurvePoint(#[from] PointError),

    #[error("scalar out of range: {0}")]
    InvalidScalarRange(String),

    #[error("proof verification failed: {0}")]
    ProofVerificationFailed(String),

    #[error("proof generation failed: {0}")]
    ProofGenerationFailed(String),

    #[error("external dependency error: {0}")]
    ExternalDependencyError(String),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl DtpError {
    /// Escrow, RPC and asset-resolution failures may succeed on retry;
    /// cryptographic failures never do.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DtpError::ExternalDependencyError(_))
    }
}

impl From<EncodingError> for DtpError {
    fn from(e: EncodingError) -> Self {
        DtpError::InvalidScalarRange(e.to_string())
    }
}

impl From<MimcError> for DtpError {
    fn from(e: MimcError) -> Self {
        DtpError::InvalidScalarRange(e.to_string())
    }
}

impl From<SignatureError> for DtpError {
    fn from(e: SignatureError) -> Self {
        match e {
            SignatureError::Point(p) => DtpError::InvalidCurvePoint(p),
            SignatureError::ScalarRange => DtpError::InvalidScalarRange(e.to_string()),
            SignatureError::Mismatch => DtpError::ProofVerificationFailed(e.to_string()),
        }
    }
}

impl From<DleqError> for DtpError {
    fn from(e: DleqError) -> Self {
        match e {
            DleqError::Point(p) => DtpError::InvalidCurvePoint(p),
            DleqError::Scalar(s) => s.into(),
            DleqError::ChallengeMismatch => DtpError::ProofVerificationFailed(e.to_string()),
        }
    }
}

impl From<WitnessError> for DtpError {
    fn from(e: WitnessError) -> Self {
        match e {
            WitnessError::Point(p) => DtpError::InvalidCurvePoint(p),
            other => DtpError::ProofGenerationFailed(other.to_string()),
        }
    }
}

impl From<ProverError> for DtpError {
    fn from(e: ProverError) -> Self {
        DtpError::ProofGenerationFailed(e.to_string())
    }
}

impl From<EscrowError> for DtpError {
    fn from(e: EscrowError) -> Self {
        match e {
            EscrowError::Rejected(_) => DtpError::ProofVerificationFailed(e.to_string()),
            other => DtpError::ExternalDependencyError(other.to_string()),
        }
    }
}

impl From<AssetError> for DtpError {
    fn from(e: AssetError) -> Self {
        DtpError::ExternalDependencyError(e.to_string())
    }
}
