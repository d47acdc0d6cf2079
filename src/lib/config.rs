use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::crypto::babyjub::SUB_ORDER;
use crate::domain::keys::Secret;

/// Circuit file names inside the circuits directory.
pub const WASM_FILE: &str = "keytransfer.wasm";
pub const ZKEY_FILE: &str = "keytransfer.zkey";
pub const VKEY_FILE: &str = "verification_key.json";

const DEFAULT_SNARKJS: &str = "snarkjs";

/// Top-level configuration loaded from TOML.
#[derive(Debug, Deserialize)]
pub struct DtpConfig {
    pub circuits: CircuitsConfig,
    pub provider: Option<ProviderConfig>,
}

/// Where the compiled key-transfer circuit lives and how to run the prover.
#[derive(Debug, Deserialize)]
pub struct CircuitsConfig {
    pub dir: PathBuf,
    /// `snarkjs` binary name or path. Defaults to `snarkjs` on `PATH`.
    pub snarkjs: Option<String>,
}

/// Provider identity. Absent on buyer-only nodes.
#[derive(Debug, Deserialize)]
pub struct ProviderConfig {
    /// Hex (`0x`) or decimal.
    pub secret: String,
}

/// Errors from config loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl DtpConfig {
    /// Load and validate a config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.circuits.dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation("circuits.dir must not be empty".into()));
        }
        if let Some(bin) = &self.circuits.snarkjs {
            if bin.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "circuits.snarkjs must not be empty when set".into(),
                ));
            }
        }
        if self.provider.is_some() {
            self.provider_secret()?;
        }
        Ok(())
    }

    pub fn artifacts(&self) -> CircuitArtifacts {
        CircuitArtifacts::from_dir(&self.circuits.dir)
    }

    pub fn snarkjs_bin(&self) -> &str {
        self.circuits.snarkjs.as_deref().unwrap_or(DEFAULT_SNARKJS)
    }

    /// The configured provider secret, if any.
    pub fn provider_secret(&self) -> Result<Option<Secret>, ConfigError> {
        let Some(provider) = &self.provider else {
            return Ok(None);
        };
        let secret = Secret::parse(&provider.secret)
            .map_err(|e| ConfigError::Validation(format!("provider.secret: {e}")))?;
        if secret.value().is_zero() || secret.value() >= SUB_ORDER {
            return Err(ConfigError::Validation(
                "provider.secret must be in [1, l) for the BabyJubjub subgroup order l".into(),
            ));
        }
        Ok(Some(secret))
    }
}

/// Paths of the compiled key-transfer circuit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitArtifacts {
    pub wasm: PathBuf,
    pub zkey: PathBuf,
    pub vkey: PathBuf,
}

impl CircuitArtifacts {
    pub fn from_dir(dir: &Path) -> Self {
        Self {
            wasm: dir.join(WASM_FILE),
            zkey: dir.join(ZKEY_FILE),
            vkey: dir.join(VKEY_FILE),
        }
    }

    /// First artifact that does not exist, if any.
    pub fn missing(&self) -> Option<&Path> {
        [&self.wasm, &self.zkey, &self.vkey]
            .into_iter()
            .find(|p| !p.exists())
            .map(PathBuf::as_path)
    }
}
