//! Persisted addresses of the deployed wallet infrastructure, one JSON document per network.

use std::{
    fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Errors raised when loading or saving a [`NetworkConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No configuration exists for the network, i.e. the infrastructure is not deployed there.
    #[error("no infrastructure deployed: {} does not exist", .0.display())]
    NotDeployed(PathBuf),

    /// Reading or writing the file failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file is not a valid configuration.
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Addresses of the contracts deployed on one network.
///
/// Every key is required: a document missing any of them fails to load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    /// The account implementation behind every proxy.
    pub implementation: Address,
    /// The proxy factory.
    pub factory: Address,
    /// An account used for dry runs.
    pub dummy_account: Address,
    /// A test destination contract.
    pub test_dapp: Address,
    /// The sponsor contract.
    pub paymaster: Address,
}

impl NetworkConfig {
    /// Returns the path of the document of `network` in `dir`.
    pub fn path(dir: impl AsRef<Path>, network: &str) -> PathBuf {
        dir.as_ref().join(format!("{network}.json"))
    }

    /// Loads the configuration of `network` from `dir`.
    ///
    /// A missing document fails with [`ConfigError::NotDeployed`].
    pub fn load(dir: impl AsRef<Path>, network: &str) -> Result<Self, ConfigError> {
        let path = Self::path(dir, network);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(ConfigError::NotDeployed(path))
            }
            Err(err) => return Err(err.into()),
        };
        let config = serde_json::from_str(&contents)?;
        debug!(path = %path.display(), "Loaded network configuration");
        Ok(config)
    }

    /// Saves the configuration of `network` to `dir`, replacing any previous document.
    ///
    /// The document is written to a temporary file in `dir` and renamed into place, so readers
    /// see either the previous or the new document.
    pub fn save(&self, dir: impl AsRef<Path>, network: &str) -> Result<PathBuf, ConfigError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = Self::path(dir, network);

        let mut file = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(file.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, self)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        file.persist(&path).map_err(|err| err.error)?;

        info!(path = %path.display(), "Saved network configuration");
        Ok(path)
    }
}
