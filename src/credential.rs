use std::path::Path;

use crate::error::TtsError;

/// Raw bytes of a service-account descriptor.
///
/// The pipeline never interprets these bytes itself; parsing is left to the
/// synthesis engine that consumes them.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(Vec<u8>);

impl Credential {
    /// Read the credential file at `path`.
    ///
    /// An empty path is rejected with [`TtsError::MissingCredential`] before
    /// any filesystem access.
    pub fn load(path: &str) -> Result<Self, TtsError> {
        if path.is_empty() {
            return Err(TtsError::MissingCredential);
        }
        let bytes = std::fs::read(path).map_err(|source| TtsError::CredentialRead {
            path: Path::new(path).to_path_buf(),
            source,
        })?;
        log::debug!("Read {} credential bytes from {path}", bytes.len());
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Credential {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

// Credentials carry private keys; keep them out of logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credential({} bytes)", self.0.len())
    }
}
