//! Password digests and the username -> digest lookup

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("failed to read credentials from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid credential file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// An argon2 password hash in PHC string form
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Hash `plaintext` with a fresh random salt
    pub fn generate(plaintext: &str) -> Result<Self, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| CredentialError::Hash(e.to_string()))?;
        Ok(Self(hash.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Verify `plaintext` against this digest. The comparison is argon2's
    /// constant-time check; a malformed digest never matches.
    pub fn matches(&self, plaintext: &str) -> bool {
        let parsed = match PasswordHash::new(&self.0) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Ignoring malformed password digest: {}", e);
                return false;
            }
        };

        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}

/// Source of stored password digests, keyed by username
pub trait CredentialSource: Send + Sync {
    fn lookup(&self, username: &str) -> Option<&PasswordDigest>;
}

/// Credentials loaded from a JSON object of `username: digest` pairs
#[derive(Debug, Clone, Default)]
pub struct CredentialFile {
    users: HashMap<String, PasswordDigest>,
}

impl CredentialFile {
    /// Load credentials from `path`. A missing file yields no users.
    pub fn load(path: &Path) -> Result<Self, CredentialError> {
        if !path.exists() {
            tracing::warn!(
                "Credential file {} not found; nobody can sign in",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| CredentialError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let users: HashMap<String, PasswordDigest> =
            serde_json::from_str(&content).map_err(|source| CredentialError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::info!("Loaded {} user(s) from {}", users.len(), path.display());
        Ok(Self { users })
    }
}

impl FromIterator<(String, PasswordDigest)> for CredentialFile {
    fn from_iter<I: IntoIterator<Item = (String, PasswordDigest)>>(iter: I) -> Self {
        Self {
            users: iter.into_iter().collect(),
        }
    }
}

impl CredentialSource for CredentialFile {
    fn lookup(&self, username: &str) -> Option<&PasswordDigest> {
        self.users.get(username)
    }
}
