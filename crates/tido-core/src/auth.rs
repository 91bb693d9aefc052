//! Authentication gate
//!
//! Remote-backed fetch and observation are scoped to an owner identity, and
//! nothing remote may run before sign-in succeeds. The gate is explicit: a
//! [`Session`] value is the proof of authentication, and the remote layer
//! only accepts sessions, never raw strings.
//!
//! Credentials are a single owner key stored under the data directory. On a
//! first device `sign_up` creates a fresh key; additional devices adopt the
//! existing key with `sign_in_as`.

use std::fs;
use std::path::PathBuf;

use uuid::Uuid;

use crate::config::Config;
use crate::error::{AuthError, AuthResult};

/// The authenticated user's unique identifier
///
/// Scopes the remote collection: every record lives under exactly one owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnerId(String);

impl OwnerId {
    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OwnerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OwnerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Proof of a successful sign-in
#[derive(Debug, Clone)]
pub struct Session {
    owner: OwnerId,
}

impl Session {
    /// The owner identity this session authenticates
    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    #[cfg(test)]
    pub(crate) fn for_owner(owner: OwnerId) -> Self {
        Self { owner }
    }
}

/// Credential storage and sign-in
pub struct Auth {
    config: Config,
}

impl Auth {
    /// Create an auth manager with default configuration
    pub fn new() -> anyhow::Result<Self> {
        let config = Config::load()?;
        Ok(Self::with_config(config))
    }

    /// Create an auth manager with a specific configuration
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Whether credentials are stored
    pub fn is_signed_in(&self) -> bool {
        self.credentials_path().exists()
    }

    /// The data directory credentials live under (for display purposes)
    pub fn data_dir(&self) -> &PathBuf {
        &self.config.data_dir
    }

    /// Create a new owner identity and sign in
    ///
    /// Errors if credentials already exist.
    pub fn sign_up(&self) -> AuthResult<Session> {
        if let Some(owner) = self.stored_owner()? {
            return Err(AuthError::AlreadySignedIn {
                owner: owner.0,
            });
        }
        let owner = OwnerId(Uuid::new_v4().to_string());
        self.store_owner(&owner)?;
        Ok(Session { owner })
    }

    /// Adopt an existing owner identity (additional device) and sign in
    ///
    /// Errors if credentials already exist.
    pub fn sign_in_as(&self, owner: OwnerId) -> AuthResult<Session> {
        if let Some(existing) = self.stored_owner()? {
            return Err(AuthError::AlreadySignedIn {
                owner: existing.0,
            });
        }
        self.store_owner(&owner)?;
        Ok(Session { owner })
    }

    /// Sign in with the stored credentials
    ///
    /// `AuthError::NotSignedIn` when none are stored. A failure here must
    /// tear down the consuming UI; there is no retry loop.
    pub fn sign_in(&self) -> AuthResult<Session> {
        match self.stored_owner()? {
            Some(owner) => Ok(Session { owner }),
            None => Err(AuthError::NotSignedIn),
        }
    }

    /// Remove stored credentials; safe when not signed in
    pub fn sign_out(&self) -> AuthResult<()> {
        let path = self.credentials_path();
        if path.exists() {
            fs::remove_file(&path).map_err(|source| AuthError::Storage { path, source })?;
        }
        Ok(())
    }

    fn credentials_path(&self) -> PathBuf {
        self.config.credentials_path()
    }

    fn stored_owner(&self) -> AuthResult<Option<OwnerId>> {
        let path = self.credentials_path();
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|source| AuthError::Storage {
            path: path.clone(),
            source,
        })?;
        let key = content.trim();
        if key.is_empty() {
            return Err(AuthError::InvalidCredentials {
                path,
                details: "empty owner key".to_string(),
            });
        }
        Ok(Some(OwnerId(key.to_string())))
    }

    fn store_owner(&self, owner: &OwnerId) -> AuthResult<()> {
        let path = self.credentials_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| AuthError::Storage {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, format!("{}\n", owner.0))
            .map_err(|source| AuthError::Storage { path, source })
    }
}
