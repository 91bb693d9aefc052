//! Typed errors for the remote and authentication seams
//!
//! Store mutations never fail (missing targets are silent no-ops), so only
//! the remote collection and the sign-in gate carry error types. Composing
//! code wraps these with `anyhow` context.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from the remote collection
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Could not reach the remote server
    #[error("Failed to connect to '{url}': {details}")]
    Connect { url: String, details: String },

    /// Server closed or the connection dropped mid-operation
    #[error("Connection to remote closed: {0}")]
    ConnectionClosed(String),

    /// Server did not complete the handshake in time
    #[error("Timeout waiting for remote server ({url}). Check that the server is running.")]
    HandshakeTimeout { url: String },

    /// Server rejected an operation
    #[error("Remote rejected operation: {0}")]
    Rejected(String),
}

/// Result type for remote operations
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors from the authentication gate
#[derive(Error, Debug)]
pub enum AuthError {
    /// No stored credentials; sign-up or sign-in-as is required first
    #[error("Not signed in. Run `tido signup` to create an identity.")]
    NotSignedIn,

    /// Credentials already exist
    #[error("Already signed in as '{owner}'. Run `tido logout` first.")]
    AlreadySignedIn { owner: String },

    /// Stored credentials could not be read or are unusable
    #[error("Invalid credentials at '{path}': {details}")]
    InvalidCredentials { path: PathBuf, details: String },

    /// Failed to read or write the credentials file
    #[error("Credential storage error at '{path}': {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_display() {
        let err = RemoteError::Connect {
            url: "ws://localhost:4040".to_string(),
            details: "refused".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ws://localhost:4040"));
        assert!(msg.contains("refused"));
    }

    #[test]
    fn test_auth_error_display() {
        let err = AuthError::AlreadySignedIn {
            owner: "owner-1".to_string(),
        };
        assert!(err.to_string().contains("owner-1"));

        let err = AuthError::NotSignedIn;
        assert!(err.to_string().contains("signup"));
    }
}
