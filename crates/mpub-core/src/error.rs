//! Error taxonomy for alias publishing, following the panic-free policy.
//!
//! Three families reach the user: bad input ([`PublishError::InvalidName`]),
//! an unreachable daemon ([`PublishError::Connection`]) and a daemon-side
//! rejection ([`PublishError::Registration`], [`PublishError::NameTaken`]).
//! All of them are fatal at startup.

use thiserror::Error;

use crate::name::NameError;

/// Errors raised while validating, connecting or publishing.
#[derive(Error, Debug, Clone)]
pub enum PublishError {
    /// A user-supplied alias failed validation.
    #[error(transparent)]
    InvalidName(#[from] NameError),

    /// No control-interface session could be established.
    #[error("Failed to connect to the mDNS daemon: {0}")]
    Connection(String),

    /// The daemon refused to publish an alias.
    #[error("Failed to publish '{name}': {reason}")]
    Registration { name: String, reason: String },

    /// The alias already resolves to another host.
    #[error("Failed to publish '{name}': already owned by '{owner}'")]
    NameTaken { name: String, owner: String },

    /// Withdrawing a published alias failed.
    #[error("Failed to withdraw '{name}': {reason}")]
    Release { name: String, reason: String },

    /// The host name reported by the daemon cannot be used as a CNAME target.
    #[error("Invalid CNAME target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },
}

impl PublishError {
    /// Shorthand for a [`PublishError::Registration`].
    pub fn registration(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Registration {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// True for errors raised by the daemon while publishing.
    pub fn is_registration(&self) -> bool {
        matches!(self, Self::Registration { .. } | Self::NameTaken { .. })
    }
}

/// Result type for publishing operations.
pub type PublishResult<T> = Result<T, PublishError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_name_is_transparent() {
        let err: PublishError = NameError::NotLocal {
            name: "printer.lan".to_string(),
        }
        .into();
        assert!(matches!(err, PublishError::InvalidName(_)));
        assert_eq!(
            err.to_string(),
            "invalid alias 'printer.lan': must end with '.local'"
        );
    }

    #[test]
    fn test_registration_display() {
        let err = PublishError::registration("web.local", "daemon is shutting down");
        let display = err.to_string();
        assert!(display.contains("web.local"));
        assert!(display.contains("daemon is shutting down"));
        assert!(err.is_registration());
    }

    #[test]
    fn test_name_taken_display() {
        let err = PublishError::NameTaken {
            name: "web.local".to_string(),
            owner: "other.local".to_string(),
        };
        assert!(err.to_string().contains("already owned by 'other.local'"));
        assert!(err.is_registration());
    }

    #[test]
    fn test_connection_is_not_registration() {
        let err = PublishError::Connection("no bus".to_string());
        assert!(!err.is_registration());
        assert!(err.to_string().contains("no bus"));
    }
}
