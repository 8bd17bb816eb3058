//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`KeyNotFound`] thrown when a profile, couple, invitation or expense does
//!   not exist (or is not visible to the caller).
//! - [`AlreadyPaired`] thrown when a profile that already belongs to a couple
//!   takes part in a new pairing.
//! - [`InvitationExpired`] and [`InvitationAlreadyAccepted`] thrown when an
//!   invitation can no longer be accepted.
//! - [`InvalidAmount`] and [`InvalidField`] thrown on validation failures.
//! - [`Database`] and [`Storage`] thrown when a collaborator fails.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`AlreadyPaired`]: EngineError::AlreadyPaired
//!  [`InvitationExpired`]: EngineError::InvitationExpired
//!  [`InvitationAlreadyAccepted`]: EngineError::InvitationAlreadyAccepted
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InvalidField`]: EngineError::InvalidField
//!  [`Database`]: EngineError::Database
//!  [`Storage`]: EngineError::Storage
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Already paired: {0}")]
    AlreadyPaired(String),
    #[error("Invitation expired: {0}")]
    InvitationExpired(String),
    #[error("Invitation already accepted: {0}")]
    InvitationAlreadyAccepted(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid field: {0}")]
    InvalidField(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::AlreadyPaired(a), Self::AlreadyPaired(b)) => a == b,
            (Self::InvitationExpired(a), Self::InvitationExpired(b)) => a == b,
            (Self::InvitationAlreadyAccepted(a), Self::InvitationAlreadyAccepted(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidField(a), Self::InvalidField(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::Storage(a), Self::Storage(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(value: std::io::Error) -> Self {
        Self::Storage(value.to_string())
    }
}
