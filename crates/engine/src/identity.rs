//! Request-scoped caller identity.
//!
//! The identity provider authenticates the caller; the engine only sees the
//! opaque user id (and the e-mail when the provider shares it). Every engine
//! operation takes the identity explicitly.

use crate::{EngineError, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
}

impl Identity {
    /// Builds an identity, rejecting a blank user id.
    pub fn new(user_id: &str, email: Option<&str>) -> ResultEngine<Self> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(EngineError::InvalidField(
                "user id must not be empty".to_string(),
            ));
        }
        Ok(Self {
            user_id: user_id.to_string(),
            email: email
                .map(|e| e.trim().to_lowercase())
                .filter(|e| !e.is_empty()),
        })
    }
}
