//! Time-limited, single-use offers to form a couple.

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    util::{parse_optional_uuid, parse_uuid},
};

/// Symbols an invitation code is drawn from.
pub const CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
/// Length of an invitation code.
pub const CODE_LENGTH: usize = 8;
/// Default validity of an invitation.
pub const DEFAULT_TTL_DAYS: i64 = 7;

/// Who an invitation is addressed to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvitationRecipient {
    Profile(Uuid),
    Email(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Invitation {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Option<Uuid>,
    pub recipient_email: Option<String>,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub accepted: bool,
    pub accepted_at: Option<DateTime<Utc>>,
}

impl Invitation {
    pub(crate) fn new(
        sender_id: Uuid,
        recipient: InvitationRecipient,
        code: String,
        ttl: TimeDelta,
    ) -> ResultEngine<Self> {
        let created_at = Utc::now();
        let expires_at = created_at.checked_add_signed(ttl).ok_or_else(|| {
            EngineError::InvalidField("invitation expiry is out of range".to_string())
        })?;
        let (recipient_id, recipient_email) = match recipient {
            InvitationRecipient::Profile(id) => (Some(id), None),
            InvitationRecipient::Email(email) => (None, Some(email)),
        };
        Ok(Self {
            id: Uuid::new_v4(),
            sender_id,
            recipient_id,
            recipient_email,
            code,
            created_at,
            expires_at,
            accepted: false,
            accepted_at: None,
        })
    }

    /// An invitation is valid strictly before `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Unaccepted and not yet expired.
    pub fn is_pending_at(&self, now: DateTime<Utc>) -> bool {
        !self.accepted && !self.is_expired_at(now)
    }

    /// Whether the invitation is addressed to this profile, either directly
    /// or through the caller's e-mail.
    pub fn is_addressed_to(&self, profile_id: Uuid, email: Option<&str>) -> bool {
        if self.recipient_id == Some(profile_id) {
            return true;
        }
        match (self.recipient_email.as_deref(), email) {
            (Some(expected), Some(actual)) => expected.eq_ignore_ascii_case(actual),
            _ => false,
        }
    }

    /// Rejects an invitation that can no longer be accepted, distinguishing
    /// the accepted and expired cases.
    pub(crate) fn ensure_acceptable_at(&self, now: DateTime<Utc>) -> ResultEngine<()> {
        if self.accepted {
            return Err(EngineError::InvitationAlreadyAccepted(self.code.clone()));
        }
        if self.is_expired_at(now) {
            return Err(EngineError::InvitationExpired(self.code.clone()));
        }
        Ok(())
    }
}

/// Generates a random invitation code of [`CODE_LENGTH`] symbols from
/// [`CODE_ALPHABET`].
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Normalizes a user-typed code (trimmed, upper-cased).
pub(crate) fn normalize_code(code: &str) -> ResultEngine<String> {
    let code = code.trim().to_ascii_uppercase();
    if code.len() != CODE_LENGTH || !code.bytes().all(|b| CODE_ALPHABET.contains(&b)) {
        return Err(EngineError::KeyNotFound("invitation not exists".to_string()));
    }
    Ok(code)
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "invitations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub sender_id: String,
    pub recipient_id: Option<String>,
    pub recipient_email: Option<String>,
    #[sea_orm(unique)]
    pub code: String,
    pub created_at: DateTimeUtc,
    pub expires_at: DateTimeUtc,
    pub accepted: bool,
    pub accepted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Invitation {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        if model.recipient_id.is_none() && model.recipient_email.is_none() {
            return Err(EngineError::InvalidField(format!(
                "invitation {} has no recipient",
                model.id
            )));
        }
        Ok(Self {
            id: parse_uuid(&model.id, "invitation")?,
            sender_id: parse_uuid(&model.sender_id, "profile")?,
            recipient_id: parse_optional_uuid(model.recipient_id.as_deref(), "profile")?,
            recipient_email: model.recipient_email,
            code: model.code,
            created_at: model.created_at,
            expires_at: model.expires_at,
            accepted: model.accepted,
            accepted_at: model.accepted_at,
        })
    }
}

impl From<&Invitation> for ActiveModel {
    fn from(invitation: &Invitation) -> Self {
        Self {
            id: ActiveValue::Set(invitation.id.to_string()),
            sender_id: ActiveValue::Set(invitation.sender_id.to_string()),
            recipient_id: ActiveValue::Set(invitation.recipient_id.map(|id| id.to_string())),
            recipient_email: ActiveValue::Set(invitation.recipient_email.clone()),
            code: ActiveValue::Set(invitation.code.clone()),
            created_at: ActiveValue::Set(invitation.created_at),
            expires_at: ActiveValue::Set(invitation.expires_at),
            accepted: ActiveValue::Set(invitation.accepted),
            accepted_at: ActiveValue::Set(invitation.accepted_at),
        }
    }
}
