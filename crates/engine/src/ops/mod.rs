use std::sync::Arc;

use chrono::TimeDelta;
use sea_orm::DatabaseConnection;

use crate::{
    AvatarStore, LocalAvatarStore, ResultEngine, SettlementMode, invitations::DEFAULT_TTL_DAYS,
};

mod access;
mod balances;
mod expenses;
mod pairing;
mod profiles;

pub use pairing::PairingState;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
///
/// An early return through `?` inside the block drops the transaction, which
/// rolls it back as well.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = sea_orm::TransactionTrait::begin(&$self.database).await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                $tx.rollback().await?;
                Err(err)
            }
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    avatars: Arc<dyn AvatarStore>,
    settlement_mode: SettlementMode,
    invitation_ttl: TimeDelta,
    allowed_emails: Option<Vec<String>>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn settlement_mode(&self) -> SettlementMode {
        self.settlement_mode
    }
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    avatars: Arc<dyn AvatarStore>,
    settlement_mode: SettlementMode,
    invitation_ttl_days: i64,
    allowed_emails: Option<Vec<String>>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            avatars: Arc::new(LocalAvatarStore::default()),
            settlement_mode: SettlementMode::default(),
            invitation_ttl_days: DEFAULT_TTL_DAYS,
            allowed_emails: None,
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Where uploaded avatars are stored.
    pub fn avatar_store(mut self, store: Arc<dyn AvatarStore>) -> EngineBuilder {
        self.avatars = store;
        self
    }

    pub fn settlement_mode(mut self, mode: SettlementMode) -> EngineBuilder {
        self.settlement_mode = mode;
        self
    }

    /// Validity of new invitations, in days.
    pub fn invitation_ttl_days(mut self, days: i64) -> EngineBuilder {
        self.invitation_ttl_days = days;
        self
    }

    /// Restrict profile creation to these e-mails. An empty list disables
    /// the restriction.
    pub fn allowed_emails(mut self, emails: Vec<String>) -> EngineBuilder {
        let emails: Vec<String> = emails
            .iter()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        self.allowed_emails = (!emails.is_empty()).then_some(emails);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        if self.invitation_ttl_days <= 0 {
            return Err(crate::EngineError::InvalidField(
                "invitation ttl must be at least one day".to_string(),
            ));
        }
        let invitation_ttl = TimeDelta::try_days(self.invitation_ttl_days).ok_or_else(|| {
            crate::EngineError::InvalidField(format!(
                "invitation ttl of {} days is too large",
                self.invitation_ttl_days
            ))
        })?;
        Ok(Engine {
            database: self.database,
            avatars: self.avatars,
            settlement_mode: self.settlement_mode,
            invitation_ttl,
            allowed_emails: self.allowed_emails,
        })
    }
}
