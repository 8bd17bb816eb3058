use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod profile {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProfileNew {
        pub name: String,
        pub avatar_url: Option<String>,
        pub color: Option<String>,
    }

    /// Partial update: absent fields are left untouched, an empty
    /// `avatar_url` or `color` clears it.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ProfileUpdate {
        pub name: Option<String>,
        pub avatar_url: Option<String>,
        pub color: Option<String>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ProfileView {
        pub id: Uuid,
        pub name: String,
        pub avatar_url: Option<String>,
        pub color: Option<String>,
        pub couple_id: Option<Uuid>,
        pub created_at: DateTime<Utc>,
    }
}

pub mod pairing {
    use super::*;
    use crate::profile::ProfileView;

    /// Where the caller stands in the pairing flow.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(tag = "state", rename_all = "snake_case")]
    pub enum PairingState {
        Unpaired,
        InvitationSent,
        InvitationReceived,
        Paired { couple_id: Uuid },
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PartnersResponse {
        pub partners: Vec<ProfileView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CoupleView {
        pub id: Uuid,
        pub created_at: DateTime<Utc>,
        pub me: ProfileView,
        pub partner: ProfileView,
    }
}

pub mod invitation {
    use super::*;

    /// Exactly one of `recipient_id` and `recipient_email` must be set.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct InvitationNew {
        pub recipient_id: Option<Uuid>,
        pub recipient_email: Option<String>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct InvitationView {
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

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InvitationList {
        pub invitations: Vec<InvitationView>,
    }

    /// The couple formed by an accepted invitation.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct CoupleCreated {
        pub id: Uuid,
        pub member_a: Uuid,
        pub member_b: Uuid,
        pub created_at: DateTime<Utc>,
    }
}

pub mod expense {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub description: String,
        /// Decimal string, `.` or `,` as separator, at most two decimals.
        pub amount: String,
        /// One of the known categories; `other` when absent.
        pub category: Option<String>,
        /// Defaults to `true`.
        pub shared: Option<bool>,
        /// Defaults to the caller.
        pub paid_by: Option<Uuid>,
        pub date: NaiveDate,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseUpdate {
        pub description: Option<String>,
        pub amount: Option<String>,
        pub category: Option<String>,
        pub shared: Option<bool>,
        pub paid_by: Option<Uuid>,
        pub date: Option<NaiveDate>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: Uuid,
        pub description: String,
        /// Formatted with two decimals, e.g. `"12.50"`.
        pub amount: String,
        pub amount_minor: i64,
        pub category: String,
        pub shared: bool,
        pub paid_by: Uuid,
        pub couple_id: Option<Uuid>,
        pub date: NaiveDate,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseList {
        pub expenses: Vec<ExpenseView>,
    }
}

pub mod balance {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum SettlementMode {
        EqualSplit,
        PerExpenseShared,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Settlement {
        pub debtor: Uuid,
        pub creditor: Uuid,
        pub amount: String,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CategoryTotal {
        pub category: String,
        pub amount: String,
    }

    /// All amounts are decimal strings rounded to two places.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceView {
        pub mode: SettlementMode,
        pub member_a: Uuid,
        pub member_b: Uuid,
        pub total_a: String,
        pub total_b: String,
        pub total_expenses: String,
        pub shared_total: String,
        /// Transfers from `member_a` to `member_b`; not part of the totals.
        pub transferred_a: String,
        pub transferred_b: String,
        pub owes_a: String,
        pub owes_b: String,
        pub settlement: Option<Settlement>,
        pub by_category: Vec<CategoryTotal>,
    }
}
