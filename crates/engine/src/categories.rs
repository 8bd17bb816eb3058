//! Expense categories.

use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Groceries,
    Restaurant,
    Entertainment,
    Travel,
    Utilities,
    Health,
    Shopping,
    Home,
    #[default]
    Other,
    /// Money handed from the payer to the partner to settle up. Not an
    /// expense: it moves the balance by its full amount.
    Transfer,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Self::Groceries,
        Self::Restaurant,
        Self::Entertainment,
        Self::Travel,
        Self::Utilities,
        Self::Health,
        Self::Shopping,
        Self::Home,
        Self::Other,
        Self::Transfer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Groceries => "groceries",
            Self::Restaurant => "restaurant",
            Self::Entertainment => "entertainment",
            Self::Travel => "travel",
            Self::Utilities => "utilities",
            Self::Health => "health",
            Self::Shopping => "shopping",
            Self::Home => "home",
            Self::Other => "other",
            Self::Transfer => "transfer",
        }
    }

    pub fn is_transfer(self) -> bool {
        self == Self::Transfer
    }
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Category {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| EngineError::InvalidField(format!("invalid category: {value}")))
    }
}
