pub use avatars::{AvatarStore, LocalAvatarStore, sanitize_filename};
pub use balance::{Balance, SettlementMode, compute_balance};
pub use categories::Category;
pub use couples::{Couple, CoupleView};
pub use error::EngineError;
pub use expenses::{Expense, ExpenseUpdate, MAX_AMOUNT_CENTS, NewExpense};
pub use identity::Identity;
pub use invitations::{
    CODE_ALPHABET, CODE_LENGTH, DEFAULT_TTL_DAYS, Invitation, InvitationRecipient, generate_code,
};
pub use money::{MoneyCents, format_amount};
pub use ops::{Engine, EngineBuilder, PairingState};
pub use profiles::{Profile, ProfileUpdate};

mod avatars;
mod balance;
mod categories;
pub mod couples;
mod error;
pub mod expenses;
mod identity;
pub mod invitations;
mod money;
mod ops;
pub mod profiles;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
