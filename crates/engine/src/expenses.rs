//! Expenses logged by the members of a couple.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    Category, EngineError, MoneyCents, ResultEngine,
    util::{normalize_required_text, parse_optional_uuid, parse_uuid},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Expense {
    pub id: Uuid,
    pub description: String,
    pub amount: MoneyCents,
    pub category: Category,
    /// Split between the members (`true`) or a personal expense of the
    /// payer. Only read by [`SettlementMode::PerExpenseShared`]. Always
    /// `false` for [`Category::Transfer`].
    ///
    /// [`SettlementMode::PerExpenseShared`]: crate::SettlementMode::PerExpenseShared
    pub shared: bool,
    pub paid_by: Uuid,
    /// `None` once the couple the expense was logged in has been dissolved.
    pub couple_id: Option<Uuid>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Input for a new expense.
#[derive(Clone, Debug)]
pub struct NewExpense {
    pub description: String,
    pub amount: MoneyCents,
    pub category: Category,
    pub shared: bool,
    pub paid_by: Uuid,
    pub date: NaiveDate,
}

/// Partial update of an expense; `None` leaves the field untouched.
#[derive(Clone, Debug, Default)]
pub struct ExpenseUpdate {
    pub description: Option<String>,
    pub amount: Option<MoneyCents>,
    pub category: Option<Category>,
    pub shared: Option<bool>,
    pub paid_by: Option<Uuid>,
    pub date: Option<NaiveDate>,
}

/// Largest amount a single expense may carry (one billion, in cents).
///
/// Keeps every couple total far away from `i64` overflow.
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000_00;

pub(crate) fn validate_amount(amount: MoneyCents) -> ResultEngine<()> {
    if !amount.is_positive() {
        return Err(EngineError::InvalidAmount(
            "amount must be > 0".to_string(),
        ));
    }
    if amount.cents() > MAX_AMOUNT_CENTS {
        return Err(EngineError::InvalidAmount(format!(
            "amount must be at most {}",
            MoneyCents::new(MAX_AMOUNT_CENTS)
        )));
    }
    Ok(())
}

impl Expense {
    pub(crate) fn new(input: NewExpense, couple_id: Uuid) -> ResultEngine<Self> {
        validate_amount(input.amount)?;
        Ok(Self {
            id: Uuid::new_v4(),
            description: normalize_required_text(&input.description, "description")?,
            amount: input.amount,
            category: input.category,
            shared: input.shared && !input.category.is_transfer(),
            paid_by: input.paid_by,
            couple_id: Some(couple_id),
            date: input.date,
            created_at: Utc::now(),
        })
    }

    /// Applies an update in memory, validating every changed field.
    pub(crate) fn apply(&mut self, update: ExpenseUpdate) -> ResultEngine<()> {
        if let Some(description) = update.description {
            self.description = normalize_required_text(&description, "description")?;
        }
        if let Some(amount) = update.amount {
            validate_amount(amount)?;
            self.amount = amount;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(shared) = update.shared {
            self.shared = shared;
        }
        if self.category.is_transfer() {
            self.shared = false;
        }
        if let Some(paid_by) = update.paid_by {
            self.paid_by = paid_by;
        }
        if let Some(date) = update.date {
            self.date = date;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub description: String,
    pub amount_minor: i64,
    pub category: String,
    pub shared: bool,
    pub paid_by: String,
    pub couple_id: Option<String>,
    pub date: Date,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::couples::Entity",
        from = "Column::CoupleId",
        to = "super::couples::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Couples,
}

impl Related<super::couples::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Couples.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        let amount = MoneyCents::new(model.amount_minor);
        validate_amount(amount)?;
        Ok(Self {
            id: parse_uuid(&model.id, "expense")?,
            paid_by: parse_uuid(&model.paid_by, "profile")?,
            couple_id: parse_optional_uuid(model.couple_id.as_deref(), "couple")?,
            category: Category::try_from(model.category.as_str())?,
            description: model.description,
            amount,
            shared: model.shared,
            date: model.date,
            created_at: model.created_at,
        })
    }
}

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        Self {
            id: ActiveValue::Set(expense.id.to_string()),
            description: ActiveValue::Set(expense.description.clone()),
            amount_minor: ActiveValue::Set(expense.amount.cents()),
            category: ActiveValue::Set(expense.category.as_str().to_string()),
            shared: ActiveValue::Set(expense.shared),
            paid_by: ActiveValue::Set(expense.paid_by.to_string()),
            couple_id: ActiveValue::Set(expense.couple_id.map(|id| id.to_string())),
            date: ActiveValue::Set(expense.date),
            created_at: ActiveValue::Set(expense.created_at),
        }
    }
}
