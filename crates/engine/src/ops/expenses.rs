use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    Couple, EngineError, Expense, ExpenseUpdate, Identity, NewExpense, ResultEngine, expenses,
};

use super::{Engine, with_tx};

fn ensure_payer(couple: &Couple, paid_by: Uuid) -> ResultEngine<()> {
    if !couple.has_member(paid_by) {
        return Err(EngineError::InvalidField(
            "paid_by must be a member of the couple".to_string(),
        ));
    }
    Ok(())
}

impl Engine {
    /// Loads an expense of `couple`. Expenses of other couples read as
    /// missing.
    async fn require_couple_expense(
        &self,
        db: &DatabaseTransaction,
        couple: &Couple,
        expense_id: Uuid,
    ) -> ResultEngine<Expense> {
        let model = expenses::Entity::find_by_id(expense_id.to_string())
            .filter(expenses::Column::CoupleId.eq(couple.id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))?;
        Expense::try_from(model)
    }

    /// Logs a new expense for the caller's couple.
    pub async fn create_expense(
        &self,
        input: NewExpense,
        identity: &Identity,
    ) -> ResultEngine<Expense> {
        with_tx!(self, |db_tx| {
            let me = self.require_profile(&db_tx, identity).await?;
            let couple = self.require_couple(&db_tx, &me).await?;
            ensure_payer(&couple, input.paid_by)?;
            let expense = Expense::new(input, couple.id)?;
            expenses::ActiveModel::from(&expense).insert(&db_tx).await?;
            tracing::debug!(
                "expense {} of {} logged in couple {}",
                expense.id,
                expense.amount,
                couple.id
            );
            Ok(expense)
        })
    }

    /// Expenses of the caller's couple, most recent first.
    pub async fn expenses(&self, identity: &Identity) -> ResultEngine<Vec<Expense>> {
        with_tx!(self, |db_tx| {
            let me = self.require_profile(&db_tx, identity).await?;
            let couple = self.require_couple(&db_tx, &me).await?;
            self.couple_expenses(&db_tx, &couple).await
        })
    }

    pub(super) async fn couple_expenses(
        &self,
        db: &DatabaseTransaction,
        couple: &Couple,
    ) -> ResultEngine<Vec<Expense>> {
        expenses::Entity::find()
            .filter(expenses::Column::CoupleId.eq(couple.id.to_string()))
            .order_by_desc(expenses::Column::Date)
            .order_by_desc(expenses::Column::CreatedAt)
            .all(db)
            .await?
            .into_iter()
            .map(Expense::try_from)
            .collect()
    }

    pub async fn update_expense(
        &self,
        expense_id: Uuid,
        update: ExpenseUpdate,
        identity: &Identity,
    ) -> ResultEngine<Expense> {
        with_tx!(self, |db_tx| {
            let me = self.require_profile(&db_tx, identity).await?;
            let couple = self.require_couple(&db_tx, &me).await?;
            let mut expense = self
                .require_couple_expense(&db_tx, &couple, expense_id)
                .await?;
            expense.apply(update)?;
            ensure_payer(&couple, expense.paid_by)?;
            expenses::ActiveModel::from(&expense).update(&db_tx).await?;
            Ok(expense)
        })
    }

    pub async fn delete_expense(&self, expense_id: Uuid, identity: &Identity) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let me = self.require_profile(&db_tx, identity).await?;
            let couple = self.require_couple(&db_tx, &me).await?;
            let expense = self
                .require_couple_expense(&db_tx, &couple, expense_id)
                .await?;
            expenses::Entity::delete_by_id(expense.id.to_string())
                .exec(&db_tx)
                .await?;
            tracing::debug!("expense {} deleted from couple {}", expense.id, couple.id);
            Ok(())
        })
    }
}
