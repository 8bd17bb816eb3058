use axum::{Extension, extract::State, http::StatusCode};
use uuid::Uuid;

use api_types::expense::{ExpenseList, ExpenseNew, ExpenseUpdate, ExpenseView};
use engine::{Category, Expense, Identity, MoneyCents, NewExpense, format_amount};

use crate::{
    ServerError,
    extract::{Json, Path},
    server::ServerState,
};

fn expense_view(expense: Expense) -> ExpenseView {
    ExpenseView {
        id: expense.id,
        description: expense.description,
        amount: format_amount(expense.amount.to_decimal()),
        amount_minor: expense.amount.cents(),
        category: expense.category.to_string(),
        shared: expense.shared,
        paid_by: expense.paid_by,
        couple_id: expense.couple_id,
        date: expense.date,
        created_at: expense.created_at,
    }
}

fn parse_category(category: Option<&str>) -> Result<Option<Category>, ServerError> {
    Ok(category.map(Category::try_from).transpose()?)
}

pub async fn list(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
) -> Result<Json<ExpenseList>, ServerError> {
    let expenses = state
        .engine
        .expenses(&identity)
        .await?
        .into_iter()
        .map(expense_view)
        .collect();
    Ok(Json(ExpenseList { expenses }))
}

pub async fn create(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseView>), ServerError> {
    let amount: MoneyCents = payload.amount.parse()?;
    let category = parse_category(payload.category.as_deref())?.unwrap_or_default();
    let paid_by = match payload.paid_by {
        Some(paid_by) => paid_by,
        None => state.engine.profile(&identity).await?.id,
    };

    let expense = state
        .engine
        .create_expense(
            NewExpense {
                description: payload.description,
                amount,
                category,
                shared: payload.shared.unwrap_or(true),
                paid_by,
                date: payload.date,
            },
            &identity,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(expense_view(expense))))
}

pub async fn update(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(expense_id): Path<Uuid>,
    Json(payload): Json<ExpenseUpdate>,
) -> Result<Json<ExpenseView>, ServerError> {
    let update = engine::ExpenseUpdate {
        description: payload.description,
        amount: payload
            .amount
            .as_deref()
            .map(str::parse::<MoneyCents>)
            .transpose()?,
        category: parse_category(payload.category.as_deref())?,
        shared: payload.shared,
        paid_by: payload.paid_by,
        date: payload.date,
    };
    let expense = state
        .engine
        .update_expense(expense_id, update, &identity)
        .await?;
    Ok(Json(expense_view(expense)))
}

pub async fn delete(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(expense_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_expense(expense_id, &identity).await?;
    Ok(StatusCode::NO_CONTENT)
}
