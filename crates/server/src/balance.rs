use axum::{Extension, extract::State};

use api_types::balance::{BalanceView, CategoryTotal, Settlement, SettlementMode};
use engine::{Identity, format_amount};

use crate::{ServerError, extract::Json, server::ServerState};

pub async fn get(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
) -> Result<Json<BalanceView>, ServerError> {
    let balance = state.engine.balance(&identity).await?;

    let settlement = balance
        .settlement()
        .map(|(debtor, creditor, amount)| Settlement {
            debtor,
            creditor,
            amount: format_amount(amount),
        });
    let by_category = balance
        .by_category
        .iter()
        .map(|(category, amount)| CategoryTotal {
            category: category.to_string(),
            amount: format_amount(amount.to_decimal()),
        })
        .collect();

    Ok(Json(BalanceView {
        mode: match balance.mode {
            engine::SettlementMode::EqualSplit => SettlementMode::EqualSplit,
            engine::SettlementMode::PerExpenseShared => SettlementMode::PerExpenseShared,
        },
        member_a: balance.member_a,
        member_b: balance.member_b,
        total_a: format_amount(balance.total_a.to_decimal()),
        total_b: format_amount(balance.total_b.to_decimal()),
        total_expenses: format_amount(balance.total_expenses.to_decimal()),
        shared_total: format_amount(balance.shared_total.to_decimal()),
        transferred_a: format_amount(balance.transferred_a.to_decimal()),
        transferred_b: format_amount(balance.transferred_b.to_decimal()),
        owes_a: format_amount(balance.owes_a),
        owes_b: format_amount(balance.owes_b),
        settlement,
        by_category,
    }))
}
