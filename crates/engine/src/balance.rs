//! Settlement between the two members of a couple.
//!
//! [`compute_balance`] is a pure function of the expense list: it is
//! recomputed from scratch on every read and does not depend on the order of
//! the expenses.
//!
//! Two settlement formulas exist and they are not equivalent, so the choice
//! is explicit ([`SettlementMode`]):
//!
//! - [`SettlementMode::EqualSplit`]: every expense is split 50/50. With
//!   `half = total / 2`, the member whose total is below `half` owes the
//!   other `half - total`.
//! - [`SettlementMode::PerExpenseShared`]: only expenses flagged `shared` are
//!   split; personal expenses are the payer's own and create no debt. The
//!   member who paid less of the shared pot owes half of the difference.
//!
//! In both modes a [`Category::Transfer`] is money handed to the partner: it
//! is not spending, and it moves the balance in the giver's favour by its
//! full amount.
//!
//! Example, A pays 40 shared, B pays 20 shared and 90 personal:
//! `EqualSplit` has A owing 35, `PerExpenseShared` has B owing 10. If B then
//! records a transfer of 10 to A, the couple is even under `PerExpenseShared`.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Category, EngineError, Expense, MoneyCents, Profile, ResultEngine};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementMode {
    /// Every expense is split equally, whatever its `shared` flag.
    #[default]
    EqualSplit,
    /// Only `shared` expenses are split; personal ones never create debt.
    PerExpenseShared,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Balance {
    pub mode: SettlementMode,
    pub member_a: Uuid,
    pub member_b: Uuid,
    /// Everything `member_a` spent, transfers excluded.
    pub total_a: MoneyCents,
    /// Everything `member_b` spent, transfers excluded.
    pub total_b: MoneyCents,
    /// `total_a + total_b`.
    pub total_expenses: MoneyCents,
    /// Sum of the expenses flagged as shared.
    pub shared_total: MoneyCents,
    /// Transfers from `member_a` to `member_b`.
    pub transferred_a: MoneyCents,
    /// Transfers from `member_b` to `member_a`.
    pub transferred_b: MoneyCents,
    /// What `member_a` owes `member_b` (exact, may have a half cent).
    pub owes_a: Decimal,
    /// What `member_b` owes `member_a` (exact, may have a half cent).
    pub owes_b: Decimal,
    pub by_category: BTreeMap<Category, MoneyCents>,
}

impl Balance {
    /// The member who owes money, the creditor and the amount. `None` when
    /// the couple is even.
    pub fn settlement(&self) -> Option<(Uuid, Uuid, Decimal)> {
        if self.owes_a > Decimal::ZERO {
            Some((self.member_a, self.member_b, self.owes_a))
        } else if self.owes_b > Decimal::ZERO {
            Some((self.member_b, self.member_a, self.owes_b))
        } else {
            None
        }
    }
}

/// Running sums for one member.
#[derive(Default)]
struct Tally {
    spent: MoneyCents,
    shared: MoneyCents,
    transferred: MoneyCents,
}

fn add(total: MoneyCents, amount: MoneyCents) -> ResultEngine<MoneyCents> {
    total
        .checked_add(amount)
        .ok_or_else(|| EngineError::InvalidAmount("balance total overflows".to_string()))
}

impl Tally {
    fn record(&mut self, expense: &Expense) -> ResultEngine<()> {
        if expense.category.is_transfer() {
            self.transferred = add(self.transferred, expense.amount)?;
            return Ok(());
        }
        self.spent = add(self.spent, expense.amount)?;
        if expense.shared {
            self.shared = add(self.shared, expense.amount)?;
        }
        Ok(())
    }
}

/// Computes the balance of a couple from its expenses.
///
/// Expenses paid by neither member are ignored. Fails with
/// [`EngineError::InvalidAmount`] if a total does not fit in `i64` cents.
pub fn compute_balance(
    expenses: &[Expense],
    member_a: &Profile,
    member_b: &Profile,
    mode: SettlementMode,
) -> ResultEngine<Balance> {
    let mut a = Tally::default();
    let mut b = Tally::default();
    let mut by_category: BTreeMap<Category, MoneyCents> = BTreeMap::new();

    for expense in expenses {
        let tally = if expense.paid_by == member_a.id {
            &mut a
        } else if expense.paid_by == member_b.id {
            &mut b
        } else {
            continue;
        };
        tally.record(expense)?;
        if !expense.category.is_transfer() {
            let total = by_category.entry(expense.category).or_default();
            *total = add(*total, expense.amount)?;
        }
    }

    // What member_b owes member_a; negative when member_a is the debtor.
    let split = match mode {
        // half - total_a == (total_b - total_a) / 2
        SettlementMode::EqualSplit => a.spent.to_decimal() - b.spent.to_decimal(),
        SettlementMode::PerExpenseShared => a.shared.to_decimal() - b.shared.to_decimal(),
    } / Decimal::TWO;
    let owed_to_a = split + a.transferred.to_decimal() - b.transferred.to_decimal();
    let (owes_a, owes_b) = if owed_to_a > Decimal::ZERO {
        (Decimal::ZERO, owed_to_a)
    } else {
        (-owed_to_a, Decimal::ZERO)
    };

    Ok(Balance {
        mode,
        member_a: member_a.id,
        member_b: member_b.id,
        total_a: a.spent,
        total_b: b.spent,
        total_expenses: add(a.spent, b.spent)?,
        shared_total: add(a.shared, b.shared)?,
        transferred_a: a.transferred,
        transferred_b: b.transferred,
        owes_a,
        owes_b,
        by_category,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn profile(name: &str) -> Profile {
        Profile::new(name.to_string(), name.to_string(), None, None)
    }

    fn expense(paid_by: &Profile, cents: i64, category: Category, shared: bool) -> Expense {
        Expense {
            id: Uuid::new_v4(),
            description: "x".to_string(),
            amount: MoneyCents::new(cents),
            category,
            shared,
            paid_by: paid_by.id,
            couple_id: None,
            date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            created_at: chrono::Utc::now(),
        }
    }

    fn dec(cents: i64) -> Decimal {
        MoneyCents::new(cents).to_decimal()
    }

    #[test]
    fn thirty_against_ten_means_b_owes_ten() {
        let (a, b) = (profile("anna"), profile("bruno"));
        let expenses = vec![
            expense(&a, 3000, Category::Groceries, true),
            expense(&b, 1000, Category::Home, true),
        ];

        let balance = compute_balance(&expenses, &a, &b, SettlementMode::EqualSplit).unwrap();

        assert_eq!(balance.total_a, MoneyCents::new(3000));
        assert_eq!(balance.total_b, MoneyCents::new(1000));
        assert_eq!(balance.total_expenses, MoneyCents::new(4000));
        assert_eq!(balance.owes_a, Decimal::ZERO);
        assert_eq!(balance.owes_b, dec(1000));
        assert_eq!(balance.settlement(), Some((b.id, a.id, dec(1000))));
    }

    #[test]
    fn equal_totals_owe_nothing() {
        let (a, b) = (profile("anna"), profile("bruno"));
        let expenses = vec![
            expense(&a, 1500, Category::Travel, true),
            expense(&b, 1500, Category::Travel, true),
        ];

        let balance = compute_balance(&expenses, &a, &b, SettlementMode::EqualSplit).unwrap();

        assert_eq!(balance.owes_a, Decimal::ZERO);
        assert_eq!(balance.owes_b, Decimal::ZERO);
        assert_eq!(balance.settlement(), None);
    }

    #[test]
    fn empty_expense_list_is_even() {
        let (a, b) = (profile("anna"), profile("bruno"));
        let balance = compute_balance(&[], &a, &b, SettlementMode::EqualSplit).unwrap();
        assert_eq!(balance.total_expenses, MoneyCents::ZERO);
        assert_eq!(balance.settlement(), None);
    }

    #[test]
    fn odd_difference_keeps_the_half_cent() {
        let (a, b) = (profile("anna"), profile("bruno"));
        let expenses = vec![expense(&a, 1001, Category::Other, true)];

        let balance = compute_balance(&expenses, &a, &b, SettlementMode::EqualSplit).unwrap();

        assert_eq!(balance.owes_b, Decimal::new(5005, 3));
        assert_eq!(crate::format_amount(balance.owes_b), "5.01");
    }

    #[test]
    fn difference_equals_twice_the_debt_and_only_one_side_owes() {
        let (a, b) = (profile("anna"), profile("bruno"));
        let samples: [&[(bool, i64)]; 4] = [
            &[(true, 1), (false, 2), (true, 999)],
            &[(false, 12_345), (false, 1)],
            &[(true, 50), (false, 50), (true, 3), (false, 7)],
            &[(true, 100_000_00)],
        ];

        for sample in samples {
            let expenses: Vec<Expense> = sample
                .iter()
                .map(|(by_a, cents)| {
                    let payer = if *by_a { &a } else { &b };
                    expense(payer, *cents, Category::Other, true)
                })
                .collect();
            let balance = compute_balance(&expenses, &a, &b, SettlementMode::EqualSplit).unwrap();

            let max = balance.total_a.max(balance.total_b);
            let min = balance.total_a.min(balance.total_b);
            assert_eq!(
                (max - min).to_decimal(),
                Decimal::TWO * (balance.owes_a + balance.owes_b)
            );
            assert!(balance.owes_a.is_zero() || balance.owes_b.is_zero());
            assert!(balance.owes_a >= Decimal::ZERO && balance.owes_b >= Decimal::ZERO);
        }
    }

    #[test]
    fn order_does_not_matter() {
        let (a, b) = (profile("anna"), profile("bruno"));
        let mut expenses = vec![
            expense(&a, 420, Category::Health, true),
            expense(&b, 1999, Category::Shopping, false),
            expense(&a, 7, Category::Health, true),
            expense(&b, 300, Category::Restaurant, true),
        ];

        let forward = compute_balance(&expenses, &a, &b, SettlementMode::PerExpenseShared).unwrap();
        expenses.reverse();
        let backward = compute_balance(&expenses, &a, &b, SettlementMode::PerExpenseShared).unwrap();
        let again = compute_balance(&expenses, &a, &b, SettlementMode::PerExpenseShared).unwrap();

        assert_eq!(forward, backward);
        assert_eq!(backward, again);
    }

    #[test]
    fn per_expense_shared_ignores_personal_expenses() {
        let (a, b) = (profile("anna"), profile("bruno"));
        let expenses = vec![
            expense(&a, 4000, Category::Home, true),
            expense(&b, 2000, Category::Home, true),
            expense(&b, 9000, Category::Shopping, false),
        ];

        let shared = compute_balance(&expenses, &a, &b, SettlementMode::PerExpenseShared).unwrap();
        assert_eq!(shared.shared_total, MoneyCents::new(6000));
        assert_eq!(shared.total_b, MoneyCents::new(11_000));
        assert_eq!(shared.owes_b, dec(1000));
        assert_eq!(shared.owes_a, Decimal::ZERO);

        let equal = compute_balance(&expenses, &a, &b, SettlementMode::EqualSplit).unwrap();
        assert_eq!(equal.owes_a, dec(3500));
        assert_eq!(equal.owes_b, Decimal::ZERO);
    }

    #[test]
    fn overflowing_totals_are_an_error() {
        let (a, b) = (profile("anna"), profile("bruno"));
        let expenses = vec![
            expense(&a, i64::MAX, Category::Home, true),
            expense(&a, 1, Category::Home, true),
        ];

        let err = compute_balance(&expenses, &a, &b, SettlementMode::EqualSplit).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }

    #[test]
    fn a_transfer_settles_the_debt_in_both_modes() {
        let (a, b) = (profile("anna"), profile("bruno"));
        let mut expenses = vec![
            expense(&a, 4000, Category::Home, true),
            expense(&b, 2000, Category::Home, true),
            expense(&b, 9000, Category::Shopping, false),
        ];
        // B owes 10 under PerExpenseShared, A owes 35 under EqualSplit.
        expenses.push(expense(&b, 1000, Category::Transfer, false));
        expenses.push(expense(&a, 3500, Category::Transfer, false));

        let shared = compute_balance(&expenses, &a, &b, SettlementMode::PerExpenseShared).unwrap();
        assert_eq!(shared.transferred_a, MoneyCents::new(3500));
        assert_eq!(shared.transferred_b, MoneyCents::new(1000));
        // The 35 A handed over is now owed back by B, minus B's 10.
        assert_eq!(shared.owes_b, dec(3500));

        let equal = compute_balance(&expenses, &a, &b, SettlementMode::EqualSplit).unwrap();
        // -35 + 35 - 10: A's transfer cancels the debt, B's shifts it back.
        assert_eq!(equal.owes_a, dec(1000));
        assert_eq!(equal.owes_b, Decimal::ZERO);
    }

    #[test]
    fn transfers_are_not_spending() {
        let (a, b) = (profile("anna"), profile("bruno"));
        let expenses = vec![
            expense(&a, 3000, Category::Groceries, true),
            expense(&b, 1000, Category::Transfer, false),
        ];

        let balance = compute_balance(&expenses, &a, &b, SettlementMode::EqualSplit).unwrap();

        assert_eq!(balance.total_b, MoneyCents::ZERO);
        assert_eq!(balance.total_expenses, MoneyCents::new(3000));
        assert!(!balance.by_category.contains_key(&Category::Transfer));
        // B owed 15 and paid 10 of it.
        assert_eq!(balance.settlement(), Some((b.id, a.id, dec(500))));
    }

    #[test]
    fn outsiders_are_ignored_and_categories_are_summed() {
        let (a, b, c) = (profile("anna"), profile("bruno"), profile("carla"));
        let expenses = vec![
            expense(&a, 1000, Category::Groceries, true),
            expense(&b, 250, Category::Groceries, true),
            expense(&c, 5000, Category::Travel, true),
        ];

        let balance = compute_balance(&expenses, &a, &b, SettlementMode::EqualSplit).unwrap();

        assert_eq!(balance.total_expenses, MoneyCents::new(1250));
        assert_eq!(
            balance.by_category.get(&Category::Groceries),
            Some(&MoneyCents::new(1250))
        );
        assert!(!balance.by_category.contains_key(&Category::Travel));
    }
}
