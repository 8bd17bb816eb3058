use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use engine::{
    Category, Engine, EngineError, ExpenseUpdate, Identity, InvitationRecipient,
    MAX_AMOUNT_CENTS, MoneyCents, NewExpense, Profile, SettlementMode,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_mode(mode: SettlementMode) -> Engine {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db: DatabaseConnection = Database::connect(options).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder()
        .database(db)
        .settlement_mode(mode)
        .build()
        .await
        .unwrap()
}

struct Couple {
    alice: Identity,
    bob: Identity,
    alice_id: Uuid,
    bob_id: Uuid,
}

async fn paired_couple(engine: &Engine) -> Couple {
    let alice = Identity::new("alice", Some("alice@example.com")).unwrap();
    let bob = Identity::new("bob", Some("bob@example.com")).unwrap();
    let alice_profile: Profile = engine
        .create_profile("Alice", None, None, &alice)
        .await
        .unwrap();
    let bob_profile = engine.create_profile("Bob", None, None, &bob).await.unwrap();
    let invitation = engine
        .create_invitation(InvitationRecipient::Profile(bob_profile.id), &alice)
        .await
        .unwrap();
    engine.accept_invitation(invitation.id, &bob).await.unwrap();
    Couple {
        alice,
        bob,
        alice_id: alice_profile.id,
        bob_id: bob_profile.id,
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
}

fn expense(description: &str, cents: i64, paid_by: Uuid, date: NaiveDate) -> NewExpense {
    NewExpense {
        description: description.to_string(),
        amount: MoneyCents::new(cents),
        category: Category::Groceries,
        shared: true,
        paid_by,
        date,
    }
}

#[tokio::test]
async fn expenses_are_listed_most_recent_first() {
    let engine = engine_with_mode(SettlementMode::EqualSplit).await;
    let couple = paired_couple(&engine).await;

    engine
        .create_expense(expense("old", 10_00, couple.alice_id, day(1)), &couple.alice)
        .await
        .unwrap();
    engine
        .create_expense(expense("new", 5_00, couple.bob_id, day(20)), &couple.bob)
        .await
        .unwrap();
    engine
        .create_expense(expense("middle", 7_50, couple.bob_id, day(10)), &couple.alice)
        .await
        .unwrap();

    let listed = engine.expenses(&couple.bob).await.unwrap();
    let names: Vec<_> = listed.iter().map(|e| e.description.as_str()).collect();
    assert_eq!(names, vec!["new", "middle", "old"]);
    assert_eq!(engine.expenses(&couple.alice).await.unwrap(), listed);
}

#[tokio::test]
async fn invalid_expenses_are_rejected() {
    let engine = engine_with_mode(SettlementMode::EqualSplit).await;
    let couple = paired_couple(&engine).await;

    assert!(matches!(
        engine
            .create_expense(expense("free", 0, couple.alice_id, day(1)), &couple.alice)
            .await,
        Err(EngineError::InvalidAmount(_))
    ));
    assert!(matches!(
        engine
            .create_expense(expense("refund", -5_00, couple.alice_id, day(1)), &couple.alice)
            .await,
        Err(EngineError::InvalidAmount(_))
    ));
    assert!(matches!(
        engine
            .create_expense(expense("  ", 5_00, couple.alice_id, day(1)), &couple.alice)
            .await,
        Err(EngineError::InvalidField(_))
    ));
    assert!(matches!(
        engine
            .create_expense(expense("stranger", 5_00, Uuid::new_v4(), day(1)), &couple.alice)
            .await,
        Err(EngineError::InvalidField(_))
    ));
    assert!(engine.expenses(&couple.alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn unpaired_profiles_cannot_log_expenses() {
    let engine = engine_with_mode(SettlementMode::EqualSplit).await;
    let solo = Identity::new("solo", None).unwrap();
    let profile = engine.create_profile("Solo", None, None, &solo).await.unwrap();

    assert!(matches!(
        engine
            .create_expense(expense("coffee", 2_00, profile.id, day(1)), &solo)
            .await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine.expenses(&solo).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn update_and_delete_stay_inside_the_couple() {
    let engine = engine_with_mode(SettlementMode::EqualSplit).await;
    let couple = paired_couple(&engine).await;
    let created = engine
        .create_expense(expense("cinema", 18_00, couple.alice_id, day(3)), &couple.alice)
        .await
        .unwrap();

    let updated = engine
        .update_expense(
            created.id,
            ExpenseUpdate {
                amount: Some(MoneyCents::new(20_00)),
                category: Some(Category::Entertainment),
                paid_by: Some(couple.bob_id),
                ..Default::default()
            },
            &couple.bob,
        )
        .await
        .unwrap();
    assert_eq!(updated.amount, MoneyCents::new(20_00));
    assert_eq!(updated.category, Category::Entertainment);
    assert_eq!(updated.paid_by, couple.bob_id);
    assert_eq!(updated.description, "cinema");
    assert_eq!(engine.expenses(&couple.alice).await.unwrap(), vec![updated]);

    assert!(matches!(
        engine
            .update_expense(
                created.id,
                ExpenseUpdate {
                    amount: Some(MoneyCents::ZERO),
                    ..Default::default()
                },
                &couple.alice,
            )
            .await,
        Err(EngineError::InvalidAmount(_))
    ));

    // Someone outside the couple sees nothing.
    let carol = Identity::new("carol", None).unwrap();
    let dave = Identity::new("dave", None).unwrap();
    engine.create_profile("Carol", None, None, &carol).await.unwrap();
    let dave_profile = engine.create_profile("Dave", None, None, &dave).await.unwrap();
    let invitation = engine
        .create_invitation(InvitationRecipient::Profile(dave_profile.id), &carol)
        .await
        .unwrap();
    engine.accept_invitation(invitation.id, &dave).await.unwrap();
    assert!(matches!(
        engine.delete_expense(created.id, &carol).await,
        Err(EngineError::KeyNotFound(_))
    ));

    engine.delete_expense(created.id, &couple.alice).await.unwrap();
    assert!(engine.expenses(&couple.bob).await.unwrap().is_empty());
    assert!(matches!(
        engine.delete_expense(created.id, &couple.alice).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn balance_splits_every_expense_equally() {
    let engine = engine_with_mode(SettlementMode::EqualSplit).await;
    let couple = paired_couple(&engine).await;

    engine
        .create_expense(expense("rent", 30_00, couple.alice_id, day(1)), &couple.alice)
        .await
        .unwrap();
    let mut personal = expense("gift", 10_01, couple.bob_id, day(2));
    personal.shared = false;
    personal.category = Category::Shopping;
    engine.create_expense(personal, &couple.bob).await.unwrap();

    let balance = engine.balance(&couple.bob).await.unwrap();
    assert_eq!(balance.mode, SettlementMode::EqualSplit);
    assert_eq!(balance.member_a, couple.alice_id);
    assert_eq!(balance.total_a, MoneyCents::new(30_00));
    assert_eq!(balance.total_b, MoneyCents::new(10_01));
    assert_eq!(balance.total_expenses, MoneyCents::new(40_01));
    assert_eq!(balance.owes_a, Decimal::ZERO);
    assert_eq!(balance.owes_b, Decimal::new(9_995, 3));
    assert_eq!(
        balance.settlement(),
        Some((couple.bob_id, couple.alice_id, Decimal::new(9_995, 3)))
    );
    assert_eq!(balance.by_category[&Category::Groceries], MoneyCents::new(30_00));
    assert_eq!(balance.by_category[&Category::Shopping], MoneyCents::new(10_01));
}

#[tokio::test]
async fn per_expense_mode_only_splits_shared_expenses() {
    let engine = engine_with_mode(SettlementMode::PerExpenseShared).await;
    let couple = paired_couple(&engine).await;

    engine
        .create_expense(expense("groceries", 40_00, couple.alice_id, day(1)), &couple.alice)
        .await
        .unwrap();
    engine
        .create_expense(expense("utilities", 20_00, couple.bob_id, day(2)), &couple.bob)
        .await
        .unwrap();
    let mut personal = expense("shoes", 100_00, couple.bob_id, day(3));
    personal.shared = false;
    engine.create_expense(personal, &couple.bob).await.unwrap();

    let balance = engine.balance(&couple.alice).await.unwrap();
    assert_eq!(balance.shared_total, MoneyCents::new(60_00));
    assert_eq!(balance.owes_b, Decimal::new(10_00, 2));
    assert_eq!(balance.owes_a, Decimal::ZERO);
}

#[tokio::test]
async fn oversized_amounts_are_rejected_and_large_totals_still_balance() {
    let engine = engine_with_mode(SettlementMode::EqualSplit).await;
    let couple = paired_couple(&engine).await;

    let huge = "92233720368547758.07".parse::<MoneyCents>().unwrap();
    let mut oversized = expense("yacht", 0, couple.alice_id, day(1));
    oversized.amount = huge;
    assert!(matches!(
        engine.create_expense(oversized, &couple.alice).await,
        Err(EngineError::InvalidAmount(_))
    ));

    for _ in 0..3 {
        engine
            .create_expense(
                expense("house", MAX_AMOUNT_CENTS, couple.alice_id, day(2)),
                &couple.alice,
            )
            .await
            .unwrap();
    }
    engine
        .create_expense(expense("bread", 1, couple.alice_id, day(3)), &couple.alice)
        .await
        .unwrap();

    let balance = engine.balance(&couple.bob).await.unwrap();
    assert_eq!(
        balance.total_a,
        MoneyCents::new(3 * MAX_AMOUNT_CENTS + 1)
    );
    assert_eq!(
        balance.owes_b,
        MoneyCents::new(3 * MAX_AMOUNT_CENTS + 1).to_decimal() / Decimal::TWO
    );
}

#[tokio::test]
async fn recording_a_transfer_settles_the_couple() {
    let engine = engine_with_mode(SettlementMode::PerExpenseShared).await;
    let couple = paired_couple(&engine).await;

    engine
        .create_expense(expense("groceries", 40_00, couple.alice_id, day(1)), &couple.alice)
        .await
        .unwrap();
    let balance = engine.balance(&couple.alice).await.unwrap();
    assert_eq!(balance.owes_b, Decimal::new(20_00, 2));

    let mut transfer = expense("settle up", 20_00, couple.bob_id, day(2));
    transfer.category = Category::Transfer;
    let recorded = engine.create_expense(transfer, &couple.bob).await.unwrap();
    assert!(!recorded.shared);

    let balance = engine.balance(&couple.alice).await.unwrap();
    assert_eq!(balance.transferred_b, MoneyCents::new(20_00));
    assert_eq!(balance.total_b, MoneyCents::ZERO);
    assert_eq!(balance.settlement(), None);
}
