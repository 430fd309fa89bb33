use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbBackend, Statement};

use engine::{
    DISCREPANCY_CATEGORY, Engine, EngineError, ExternalRecord, MatchKind, MatchRules,
    MovementKind, NewExpense, NewMovement,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn count_rows(db: &DatabaseConnection, table: &str) -> i64 {
    let row = db
        .query_one(Statement::from_string(
            DbBackend::Sqlite,
            format!("SELECT COUNT(*) AS n FROM {table}"),
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get::<i64>("", "n").unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn dec(value: &str) -> Decimal {
    value.parse().unwrap()
}

async fn bank_with_balance(engine: &Engine, name: &str, balance: &str) -> Uuid {
    engine.new_bank(name, dec(balance)).await.unwrap()
}

async fn outflow(engine: &Engine, bank_id: Uuid, amount: &str, on: NaiveDate) -> Uuid {
    engine
        .append_movement(NewMovement::new(MovementKind::Outflow, dec(amount), on).bank_id(bank_id))
        .await
        .unwrap()
}

async fn inflow(engine: &Engine, bank_id: Uuid, amount: &str, on: NaiveDate) -> Uuid {
    engine
        .append_movement(NewMovement::new(MovementKind::Inflow, dec(amount), on).bank_id(bank_id))
        .await
        .unwrap()
}

#[tokio::test]
async fn new_bank_rejects_duplicate_names() {
    let (engine, _db) = engine_with_db().await;

    bank_with_balance(&engine, "Banco Nación", "1000").await;
    let err = engine
        .new_bank("  banco nación ", Decimal::ZERO)
        .await
        .unwrap_err();

    assert_eq!(err, EngineError::ExistingKey("banco nación".to_string()));
    assert_eq!(engine.list_banks().await.unwrap().len(), 1);
}

#[tokio::test]
async fn blank_names_are_rejected() {
    let (engine, _db) = engine_with_db().await;

    let err = engine.new_bank("   ", Decimal::ZERO).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidName("bank name must not be empty".to_string())
    );

    let err = engine
        .record_expense(NewExpense::new(" ", dec("10"), date(2024, 3, 10)))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidName("expense name must not be empty".to_string())
    );
    assert!(engine.list_banks().await.unwrap().is_empty());
}

#[tokio::test]
async fn adjust_balance_returns_new_balance() {
    let (engine, _db) = engine_with_db().await;
    let bank_id = bank_with_balance(&engine, "Galicia", "100.50").await;

    let balance = engine.adjust_balance(bank_id, dec("-20.25")).await.unwrap();

    assert_eq!(balance, dec("80.25"));
    assert_eq!(engine.bank(bank_id).await.unwrap().balance, dec("80.25"));
}

#[tokio::test]
async fn append_movement_requires_existing_bank() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .append_movement(
            NewMovement::new(MovementKind::Inflow, dec("10"), date(2024, 3, 1))
                .bank_id(Uuid::new_v4()),
        )
        .await
        .unwrap_err();

    assert_eq!(err, EngineError::KeyNotFound("bank not exists".to_string()));
}

#[tokio::test]
async fn list_unreconciled_filters_by_bank_and_orders_newest_first() {
    let (engine, _db) = engine_with_db().await;
    let nacion = bank_with_balance(&engine, "Nación", "0").await;
    let galicia = bank_with_balance(&engine, "Galicia", "0").await;

    let old = outflow(&engine, nacion, "10", date(2024, 3, 1)).await;
    let first_same_day = inflow(&engine, nacion, "20", date(2024, 3, 5)).await;
    let second_same_day = inflow(&engine, nacion, "30", date(2024, 3, 5)).await;
    let done = outflow(&engine, nacion, "40", date(2024, 3, 6)).await;
    engine.mark_reconciled(done).await.unwrap();
    outflow(&engine, galicia, "50", date(2024, 3, 7)).await;

    let ids: Vec<Uuid> = engine
        .list_unreconciled(Some(nacion))
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(ids, vec![first_same_day, second_same_day, old]);

    assert_eq!(engine.list_unreconciled(None).await.unwrap().len(), 4);
}

#[tokio::test]
async fn scenario_statement_line_matches_recorded_outflow() {
    let (engine, _db) = engine_with_db().await;
    let bank_id = bank_with_balance(&engine, "Nación", "100000").await;
    let movement_id = engine
        .append_movement(
            NewMovement::new(MovementKind::Outflow, dec("50000"), date(2024, 3, 2))
                .bank_id(bank_id)
                .description("x"),
        )
        .await
        .unwrap();
    let records = vec![ExternalRecord::new(date(2024, 3, 1), "Pago", dec("-50000"))];

    let report = engine
        .reconcile_statement(bank_id, &records, &MatchRules::default())
        .await
        .unwrap();

    let kinds: Vec<MatchKind> = report.results().iter().map(|r| r.kind()).collect();
    assert_eq!(kinds, vec![MatchKind::Match]);
    assert_eq!(report.matched_movement_ids(), vec![movement_id]);

    // Classification alone writes nothing.
    assert!(!engine.movement(movement_id).await.unwrap().reconciled);
}

#[tokio::test]
async fn reconcile_statement_only_sees_the_requested_bank() {
    let (engine, _db) = engine_with_db().await;
    let nacion = bank_with_balance(&engine, "Nación", "0").await;
    let galicia = bank_with_balance(&engine, "Galicia", "0").await;
    let other = outflow(&engine, galicia, "75", date(2024, 3, 1)).await;
    let records = vec![ExternalRecord::new(date(2024, 3, 1), "", dec("-75"))];

    let report = engine
        .reconcile_statement(nacion, &records, &MatchRules::default())
        .await
        .unwrap();

    assert_eq!(report.stats().discrepancies, 1);
    assert_eq!(report.stats().missing, 0);
    assert!(!engine.movement(other).await.unwrap().reconciled);
}

#[tokio::test]
async fn reconcile_statement_unknown_bank_is_not_found() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .reconcile_statement(Uuid::new_v4(), &[], &MatchRules::default())
        .await
        .unwrap_err();

    assert_eq!(err, EngineError::KeyNotFound("bank not exists".to_string()));
}

#[tokio::test]
async fn reconcile_upload_counts_rejected_rows() {
    let (engine, _db) = engine_with_db().await;
    let bank_id = bank_with_balance(&engine, "Nación", "0").await;
    inflow(&engine, bank_id, "15000", date(2024, 3, 5)).await;
    let csv = "Fecha,Descripción,Monto\n\
               2024-03-04,Transferencia,\"$15,000.00\"\n\
               no es fecha,Basura,10\n\
               2024-03-04,Sin monto,\n";

    let outcome = engine.reconcile_upload(bank_id, csv.as_bytes()).await.unwrap();

    assert_eq!(outcome.rejected, 2);
    assert_eq!(outcome.report.stats().matches, 1);
    assert_eq!(outcome.report.stats().discrepancies, 0);
    assert_eq!(outcome.report.stats().missing, 0);
}

#[tokio::test]
async fn reconcile_upload_uses_engine_rules() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db)
        .match_rules(MatchRules {
            amount_epsilon: dec("1"),
            date_window_days: 10,
        })
        .build()
        .await
        .unwrap();
    let bank_id = bank_with_balance(&engine, "Nación", "0").await;
    outflow(&engine, bank_id, "100", date(2024, 3, 1)).await;
    let csv = "Fecha,Monto\n2024-03-09,-100.50\n";

    let outcome = engine.reconcile_upload(bank_id, csv.as_bytes()).await.unwrap();

    assert_eq!(outcome.report.stats().matches, 1);
}

#[tokio::test]
async fn builder_rejects_non_positive_epsilon() {
    let db = Database::connect("sqlite::memory:").await.unwrap();

    let err = Engine::builder()
        .database(db)
        .match_rules(MatchRules {
            amount_epsilon: Decimal::ZERO,
            date_window_days: 3,
        })
        .build()
        .await
        .unwrap_err();

    assert_eq!(
        err,
        EngineError::InvalidAmount("amount_epsilon must be > 0".to_string())
    );
}

#[tokio::test]
async fn reconcile_one_is_idempotent() {
    let (engine, _db) = engine_with_db().await;
    let bank_id = bank_with_balance(&engine, "Nación", "0").await;
    let movement_id = outflow(&engine, bank_id, "10", date(2024, 3, 1)).await;

    engine.reconcile_one(movement_id).await.unwrap();
    engine.reconcile_one(movement_id).await.unwrap();

    assert!(engine.movement(movement_id).await.unwrap().reconciled);
    assert!(engine.list_unreconciled(Some(bank_id)).await.unwrap().is_empty());
}

#[tokio::test]
async fn reconcile_one_unknown_movement_is_not_found() {
    let (engine, _db) = engine_with_db().await;

    let err = engine.reconcile_one(Uuid::new_v4()).await.unwrap_err();

    assert_eq!(
        err,
        EngineError::KeyNotFound("movement not exists".to_string())
    );
}

#[tokio::test]
async fn reconcile_all_matches_flags_only_matched_movements() {
    let (engine, _db) = engine_with_db().await;
    let bank_id = bank_with_balance(&engine, "Nación", "0").await;
    let sale = inflow(&engine, bank_id, "120000", date(2024, 3, 1)).await;
    let rent = outflow(&engine, bank_id, "50000", date(2024, 3, 4)).await;
    let pending = outflow(&engine, bank_id, "999", date(2024, 3, 20)).await;
    let records = vec![
        ExternalRecord::new(date(2024, 3, 2), "Venta", dec("120000")),
        ExternalRecord::new(date(2024, 3, 3), "Alquiler", dec("-50000")),
        ExternalRecord::new(date(2024, 3, 3), "Comisión", dec("-350")),
    ];

    let report = engine
        .reconcile_statement(bank_id, &records, &MatchRules::default())
        .await
        .unwrap();
    let count = engine.reconcile_all_matches(&report).await.unwrap();

    assert_eq!(count, 2);
    assert!(engine.movement(sale).await.unwrap().reconciled);
    assert!(engine.movement(rent).await.unwrap().reconciled);
    let left: Vec<Uuid> = engine
        .list_unreconciled(Some(bank_id))
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(left, vec![pending]);
}

#[tokio::test]
async fn reconcile_all_matches_without_matches_is_zero() {
    let (engine, _db) = engine_with_db().await;
    let bank_id = bank_with_balance(&engine, "Nación", "0").await;
    outflow(&engine, bank_id, "10", date(2024, 3, 1)).await;

    let report = engine
        .reconcile_statement(bank_id, &[], &MatchRules::default())
        .await
        .unwrap();

    assert_eq!(engine.reconcile_all_matches(&report).await.unwrap(), 0);
    assert_eq!(engine.list_unreconciled(Some(bank_id)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn batch_with_unknown_id_changes_nothing() {
    let (engine, _db) = engine_with_db().await;
    let bank_id = bank_with_balance(&engine, "Nación", "0").await;
    let known = outflow(&engine, bank_id, "10", date(2024, 3, 1)).await;

    let err = engine
        .mark_reconciled_batch(&[known, Uuid::new_v4()])
        .await
        .unwrap_err();

    assert_eq!(
        err,
        EngineError::KeyNotFound("movement not exists".to_string())
    );
    assert!(!engine.movement(known).await.unwrap().reconciled);
}

#[tokio::test]
async fn batch_counts_distinct_ids() {
    let (engine, _db) = engine_with_db().await;
    let bank_id = bank_with_balance(&engine, "Nación", "0").await;
    let a = outflow(&engine, bank_id, "10", date(2024, 3, 1)).await;
    let b = outflow(&engine, bank_id, "20", date(2024, 3, 1)).await;

    assert_eq!(engine.mark_reconciled_batch(&[]).await.unwrap(), 0);
    assert_eq!(engine.mark_reconciled_batch(&[a, b, a]).await.unwrap(), 2);
    assert!(engine.list_unreconciled(Some(bank_id)).await.unwrap().is_empty());
}

#[tokio::test]
async fn scenario_discrepancy_is_booked_as_bank_expense() {
    let (engine, _db) = engine_with_db().await;
    let bank_id = bank_with_balance(&engine, "Nación", "100000").await;
    let record = ExternalRecord::new(date(2024, 3, 1), "Comisión", dec("-20000"));

    let report = engine
        .reconcile_statement(bank_id, std::slice::from_ref(&record), &MatchRules::default())
        .await
        .unwrap();
    assert_eq!(report.discrepancies().collect::<Vec<_>>(), vec![&record]);

    let booked = engine.materialize_discrepancy(&record, bank_id).await.unwrap();

    assert_eq!(booked.balance, dec("80000"));
    assert_eq!(engine.bank(bank_id).await.unwrap().balance, dec("80000"));

    let expenses = engine.list_expenses().await.unwrap();
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0].id, booked.expense_id);
    assert_eq!(expenses[0].amount, dec("20000"));
    assert_eq!(expenses[0].category, DISCREPANCY_CATEGORY);
    assert_eq!(expenses[0].description, "Comisión");
    assert_eq!(expenses[0].date, date(2024, 3, 1));

    let movement = engine.movement(booked.movement_id).await.unwrap();
    assert_eq!(movement.kind, MovementKind::Outflow);
    assert_eq!(movement.magnitude, dec("20000"));
    assert_eq!(movement.bank_id, Some(bank_id));
    assert!(movement.reconciled);

    // The booked outflow is already reconciled, so the next run is clean.
    assert!(engine.list_unreconciled(Some(bank_id)).await.unwrap().is_empty());
}

#[tokio::test]
async fn materialize_discrepancy_uses_absolute_amount_and_default_description() {
    let (engine, _db) = engine_with_db().await;
    let bank_id = bank_with_balance(&engine, "Nación", "500").await;
    let record = ExternalRecord::new(date(2024, 3, 1), "  ", dec("120.10"));

    let booked = engine.materialize_discrepancy(&record, bank_id).await.unwrap();

    assert_eq!(booked.balance, dec("379.90"));
    let expenses = engine.list_expenses().await.unwrap();
    assert_eq!(expenses[0].amount, dec("120.10"));
    assert_eq!(expenses[0].description, "Gasto bancario");
}

#[tokio::test]
async fn materialize_discrepancy_unknown_bank_leaves_nothing_behind() {
    let (engine, db) = engine_with_db().await;
    let record = ExternalRecord::new(date(2024, 3, 1), "Comisión", dec("-20000"));

    let err = engine
        .materialize_discrepancy(&record, Uuid::new_v4())
        .await
        .unwrap_err();

    assert_eq!(err, EngineError::KeyNotFound("bank not exists".to_string()));
    assert!(engine.list_expenses().await.unwrap().is_empty());
    assert_eq!(count_rows(&db, "movements").await, 0);
}

#[tokio::test]
async fn materialize_discrepancy_rolls_back_expense_when_balance_update_fails() {
    let (engine, db) = engine_with_db().await;
    let floor = Decimal::new(i64::MIN, 2);
    let bank_id = engine.new_bank("Quebrado", floor).await.unwrap();
    let record = ExternalRecord::new(date(2024, 3, 1), "Comisión", dec("-1"));

    let err = engine
        .materialize_discrepancy(&record, bank_id)
        .await
        .unwrap_err();

    // The expense row is written before the balance overflows.
    assert_eq!(err, EngineError::InvalidAmount("balance overflow".to_string()));
    assert!(engine.list_expenses().await.unwrap().is_empty());
    assert_eq!(count_rows(&db, "expenses").await, 0);
    assert_eq!(count_rows(&db, "movements").await, 0);
    assert_eq!(engine.bank(bank_id).await.unwrap().balance, floor);
}

#[tokio::test]
async fn materialize_discrepancy_rejects_amount_below_one_cent() {
    let (engine, db) = engine_with_db().await;
    let bank_id = bank_with_balance(&engine, "Nación", "500").await;
    let record = ExternalRecord::new(date(2024, 3, 1), "Redondeo", dec("-0.004"));

    let err = engine
        .materialize_discrepancy(&record, bank_id)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        EngineError::InvalidAmount("discrepancy amount must not be zero".to_string())
    );
    assert_eq!(count_rows(&db, "expenses").await, 0);
    assert_eq!(count_rows(&db, "movements").await, 0);
    assert_eq!(engine.bank(bank_id).await.unwrap().balance, dec("500"));
}

#[tokio::test]
async fn materialize_discrepancy_books_rounded_cents() {
    let (engine, _db) = engine_with_db().await;
    let bank_id = bank_with_balance(&engine, "Nación", "10").await;
    let record = ExternalRecord::new(date(2024, 3, 1), "Comisión", dec("-1.005"));

    let booked = engine.materialize_discrepancy(&record, bank_id).await.unwrap();

    assert_eq!(booked.balance, dec("8.99"));
    let expenses = engine.list_expenses().await.unwrap();
    assert_eq!(expenses[0].amount, dec("1.01"));
    let movement = engine.movement(booked.movement_id).await.unwrap();
    assert_eq!(movement.magnitude, dec("1.01"));
}

#[tokio::test]
async fn materialize_discrepancy_rejects_zero_amount() {
    let (engine, _db) = engine_with_db().await;
    let bank_id = bank_with_balance(&engine, "Nación", "500").await;
    let record = ExternalRecord::new(date(2024, 3, 1), "Nada", Decimal::ZERO);

    let err = engine
        .materialize_discrepancy(&record, bank_id)
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::InvalidAmount(_)));
    assert!(engine.list_expenses().await.unwrap().is_empty());
    assert_eq!(engine.bank(bank_id).await.unwrap().balance, dec("500"));
}

#[tokio::test]
async fn record_expense_defaults_category() {
    let (engine, _db) = engine_with_db().await;

    let plain = engine
        .record_expense(NewExpense::new("Luz", dec("3500"), date(2024, 3, 10)))
        .await
        .unwrap();
    let tagged = engine
        .record_expense(
            NewExpense::new("Nafta", dec("800"), date(2024, 3, 11)).category("Movilidad"),
        )
        .await
        .unwrap();

    let expenses = engine.list_expenses().await.unwrap();
    let ids: Vec<Uuid> = expenses.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![tagged, plain]);
    assert_eq!(expenses[0].category, "Movilidad");
    assert_eq!(expenses[1].category, DISCREPANCY_CATEGORY);
}

#[tokio::test]
async fn record_expense_rejects_non_positive_amount() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .record_expense(NewExpense::new("Luz", Decimal::ZERO, date(2024, 3, 10)))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        EngineError::InvalidAmount("expense amount must be > 0".to_string())
    );
}
