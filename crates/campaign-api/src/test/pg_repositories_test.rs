//! Repository tests against a real PostgreSQL schema.
//!
//! `sqlx::test` creates a throwaway database per test and applies
//! `migrations/`. Run with `DATABASE_URL` set and `--include-ignored`.

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::PgPool;

use crate::database::postgres::{
    PgAccessRepository, PgActRepository, PgLotRepository, PgReportRepository,
};
use crate::domain::{
    ActFilter, ActInput, DomainError, HistoryAction, HistoryNote, LotInput, LotStatus,
    Observation, ReportFilter, ReportKind, UserRecord,
};
use crate::repositories::{AccessRepository, ActRepository, LotRepository, ReportRepository};
use crate::utils::PageRequest;

struct Seed {
    user_id: i32,
    technician_id: i32,
    customers: Vec<i32>,
    meters: Vec<i32>,
}

async fn seed(pool: &PgPool, count: usize) -> Seed {
    let user_id: i32 = sqlx::query_scalar(
        "INSERT INTO users (username, name, password_hash, role_id) \
         SELECT 'admin', 'Administrador', 'x', id FROM roles WHERE name = 'Administrador' \
         RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap();

    let technician_id: i32 =
        sqlx::query_scalar("INSERT INTO technicians (dni, name) VALUES ('40000001', 'Luis Ramos') RETURNING id")
            .fetch_one(pool)
            .await
            .unwrap();

    let mut customers = Vec::new();
    let mut meters = Vec::new();
    for n in 0..count {
        let customer: i32 = sqlx::query_scalar(
            "INSERT INTO customers (inscription, name, address) VALUES ($1, $2, 'Jr. Lima 123') RETURNING id",
        )
        .bind(format!("INS-{}", n))
        .bind(format!("Cliente {}", n))
        .fetch_one(pool)
        .await
        .unwrap();
        let meter: i32 =
            sqlx::query_scalar("INSERT INTO meter_renovations (serial) VALUES ($1) RETURNING id")
                .bind(format!("MX-{}", n))
                .fetch_one(pool)
                .await
                .unwrap();
        customers.push(customer);
        meters.push(meter);
    }

    Seed {
        user_id,
        technician_id,
        customers,
        meters,
    }
}

fn lot_input(name: &str, status: Option<LotStatus>) -> LotInput {
    LotInput {
        name: name.into(),
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        status,
    }
}

fn installed(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, day)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

fn act_input(seed: &Seed, n: usize, file_number: &str, lot_id: i32) -> ActInput {
    ActInput {
        file_number: file_number.into(),
        installed_at: installed(n as u32 + 1),
        reading: 10.0 + n as f64,
        observation: Observation::None,
        customer_id: seed.customers[n],
        technician_id: seed.technician_id,
        meter_id: seed.meters[n],
        lot_id,
    }
}

fn note(seed: &Seed) -> HistoryNote {
    HistoryNote::new(seed.user_id, "prueba")
}

async fn active_lot_ids(pool: &PgPool) -> Vec<i32> {
    sqlx::query_scalar("SELECT id FROM lots WHERE status = 'ACTIVE' ORDER BY id")
        .fetch_all(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
async fn creating_an_active_lot_deactivates_the_previous_one(pool: PgPool) {
    let lots = PgLotRepository::new(pool.clone());

    let first = lots.create(&lot_input("Lote A", Some(LotStatus::Active))).await.unwrap();
    assert_eq!(active_lot_ids(&pool).await, vec![first.id]);

    let second = lots.create(&lot_input("Lote B", Some(LotStatus::Active))).await.unwrap();
    assert_eq!(active_lot_ids(&pool).await, vec![second.id]);

    let first = lots.find_by_id(first.id).await.unwrap().unwrap();
    assert_eq!(first.status, LotStatus::Inactive);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
async fn activation_is_idempotent(pool: PgPool) {
    let lots = PgLotRepository::new(pool.clone());
    let lot = lots.create(&lot_input("Lote A", None)).await.unwrap();

    lots.activate(lot.id).await.unwrap();
    let again = lots.activate(lot.id).await.unwrap();

    assert_eq!(again.status, LotStatus::Active);
    assert_eq!(active_lot_ids(&pool).await, vec![lot.id]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
async fn deleting_the_active_lot_promotes_the_newest_live_lot(pool: PgPool) {
    let lots = PgLotRepository::new(pool.clone());
    let oldest = lots.create(&lot_input("Lote A", None)).await.unwrap();
    let newest = lots.create(&lot_input("Lote B", None)).await.unwrap();
    let active = lots.create(&lot_input("Lote C", Some(LotStatus::Active))).await.unwrap();

    let deletion = lots.delete(active.id).await.unwrap();

    assert_eq!(deletion.deleted.id, active.id);
    assert_eq!(deletion.deleted.status, LotStatus::Inactive);
    let promoted = deletion.promoted.unwrap();
    assert_eq!(promoted.id, newest.id);
    assert_eq!(promoted.status, LotStatus::Active);
    assert_eq!(active_lot_ids(&pool).await, vec![newest.id]);
    assert_ne!(promoted.id, oldest.id);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
async fn deleting_the_last_lot_leaves_none_active(pool: PgPool) {
    let lots = PgLotRepository::new(pool.clone());
    let only = lots.create(&lot_input("Lote A", Some(LotStatus::Active))).await.unwrap();

    let deletion = lots.delete(only.id).await.unwrap();

    assert!(deletion.promoted.is_none());
    assert!(lots.find_active().await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
async fn act_creation_writes_one_history_row(pool: PgPool) {
    let seed = seed(&pool, 1).await;
    let lot = PgLotRepository::new(pool.clone())
        .create(&lot_input("Lote A", Some(LotStatus::Active)))
        .await
        .unwrap();
    let acts = PgActRepository::new(pool.clone());

    let act = acts.create(&act_input(&seed, 0, "1001", lot.id), &note(&seed)).await.unwrap();

    assert_eq!(act.file_number, "1001");
    assert_eq!(act.created_by, seed.user_id);
    let history = acts.history(act.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action, HistoryAction::Create);
    assert_eq!(history[0].user_id, seed.user_id);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
async fn soft_deleted_act_is_hidden_but_kept(pool: PgPool) {
    let seed = seed(&pool, 2).await;
    let lot = PgLotRepository::new(pool.clone())
        .create(&lot_input("Lote A", None))
        .await
        .unwrap();
    let acts = PgActRepository::new(pool.clone());
    let kept = acts.create(&act_input(&seed, 0, "1001", lot.id), &note(&seed)).await.unwrap();
    let gone = acts.create(&act_input(&seed, 1, "1002", lot.id), &note(&seed)).await.unwrap();

    acts.soft_delete(gone.id, &note(&seed)).await.unwrap();

    let page = acts
        .list(&ActFilter::default(), PageRequest { page: 1, limit: 10 })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].id, kept.id);
    assert!(acts.find_by_id(gone.id).await.unwrap().is_none());

    let deleted_by: Option<i32> = sqlx::query_scalar("SELECT deleted_by FROM acts WHERE id = $1")
        .bind(gone.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(deleted_by, Some(seed.user_id));

    let deletes: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM act_history WHERE act_id = $1 AND action = 'DELETE'",
    )
    .bind(gone.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(deletes, 1);

    let err = acts.soft_delete(gone.id, &note(&seed)).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
async fn live_duplicate_file_number_is_rejected(pool: PgPool) {
    let seed = seed(&pool, 3).await;
    let lot = PgLotRepository::new(pool.clone())
        .create(&lot_input("Lote A", None))
        .await
        .unwrap();
    let acts = PgActRepository::new(pool.clone());
    let first = acts.create(&act_input(&seed, 0, "1001", lot.id), &note(&seed)).await.unwrap();

    let err = acts
        .create(&act_input(&seed, 1, "1001", lot.id), &note(&seed))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::DuplicateFileNumber));

    // A soft-deleted act frees its file number.
    acts.soft_delete(first.id, &note(&seed)).await.unwrap();
    acts.create(&act_input(&seed, 2, "1001", lot.id), &note(&seed)).await.unwrap();
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
async fn acts_cannot_point_at_deleted_lots_or_technicians(pool: PgPool) {
    let seed = seed(&pool, 2).await;
    let lots = PgLotRepository::new(pool.clone());
    let live = lots.create(&lot_input("Lote A", None)).await.unwrap();
    let dead = lots.create(&lot_input("Lote B", None)).await.unwrap();
    lots.delete(dead.id).await.unwrap();
    let acts = PgActRepository::new(pool.clone());

    let err = acts
        .create(&act_input(&seed, 0, "1001", dead.id), &note(&seed))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(ref msg) if msg == "Lote no encontrado"));

    let act = acts.create(&act_input(&seed, 0, "1001", live.id), &note(&seed)).await.unwrap();
    sqlx::query("UPDATE technicians SET deleted_at = NOW() WHERE id = $1")
        .bind(seed.technician_id)
        .execute(&pool)
        .await
        .unwrap();

    let err = acts
        .update(act.id, &act_input(&seed, 0, "1001", live.id), &note(&seed))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(ref msg) if msg == "Técnico no encontrado"));

    let err = acts
        .create(&act_input(&seed, 1, "1002", live.id), &note(&seed))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(ref msg) if msg == "Técnico no encontrado"));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
async fn users_cannot_be_given_a_deleted_role(pool: PgPool) {
    let role_id: i32 = sqlx::query_scalar(
        "INSERT INTO roles (name, deleted_at) VALUES ('Supervisor', NOW()) RETURNING id",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    let access = PgAccessRepository::new(pool.clone());

    let err = access
        .create_user(&UserRecord {
            username: "jperez".into(),
            name: "Juan Pérez".into(),
            password_hash: Some("x".into()),
            role_id,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(ref msg) if msg == "Rol no encontrado"));

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(users, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
async fn session_disappears_with_the_user(pool: PgPool) {
    let seed = seed(&pool, 0).await;
    let access = PgAccessRepository::new(pool.clone());

    let session = access.find_session(seed.user_id).await.unwrap().unwrap();
    assert_eq!(session.user.username, "admin");
    assert!(session.permissions.iter().any(|p| p == "report.export"));

    sqlx::query("UPDATE users SET deleted_at = NOW() WHERE id = $1")
        .bind(seed.user_id)
        .execute(&pool)
        .await
        .unwrap();
    assert!(access.find_session(seed.user_id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
async fn report_batches_cover_every_row_once(pool: PgPool) {
    let seed = seed(&pool, 5).await;
    let lot = PgLotRepository::new(pool.clone())
        .create(&lot_input("Lote A", None))
        .await
        .unwrap();
    let acts = PgActRepository::new(pool.clone());
    for n in 0..5 {
        let file_number = format!("{}", 1001 + n);
        acts.create(&act_input(&seed, n, &file_number, lot.id), &note(&seed))
            .await
            .unwrap();
    }

    let rows = PgReportRepository::new(pool.clone())
        .fetch_all(ReportKind::Acts, &ReportFilter::Lot(lot.id), 2)
        .await
        .unwrap();

    let file_numbers: Vec<&str> = rows.iter().map(|r| r.file_number.as_str()).collect();
    assert_eq!(file_numbers, vec!["1001", "1002", "1003", "1004", "1005"]);
    assert!(rows.iter().all(|r| r.last_user.as_deref() == Some("admin")));
}
