//! HTTP-level tests: the real router over mocked repositories.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::auth::{JwtManager, TokenSubject};
use crate::config::{
    AuthConfig, DatabaseConfig, PaginationConfig, ReportConfig, ServerConfig, Settings,
};
use crate::domain::act::fixtures::act;
use crate::domain::error::MSG_DUPLICATE_FILE_NUMBER;
use crate::domain::{
    permissions, DomainError, Lot, LotStatus, ReportFilter, ReportKind, ReportRow, User,
    UserSession,
};
use crate::repositories::{
    MockAccessRepository, MockActRepository, MockCatalogRepository, MockHealthCheck,
    MockLabeledRepository, MockLotRepository, MockPreCatastralRepository, MockReportRepository,
};
use crate::router::build_router;
use crate::services::report::XLSX_CONTENT_TYPE;
use crate::state::{AppState, Repositories};
use crate::utils::Paged;

const SECRET: &str = "router-test-secret";

#[derive(Default)]
struct Mocks {
    acts: MockActRepository,
    pre_catastrals: MockPreCatastralRepository,
    lots: MockLotRepository,
    labeled: MockLabeledRepository,
    catalog: MockCatalogRepository,
    access: MockAccessRepository,
    reports: MockReportRepository,
    health: MockHealthCheck,
}

fn settings() -> Settings {
    Settings {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
        },
        database: DatabaseConfig {
            url: "postgres://unused".into(),
            pool_max_size: 1,
            pool_timeout_seconds: 1,
            run_migrations: false,
        },
        auth: AuthConfig {
            jwt_secret: SECRET.into(),
            token_expiry_seconds: 3600,
            bootstrap_admin_password: None,
        },
        pagination: PaginationConfig::default(),
        report: ReportConfig { batch_size: 100 },
    }
}

fn app(mocks: Mocks) -> Router {
    let repos = Repositories {
        acts: Arc::new(mocks.acts),
        pre_catastrals: Arc::new(mocks.pre_catastrals),
        lots: Arc::new(mocks.lots),
        labeled: Arc::new(mocks.labeled),
        catalog: Arc::new(mocks.catalog),
        access: Arc::new(mocks.access),
        reports: Arc::new(mocks.reports),
        health: Arc::new(mocks.health),
    };
    build_router(AppState::new(settings(), repos))
}

fn token(user_id: i32, granted: &[&str]) -> String {
    let permissions: Vec<String> = granted.iter().map(|p| p.to_string()).collect();
    JwtManager::new(SECRET, 3600)
        .generate_token(&TokenSubject {
            user_id,
            username: "operador",
            role: "Operador",
            permissions: &permissions,
        })
        .unwrap()
}

/// Registers `user_id` as a live user whose role currently grants `granted`.
fn live_session(mocks: &mut Mocks, user_id: i32, granted: &[&str]) {
    let permissions: Vec<String> = granted.iter().map(|p| p.to_string()).collect();
    mocks
        .access
        .expect_find_session()
        .withf(move |id| *id == user_id)
        .returning(move |id| {
            Ok(Some(UserSession {
                user: User {
                    id,
                    username: "operador".into(),
                    name: "Operador de campo".into(),
                    role_id: 2,
                    role_name: "Operador".into(),
                    created_at: Utc::now(),
                },
                permissions: permissions.clone(),
            }))
        });
}

fn login(mocks: &mut Mocks, user_id: i32, granted: &[&str]) -> String {
    live_session(mocks, user_id, granted);
    token(user_id, granted)
}

fn request(method: &str, uri: &str, bearer: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn act_body(file_number: &str) -> Value {
    json!({
        "file_number": file_number,
        "installed_at": "2024-03-01T10:30:00",
        "reading": 125.5,
        "customer_id": 11,
        "technician_id": 21,
        "meter_id": 31,
        "lot_id": 1
    })
}

fn lot(id: i32, status: LotStatus) -> Lot {
    Lot {
        id,
        name: format!("Lote {}", id),
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        status,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn health_is_public() {
    let response = app(Mocks::default())
        .oneshot(request("GET", "/health", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn readiness_reports_unavailable_database() {
    let mut mocks = Mocks::default();
    mocks
        .health
        .expect_ping()
        .returning(|| Err(DomainError::Database("connection refused".into())));

    let response = app(mocks)
        .oneshot(request("GET", "/health/ready", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let response = app(Mocks::default())
        .oneshot(request("GET", "/api/act/listacts", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app(Mocks::default())
        .oneshot(request("GET", "/api/act/listacts", Some("not-a-jwt"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_permission_is_forbidden() {
    let mut mocks = Mocks::default();
    mocks.acts.expect_create().never();

    let token = login(&mut mocks, 2, &[permissions::ACT_READ]);
    let response = app(mocks)
        .oneshot(request("POST", "/api/act/newact", Some(&token), Some(act_body("1001"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn deleted_user_token_is_rejected() {
    let mut mocks = Mocks::default();
    mocks
        .access
        .expect_find_session()
        .withf(|id| *id == 4)
        .times(1)
        .returning(|_| Ok(None));
    mocks.acts.expect_list().never();

    let token = token(4, &[permissions::ACT_READ]);
    let response = app(mocks)
        .oneshot(request("GET", "/api/act/listacts", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn revoked_permission_is_forbidden_despite_token_claims() {
    let mut mocks = Mocks::default();
    live_session(&mut mocks, 7, &[permissions::ACT_READ]);
    mocks.acts.expect_create().never();

    let token = token(7, &[permissions::ACT_READ, permissions::ACT_WRITE]);
    let response = app(mocks)
        .oneshot(request("POST", "/api/act/newact", Some(&token), Some(act_body("1001"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn new_act_is_created_with_session_user_as_author() {
    let mut mocks = Mocks::default();
    mocks
        .acts
        .expect_create()
        .withf(|input, note| input.file_number == "1001" && note.user_id == 7)
        .times(1)
        .returning(|_, _| Ok(act(1, "1001")));

    let token = login(&mut mocks, 7, &[permissions::ACT_WRITE]);
    let response = app(mocks)
        .oneshot(request("POST", "/api/act/newact", Some(&token), Some(act_body("1001"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["file_number"], "1001");
    assert_eq!(body["message"], "Acta registrada correctamente.");
}

#[tokio::test]
async fn duplicate_file_number_is_rejected_with_message() {
    let mut mocks = Mocks::default();
    mocks
        .acts
        .expect_create()
        .returning(|_, _| Err(DomainError::DuplicateFileNumber));

    let token = login(&mut mocks, 7, &[permissions::ACT_WRITE]);
    let response = app(mocks)
        .oneshot(request("POST", "/api/act/newact", Some(&token), Some(act_body("1001"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], MSG_DUPLICATE_FILE_NUMBER);
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let mut mocks = Mocks::default();
    let token = login(&mut mocks, 7, &[permissions::ACT_WRITE]);
    let response = app(mocks)
        .oneshot(request(
            "POST",
            "/api/act/newact",
            Some(&token),
            Some(json!({ "file_number": "1001" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_act_records_explicit_deleter() {
    let mut mocks = Mocks::default();
    mocks
        .acts
        .expect_find_by_id()
        .withf(|id| *id == 5)
        .returning(|id| Ok(Some(act(id, "1005"))));
    mocks
        .acts
        .expect_soft_delete()
        .withf(|id, note| *id == 5 && note.user_id == 2)
        .times(1)
        .returning(|_, _| Ok(()));

    let token = login(&mut mocks, 9, &[permissions::ACT_DELETE]);
    let response = app(mocks)
        .oneshot(request("DELETE", "/api/act/deleteact?id=5&deleted_by=2", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Registro eliminado correctamente.");
}

#[tokio::test]
async fn get_missing_act_is_not_found() {
    let mut mocks = Mocks::default();
    mocks.acts.expect_find_by_id().returning(|_| Ok(None));

    let token = login(&mut mocks, 9, &[permissions::ACT_READ]);
    let response = app(mocks)
        .oneshot(request("GET", "/api/act/getact?id=404", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_returns_pagination_envelope() {
    let mut mocks = Mocks::default();
    mocks
        .acts
        .expect_list()
        .withf(|filter, page| {
            filter.file_number.as_deref() == Some("10") && page.page == 2 && page.limit == 2
        })
        .returning(|_, _| Ok(Paged::new(vec![act(3, "1003"), act(4, "1004")], 11)));

    let token = login(&mut mocks, 9, &[permissions::ACT_READ]);
    let response = app(mocks)
        .oneshot(request(
            "GET",
            "/api/act/listacts?page=2&limit=2&file_number=10",
            Some(&token),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["total"], 11);
    assert_eq!(body["page"], 2);
    assert_eq!(body["limit"], 2);
    assert_eq!(body["pages"], 6);
}

#[tokio::test]
async fn zero_limit_is_rejected_before_querying() {
    let mut mocks = Mocks::default();
    mocks.acts.expect_list().never();

    let token = login(&mut mocks, 9, &[permissions::ACT_READ]);
    let response = app(mocks)
        .oneshot(request("GET", "/api/act/listacts?limit=0", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn activating_a_lot_returns_it_active() {
    let mut mocks = Mocks::default();
    mocks
        .lots
        .expect_activate()
        .withf(|id| *id == 3)
        .times(1)
        .returning(|id| Ok(lot(id, LotStatus::Active)));

    let token = login(&mut mocks, 1, &[permissions::LOT_WRITE]);
    let response = app(mocks)
        .oneshot(request("PUT", "/api/lot/activatelot?id=3", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["id"], 3);
    assert_eq!(body["data"]["status"], "ACTIVE");
}

#[tokio::test]
async fn no_active_lot_is_not_found() {
    let mut mocks = Mocks::default();
    mocks.lots.expect_find_active().returning(|| Ok(None));

    let token = login(&mut mocks, 1, &[permissions::LOT_READ]);
    let response = app(mocks)
        .oneshot(request("GET", "/api/lot/activelot", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn act_report_is_an_xlsx_attachment() {
    let mut mocks = Mocks::default();
    mocks
        .reports
        .expect_fetch_all()
        .withf(|kind, filter, batch_size| {
            *kind == ReportKind::Acts
                && matches!(filter, ReportFilter::DateRange { .. })
                && *batch_size == 100
        })
        .times(1)
        .returning(|_, _, _| {
            Ok(vec![ReportRow {
                file_number: "1001".into(),
                lot_name: "Lote 1".into(),
                recorded_at: NaiveDate::from_ymd_opt(2024, 1, 15)
                    .unwrap()
                    .and_time(NaiveTime::MIN),
                customer_name: "Ana Quispe".into(),
                address: "Jr. Lima 123".into(),
                old_meter: Some("OLD-1".into()),
                new_meter: Some("MX-31".into()),
                technician_name: "Luis Ramos".into(),
                last_user: Some("admin".into()),
            }])
        });

    let token = login(&mut mocks, 1, &[permissions::REPORT_EXPORT]);
    let response = app(mocks)
        .oneshot(request(
            "GET",
            "/api/report/acts?start=2024-01-01&end=2024-01-31",
            Some(&token),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], XLSX_CONTENT_TYPE);
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"reporte_actas_2024-01-01_a_2024-01-31.xlsx\""
    );
    assert_eq!(headers["x-total-records"], "1");

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.starts_with(b"PK"));
}

#[tokio::test]
async fn report_without_criteria_is_a_bad_request() {
    let mut mocks = Mocks::default();
    mocks.reports.expect_fetch_all().never();

    let token = login(&mut mocks, 1, &[permissions::REPORT_EXPORT]);
    let response = app(mocks)
        .oneshot(request("GET", "/api/report/precatastrals", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
