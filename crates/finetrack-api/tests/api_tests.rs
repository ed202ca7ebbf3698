//! Router-level tests: every request goes through the real middleware,
//! handlers and an in-memory SQLite database.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use finetrack_api::auth::{hash_password, issue_token};
use finetrack_api::state::{AppState, AppStateInner};
use finetrack_db::Database;
use finetrack_types::models::{IdentityKind, Role};

const SECRET: &str = "test-secret";

struct TestApp {
    router: axum::Router,
    state: AppState,
    _uploads: tempfile::TempDir,
}

fn test_app() -> TestApp {
    let uploads = tempfile::tempdir().unwrap();
    let state: AppState = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        jwt_secret: SECRET.into(),
        upload_dir: uploads.path().to_path_buf(),
    });
    TestApp {
        router: finetrack_api::router(state.clone()),
        state,
        _uploads: uploads,
    }
}

fn bearer(id: Uuid, email: &str, kind: IdentityKind, role: Role) -> String {
    format!("Bearer {}", issue_token(SECRET, id, email, kind, role).unwrap())
}

fn seed_officer(app: &TestApp) -> (Uuid, String) {
    let id = Uuid::new_v4();
    app.state
        .db
        .create_officer(
            &id.to_string(),
            "Officer Kwan",
            "kwan@pd.example",
            "555-0100",
            "officer",
            &hash_password("patrol-pass-1").unwrap(),
        )
        .unwrap();
    (id, bearer(id, "kwan@pd.example", IdentityKind::Officer, Role::Officer))
}

fn seed_admin(app: &TestApp) -> String {
    let id = Uuid::new_v4();
    app.state
        .db
        .create_admin(
            &id.to_string(),
            "Root Admin",
            "admin@example.com",
            &hash_password("admin-pass-1").unwrap(),
        )
        .unwrap();
    bearer(id, "admin@example.com", IdentityKind::Admin, Role::Admin)
}

fn json_request(method: &str, uri: &str, auth: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, auth: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, auth)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::http::Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn register_body(name: &str, email: &str, license: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "email": email,
        "phone_number": "555-0199",
        "license_number": license,
        "password": "citizen-pass-1",
        "address": "12 Elm St",
        "date_of_birth": "1990-04-01",
    })
}

fn multipart_payment(violation_id: &str, amount: &str, filename: &str, content_type: &str) -> Request<Body> {
    let b = "finetrack-test-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"violation_id\"\r\n\r\n{violation_id}\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"amount\"\r\n\r\n{amount}\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"receipt\"; filename=\"{filename}\"\r\n\
         Content-Type: {content_type}\r\n\r\nnot-a-real-image\r\n--{b}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri("/payments")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={b}"))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let app = test_app();
    let response = app
        .router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = test_app();
    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/users/profile").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .router
        .oneshot(get_request("/users/profile", "Bearer not-a-token"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn registration_then_login_round_trip() {
    let app = test_app();
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            register_body("Jane Doe", "jane@example.com", "DL-100"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["linked_violations"], 0);

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            serde_json::json!({
                "email": "jane@example.com",
                "password": "citizen-pass-1",
                "userType": "user",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let login = body_json(response).await;
    let token = login["token"].as_str().unwrap().to_string();

    let response = app
        .router
        .oneshot(get_request("/users/profile", &format!("Bearer {token}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let profile = body_json(response).await;
    assert_eq!(profile["license_number"], "DL-100");
}

#[tokio::test]
async fn duplicate_registration_is_a_conflict() {
    let app = test_app();
    for (email, license, expected) in [
        ("jane@example.com", "DL-100", StatusCode::CREATED),
        ("jane@example.com", "DL-200", StatusCode::BAD_REQUEST),
        ("other@example.com", "DL-100", StatusCode::BAD_REQUEST),
    ] {
        let response = app
            .router
            .clone()
            .oneshot(json_request(
                "POST",
                "/auth/register",
                None,
                register_body("Jane Doe", email, license),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), expected, "case {email}/{license}");
    }

    // The first registration is intact.
    assert!(app.state.db.get_user_by_email("jane@example.com").unwrap().is_some());
    assert!(app.state.db.get_user_by_license("DL-200").unwrap().is_none());
}

#[tokio::test]
async fn failed_logins_are_indistinguishable() {
    let app = test_app();
    app.router
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            register_body("Jane Doe", "jane@example.com", "DL-100"),
        ))
        .await
        .unwrap();

    let wrong_password = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            serde_json::json!({
                "email": "jane@example.com",
                "password": "wrong-password",
                "userType": "user",
            }),
        ))
        .await
        .unwrap();
    let unknown_email = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            serde_json::json!({
                "email": "nobody@example.com",
                "password": "citizen-pass-1",
                "userType": "user",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(wrong_password).await, body_json(unknown_email).await);
}

#[tokio::test]
async fn citizens_cannot_file_violations() {
    let app = test_app();
    let token = bearer(Uuid::new_v4(), "jane@example.com", IdentityKind::User, Role::User);
    let response = app
        .router
        .oneshot(json_request(
            "POST",
            "/violations",
            Some(&token),
            serde_json::json!({
                "license_number": "DL-100",
                "citizen_name": "Jane Doe",
                "violation_type": "Speeding",
                "description": "72 in a 50 zone",
                "fine_amount": 500.0,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn filing_requires_a_positive_fine() {
    let app = test_app();
    let (_, officer_token) = seed_officer(&app);
    for bad_fine in [0.0, -25.0] {
        let response = app
            .router
            .clone()
            .oneshot(json_request(
                "POST",
                "/violations",
                Some(&officer_token),
                serde_json::json!({
                    "license_number": "DL-100",
                    "citizen_name": "Jane Doe",
                    "violation_type": "Speeding",
                    "description": "desc",
                    "fine_amount": bad_fine,
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "fine {bad_fine}");
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn filing_requires_a_violator_identity() {
    let app = test_app();
    let (_, officer_token) = seed_officer(&app);
    let response = app
        .router
        .oneshot(json_request(
            "POST",
            "/violations",
            Some(&officer_token),
            serde_json::json!({
                "violation_type": "Speeding",
                "description": "desc",
                "fine_amount": 100.0,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_routes_reject_non_admin_roles() {
    let app = test_app();
    let (_, officer_token) = seed_officer(&app);
    let response = app
        .router
        .oneshot(get_request("/admin/dashboard", &officer_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn elevated_officers_pass_admin_gates() {
    let app = test_app();
    let id = Uuid::new_v4();
    app.state
        .db
        .create_officer(
            &id.to_string(),
            "Chief Adisa",
            "chief@pd.example",
            "555-0101",
            "admin",
            &hash_password("chief-pass-1").unwrap(),
        )
        .unwrap();
    // Role normalization at issuance gives the elevated officer an
    // admin-role token while the kind stays officer.
    let token = bearer(id, "chief@pd.example", IdentityKind::Officer, Role::Admin);
    let response = app
        .router
        .oneshot(get_request("/admin/dashboard", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn rejected_receipt_leaves_no_payment_row() {
    let app = test_app();
    let (officer_id, _) = seed_officer(&app);
    let violation_id = Uuid::new_v4().to_string();
    app.state
        .db
        .insert_violation(
            &violation_id,
            None,
            &officer_id.to_string(),
            "Speeding",
            "desc",
            500.0,
            Some("DL-100"),
            Some("Jane Doe"),
        )
        .unwrap();

    let jane = bearer(Uuid::new_v4(), "jane@example.com", IdentityKind::User, Role::User);
    for (filename, content_type) in [
        ("receipt.exe", "application/octet-stream"),
        ("receipt.exe", "image/png"),
        ("receipt.png", "application/octet-stream"),
    ] {
        let mut request = multipart_payment(&violation_id, "500", filename, content_type);
        request
            .headers_mut()
            .insert(header::AUTHORIZATION, jane.parse().unwrap());
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{filename} as {content_type}");
    }

    assert!(app.state.db.payments_for_violation(&violation_id).unwrap().is_empty());
    let row = app.state.db.get_violation_detail(&violation_id).unwrap().unwrap();
    assert!(!row.payment_submitted);
}

#[tokio::test]
async fn confirm_unknown_payment_is_404() {
    let app = test_app();
    let admin_token = seed_admin(&app);
    let response = app
        .router
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/admin/payments/{}/confirm", Uuid::new_v4()))
                .header(header::AUTHORIZATION, &admin_token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn status_override_is_admin_only() {
    let app = test_app();
    let (officer_id, officer_token) = seed_officer(&app);
    let admin_token = seed_admin(&app);
    let violation_id = Uuid::new_v4().to_string();
    app.state
        .db
        .insert_violation(
            &violation_id,
            None,
            &officer_id.to_string(),
            "Parking",
            "desc",
            100.0,
            Some("DL-300"),
            Some("John Roe"),
        )
        .unwrap();

    let body = serde_json::json!({ "payment_status": "Paid" });
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/violations/{violation_id}/status"),
            Some(&officer_token),
            body.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .router
        .oneshot(json_request(
            "PUT",
            &format!("/violations/{violation_id}/status"),
            Some(&admin_token),
            body,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let row = app.state.db.get_violation_detail(&violation_id).unwrap().unwrap();
    assert_eq!(row.payment_status, "Paid");
}

/// The whole lifecycle over HTTP: unregistered filing, registration
/// with reconciliation, payment submission, admin confirmation.
#[tokio::test]
async fn unregistered_filing_to_settlement() {
    let app = test_app();
    let (_, officer_token) = seed_officer(&app);

    // Officer files against license DL-100, no account behind it.
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/violations",
            Some(&officer_token),
            serde_json::json!({
                "license_number": "DL-100",
                "citizen_name": "Jane Doe",
                "violation_type": "Speeding",
                "description": "72 in a 50 zone",
                "fine_amount": 500.0,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let violation_id = body_json(response).await["violation_id"].as_str().unwrap().to_string();
    assert!(app
        .state
        .db
        .get_violation_detail(&violation_id)
        .unwrap()
        .unwrap()
        .user_id
        .is_none());

    // Jane registers; reconciliation links the filing to her account.
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            register_body("Jane Doe", "jane@example.com", "DL-100"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["linked_violations"], 1);
    let jane_id: Uuid = body["user_id"].as_str().unwrap().parse().unwrap();
    let jane_token = bearer(jane_id, "jane@example.com", IdentityKind::User, Role::User);

    let response = app
        .router
        .clone()
        .oneshot(get_request("/users/violations", &jane_token))
        .await
        .unwrap();
    let mine = body_json(response).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);

    // Jane submits a payment with a receipt: flagged, not settled.
    let mut request = multipart_payment(&violation_id, "500", "receipt.png", "image/png");
    request
        .headers_mut()
        .insert(header::AUTHORIZATION, jane_token.parse().unwrap());
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let payment_id = body_json(response).await["payment_id"].as_str().unwrap().to_string();

    let row = app.state.db.get_violation_detail(&violation_id).unwrap().unwrap();
    assert!(row.payment_submitted);
    assert_eq!(row.payment_status, "Pending");

    // Admin confirms: payment Confirmed and violation Paid together.
    let admin_token = seed_admin(&app);
    let response = app
        .router
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/admin/payments/{payment_id}/confirm"))
                .header(header::AUTHORIZATION, &admin_token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let row = app.state.db.get_violation_detail(&violation_id).unwrap().unwrap();
    assert_eq!(row.payment_status, "Paid");
    let payments = app.state.db.payments_for_violation(&violation_id).unwrap();
    assert_eq!(payments[0].status, "Confirmed");
}
