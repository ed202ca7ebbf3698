use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use jsonwebtoken::{encode, EncodingKey, Header};
use tracing::{info, warn};
use uuid::Uuid;

use finetrack_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use finetrack_types::models::{IdentityKind, Role};

use crate::error::ApiError;
use crate::state::{with_db, AppState};

/// Tokens expire after 24 hours.
const TOKEN_TTL_HOURS: i64 = 24;

/// One message for both unknown-account and wrong-password failures, so
/// responses do not leak which accounts exist.
const INVALID_CREDENTIALS: &str = "invalid credentials";

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    for (field, value) in [
        ("name", &req.name),
        ("email", &req.email),
        ("phone_number", &req.phone_number),
        ("license_number", &req.license_number),
        ("address", &req.address),
        ("date_of_birth", &req.date_of_birth),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::Validation(format!("{field} is required")));
        }
    }
    if !req.email.contains('@') {
        return Err(ApiError::Validation("email is malformed".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }

    let password_hash = hash_password(&req.password)?;
    let user_id = Uuid::new_v4();

    // The unique indexes on email and license_number catch races; this
    // insert is the authoritative duplicate check.
    let id = user_id.to_string();
    let license = req.license_number.clone();
    with_db(&state, move |db| {
        db.create_user(
            &id,
            &req.name,
            &req.email,
            &req.phone_number,
            &req.license_number,
            &password_hash,
            &req.address,
            &req.date_of_birth,
        )
    })
    .await?;

    // Reconciliation: link violations filed against this license before
    // the account existed. Best-effort — a failure here is logged and
    // must never fail the registration that already committed.
    let uid = user_id.to_string();
    let linked_violations =
        match with_db(&state, move |db| db.link_violations_to_user(&uid, &license)).await {
            Ok(n) => {
                if n > 0 {
                    info!("linked {} existing violations to user {}", n, user_id);
                }
                n
            }
            Err(e) => {
                warn!("violation reconciliation failed for {}: {}", user_id, e);
                0
            }
        };

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id,
            linked_violations,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.clone();
    let kind = req.user_type;

    // (id, name, email, password hash, normalized role)
    let account = with_db(&state, move |db| match kind {
        IdentityKind::User => Ok(db
            .get_user_by_email(&email)?
            .map(|u| (u.id, u.name, u.email, u.password, Role::User))),
        IdentityKind::Officer => Ok(db.get_officer_by_email(&email)?.map(|o| {
            // Elevated officers carry role 'admin' in their row; the
            // token gets the enum, decided here once.
            let role = Role::parse(&o.role).unwrap_or(Role::Officer);
            (o.id, o.name, o.email, o.password, role)
        })),
        IdentityKind::Admin => Ok(db
            .get_admin_by_email(&email)?
            .map(|a| (a.id, a.name, a.email, a.password, Role::Admin))),
    })
    .await?;

    let (id, name, email, password_hash, role) =
        account.ok_or_else(|| ApiError::Auth(INVALID_CREDENTIALS.into()))?;

    verify_password(&req.password, &password_hash)?;

    let sub: Uuid = id
        .parse()
        .map_err(|_| ApiError::Dependency(format!("corrupt account id {id}")))?;
    let token = issue_token(&state.jwt_secret, sub, &email, kind, role)?;

    Ok(Json(LoginResponse {
        token,
        id: sub,
        name,
        email,
        kind,
        role,
    }))
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ApiError::Dependency(format!("password hashing failed: {e}")))
}

fn verify_password(password: &str, stored_hash: &str) -> Result<(), ApiError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| ApiError::Dependency(format!("corrupt password hash: {e}")))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| ApiError::Auth(INVALID_CREDENTIALS.into()))
}

pub fn issue_token(
    secret: &str,
    sub: Uuid,
    email: &str,
    kind: IdentityKind,
    role: Role,
) -> Result<String, ApiError> {
    let claims = Claims {
        sub,
        email: email.to_string(),
        kind,
        role,
        exp: (chrono::Utc::now() + chrono::Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Dependency(format!("token issuance failed: {e}")))
}
