//! Authentication Handlers
//!
//! Signup, login and the current-user lookup. All three answer with an
//! [`AuthPayload`] inside the standard envelope.

use std::time::Duration;

use axum::{Json, extract::State};
use validator::ValidateEmail;

use crate::auth::{CurrentUser, MIN_PASSWORD_LEN, hash_password, verify_password};
use crate::core::ServerState;
use crate::db::repository::RepoError;
use crate::db::repository::user::{self, NewUser};
use crate::error::{ServiceError, ServiceResult};
use crate::security_log;
use shared::client::{LoginRequest, SignupRequest};
use shared::models::{Role, User};
use shared::{ApiResponse, AppError, AuthPayload, ErrorCode};

/// Fixed delay on login so a missing account and a wrong password take
/// the same time
const AUTH_FIXED_DELAY_MS: u64 = 100;

fn issue_token(state: &ServerState, user: &User) -> Result<String, AppError> {
    state
        .jwt_service()
        .generate_token(&user.id, &user.name, user.role)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {e}")))
}

/// `POST /api/auth/signup`
pub async fn signup(
    State(state): State<ServerState>,
    Json(req): Json<SignupRequest>,
) -> ServiceResult<Json<ApiResponse<AuthPayload>>> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::invalid_field("name", "Name is required").into());
    }

    let email = req.email.trim().to_lowercase();
    if !email.validate_email() {
        return Err(AppError::invalid_field("email", "Invalid email address").into());
    }

    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::new(ErrorCode::PasswordTooShort)
            .with_detail("min_length", MIN_PASSWORD_LEN)
            .into());
    }

    let role = req.role.unwrap_or_default();
    if role == Role::Admin {
        security_log!("WARN", "admin_signup_rejected", email = email.clone());
        return Err(AppError::forbidden("Admin accounts cannot be self-registered").into());
    }

    if let Some(location) = &req.location {
        location.validate()?;
    }

    if user::email_exists(state.pool(), &email).await? {
        return Err(AppError::new(ErrorCode::EmailAlreadyRegistered).into());
    }

    let password_hash = hash_password(&req.password)
        .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))?;

    let phone = req
        .phone
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    let created = user::create(
        state.pool(),
        NewUser {
            name,
            email,
            phone,
            password_hash,
            role,
            location: req.location,
        },
    )
    .await
    .map_err(|e| match e {
        // lost a race with a concurrent signup for the same address
        RepoError::Duplicate(_) => AppError::new(ErrorCode::EmailAlreadyRegistered).into(),
        other => ServiceError::from(other),
    })?;

    let token = issue_token(&state, &created)?;
    tracing::info!(user_id = %created.id, role = %created.role, "User registered");

    Ok(Json(ApiResponse::success_with_message(
        "Account created",
        AuthPayload {
            user: created,
            token: Some(token),
        },
    )))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> ServiceResult<Json<ApiResponse<AuthPayload>>> {
    let email = req.email.trim().to_lowercase();
    let row = user::find_by_email(state.pool(), &email).await?;

    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    // same error for unknown email and bad password
    let row = match row {
        Some(row) if verify_password(&req.password, &row.password_hash) => row,
        Some(_) => {
            security_log!("WARN", "login_failed", email = email, reason = "invalid_password");
            return Err(AppError::invalid_credentials().into());
        }
        None => {
            security_log!("WARN", "login_failed", email = email, reason = "user_not_found");
            return Err(AppError::invalid_credentials().into());
        }
    };

    let logged_in = row.into_user();
    let token = issue_token(&state, &logged_in)?;
    security_log!("INFO", "login_success", user_id = logged_in.id.clone());

    Ok(Json(ApiResponse::success_with_message(
        "Login successful",
        AuthPayload {
            user: logged_in,
            token: Some(token),
        },
    )))
}

/// `GET /api/auth/me`
pub async fn me(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> ServiceResult<Json<ApiResponse<AuthPayload>>> {
    // token may outlive the account
    let found = user::find_by_id(state.pool(), &current.id)
        .await?
        .ok_or_else(|| AppError::with_message(ErrorCode::NotAuthenticated, "User no longer exists"))?;

    Ok(Json(ApiResponse::success(AuthPayload {
        user: found,
        token: None,
    })))
}
