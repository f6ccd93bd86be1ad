//! Registration, login, and session/profile endpoints.

use crate::auth::{BearerToken, CurrentUser};
use crate::{ApiResponse, AppError, AppState};
use axum::http::StatusCode;
use axum::{
    extract::State,
    routing::{get, post, put},
    Extension, Json, Router,
};
use credentials::validate::{is_valid_email, is_valid_name, is_valid_password};
use credentials::{hash_password, verify_password};
use portfolio_store::activity::log_activity;
use portfolio_store::{NewUser, UserProfile};
use serde::{Deserialize, Serialize};

const DEFAULT_PREFERENCES: &str = r#"{"notifications":true,"newsletter":false,"dark_mode":true}"#;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub phone: Option<String>,
    pub country: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub preferences: Option<serde_json::Value>,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct AuthData {
    pub user: UserProfile,
    pub token: String,
}

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/verify", get(verify))
        .route("/api/auth/profile", get(get_profile))
        .route("/api/auth/profile", put(update_profile))
        .route("/api/auth/password", put(change_password))
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthData>>), AppError> {
    let first_name = req.first_name.trim().to_string();
    let last_name = req.last_name.trim().to_string();
    let email = req.email.trim().to_lowercase();

    if !is_valid_name(&first_name) || !is_valid_name(&last_name) {
        return Err(AppError::Validation(
            "First and last name must be at least 2 characters".to_string(),
        ));
    }
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email format".to_string()));
    }
    if !is_valid_password(&req.password) {
        return Err(AppError::Validation(
            "Password must be at least 6 characters".to_string(),
        ));
    }
    if req.password != req.confirm_password {
        return Err(AppError::Validation("Passwords do not match".to_string()));
    }

    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(
            "User with this email already exists".to_string(),
        ));
    }

    let password_hash = hash_password(&req.password)?;
    let user = state
        .users
        .create(NewUser {
            first_name,
            last_name,
            email,
            password_hash,
            phone: req.phone,
            country: req.country,
            preferences: DEFAULT_PREFERENCES.to_string(),
        })
        .await?;

    let session = state.sessions.create(user.id, state.session_ttl_secs).await?;
    log_activity(state.db.pool(), user.id, "register", "User registered").await;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(AuthData {
            user: user.into(),
            token: session.token,
        })),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthData>>, AppError> {
    let email = req.email.trim().to_lowercase();

    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Email and password are required".to_string(),
        ));
    }
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email format".to_string()));
    }

    // Lockout applies before verification, so a correct password cannot
    // bypass it.
    if state.login_guard.is_locked(&email) {
        return Err(AppError::Locked);
    }

    let user = match state.users.find_by_email(&email).await? {
        Some(user) => user,
        None => {
            state.login_guard.record_failure(&email);
            return Err(AppError::invalid_credentials());
        }
    };

    if !verify_password(&req.password, &user.password_hash) {
        state.login_guard.record_failure(&email);
        return Err(AppError::invalid_credentials());
    }

    state.login_guard.record_success(&email);

    let session = state.sessions.create(user.id, state.session_ttl_secs).await?;
    state.users.update_last_login(user.id).await?;
    log_activity(state.db.pool(), user.id, "login", "User logged in").await;

    Ok(Json(ApiResponse::success(AuthData {
        user: user.into(),
        token: session.token,
    })))
}

async fn logout(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Extension(BearerToken(token)): Extension<BearerToken>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    state.sessions.delete(&token).await?;
    log_activity(state.db.pool(), user_id, "logout", "User logged out").await;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Logout successful"
    }))))
}

async fn refresh(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Extension(BearerToken(token)): Extension<BearerToken>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let session = state
        .sessions
        .rotate(&token, user_id, state.session_ttl_secs)
        .await?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "token": session.token
    }))))
}

async fn verify(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success(serde_json::json!({
        "valid": true,
        "user_id": user_id,
    })))
}

async fn get_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let user = state
        .users
        .get(user_id)
        .await?
        .ok_or(AppError::NotFound("User not found"))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "user": UserProfile::from(user)
    }))))
}

async fn update_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let first_name = req.first_name.trim().to_string();
    let last_name = req.last_name.trim().to_string();

    if !is_valid_name(&first_name) || !is_valid_name(&last_name) {
        return Err(AppError::Validation(
            "First and last name must be at least 2 characters".to_string(),
        ));
    }

    let current = state
        .users
        .get(user_id)
        .await?
        .ok_or(AppError::NotFound("User not found"))?;

    // Absent preferences leave the stored ones untouched.
    let preferences = match req.preferences {
        Some(value) => value.to_string(),
        None => current.preferences,
    };

    state
        .users
        .update_profile(
            user_id,
            &first_name,
            &last_name,
            req.phone.as_deref(),
            req.country.as_deref(),
            &preferences,
        )
        .await?;
    log_activity(state.db.pool(), user_id, "profile_update", "User updated profile").await;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Profile updated successfully"
    }))))
}

async fn change_password(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    if !is_valid_password(&req.new_password) {
        return Err(AppError::Validation(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    let user = state
        .users
        .get(user_id)
        .await?
        .ok_or(AppError::NotFound("User not found"))?;

    if !verify_password(&req.current_password, &user.password_hash) {
        return Err(AppError::Unauthorized("Current password is incorrect"));
    }

    let password_hash = hash_password(&req.new_password)?;
    state.users.update_password(user_id, &password_hash).await?;
    log_activity(state.db.pool(), user_id, "password_change", "User changed password").await;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Password changed successfully"
    }))))
}
