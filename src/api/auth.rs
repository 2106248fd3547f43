//! Authentication endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppResult,
    models::user::{LoginUser, RegisterUser, User},
};

use super::{AppJson, AuthenticatedUser};

/// Authentication response with token and user profile
#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: User,
}

/// Token verification response
#[derive(Serialize, ToSchema)]
pub struct VerifyResponse {
    pub valid: bool,
    pub user: User,
}

/// Register a new user account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterUser,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username or email already exists")
    )
)]
pub async fn register(
    State(state): State<crate::AppState>,
    AppJson(request): AppJson<RegisterUser>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    request.validate()?;

    let (token, user) = state.services.users.register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            token,
            user,
        }),
    ))
}

/// Log in with username (or email) and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginUser,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing credentials"),
        (status = 401, description = "Invalid username or password")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    AppJson(request): AppJson<LoginUser>,
) -> AppResult<Json<AuthResponse>> {
    let (token, user) = state.services.users.authenticate(&request).await?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        token,
        user,
    }))
}

/// Verify the current bearer token and return the account it belongs to
#[utoipa::path(
    get,
    path = "/auth/verify",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Token is valid", body = VerifyResponse),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn verify(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<VerifyResponse>> {
    let user = state.services.users.get_by_id(claims.user_id).await?;

    Ok(Json(VerifyResponse { valid: true, user }))
}
