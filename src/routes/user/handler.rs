use axum::{
    Json,
    extract::State,
    http::StatusCode,
};

use crate::{
    AppState,
    error::AppError,
    middleware::AuthUser,
    result::{ApiResponse, message_to_api_response, success_to_api_response},
    store::{NewUser, UserProfile},
};

use super::model::{LoginRequest, LoginResponse, RegisterRequest};

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserProfile>>), AppError> {
    req.validate().map_err(AppError::Validation)?;

    let password_hash = state
        .hasher
        .hash(&req.password)
        .map_err(|e| AppError::internal(format!("failed to hash password: {}", e)))?;

    let user = state
        .users
        .create(NewUser {
            username: req.username,
            email: req.email,
            password_hash,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        success_to_api_response("User created successfully", UserProfile::from(user)),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    req.validate().map_err(AppError::Validation)?;

    let token = state.sessions.login(&req.email, &req.password).await?;
    Ok(success_to_api_response(
        "Login successful",
        LoginResponse { token },
    ))
}

#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state
        .sessions
        .logout(user.claims.user_id, &user.token, user.claims.exp)
        .await?;

    Ok(message_to_api_response("Logout successful"))
}

#[axum::debug_handler]
pub async fn profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<UserProfile>>, AppError> {
    let (profile, from_cache) = state.sessions.get_profile(user.claims.user_id).await?;

    let msg = if from_cache {
        "User profile (from cache)"
    } else {
        "User profile (from database)"
    };
    Ok(success_to_api_response(msg, profile))
}

#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<ApiResponse<Vec<UserProfile>>>, AppError> {
    let users = state.users.list().await?;
    let profiles = users.into_iter().map(UserProfile::from).collect();
    Ok(success_to_api_response("List of all users", profiles))
}
