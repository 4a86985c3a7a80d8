//! Authentication HTTP handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use super::AuthenticatedUser;
use crate::error::ApiResult;
use crate::models::{
    AuthResponse, ChallengeRequest, ChallengeResponse, ForgotPasswordRequest, LoginRequest,
    RefreshTokenRequest, RegisterRequest, ResetPasswordRequest, TokenQuery, TokenPairResponse,
    UserResponse, VerifyRequest,
};
use crate::state::AppState;

/// POST /v1/auth/register - Register with email and password
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;

    let (user, tokens) = state
        .auth_service
        .register(req.username, &req.email, &req.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user.into(),
            tokens,
        }),
    ))
}

/// POST /v1/auth/login - Log in with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let (user, tokens) = state
        .auth_service
        .login_with_credentials(&req.email, &req.password)
        .await?;

    Ok(Json(AuthResponse {
        user: user.into(),
        tokens,
    }))
}

/// POST /v1/auth/web3/challenge - Request a sign-in challenge for an address
pub async fn request_challenge(
    State(state): State<AppState>,
    Json(req): Json<ChallengeRequest>,
) -> ApiResult<Json<ChallengeResponse>> {
    let challenge = state.auth_service.generate_challenge(&req.address).await?;
    Ok(Json(challenge))
}

/// POST /v1/auth/web3/verify - Verify a signed challenge and issue tokens
pub async fn verify_signature(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let (user, tokens) = state
        .auth_service
        .verify_signature(&req.address, &req.signature)
        .await?;

    Ok(Json(AuthResponse {
        user: user.into(),
        tokens,
    }))
}

/// POST /v1/auth/refresh-tokens - Rotate a refresh token into a new pair
pub async fn refresh_tokens(
    State(state): State<AppState>,
    Json(req): Json<RefreshTokenRequest>,
) -> ApiResult<Json<TokenPairResponse>> {
    let (_, tokens) = state.auth_service.refresh_tokens(&req.refresh_token).await?;
    Ok(Json(TokenPairResponse { tokens }))
}

/// POST /v1/auth/logout - Blacklist a refresh token
pub async fn logout(
    State(state): State<AppState>,
    Json(req): Json<RefreshTokenRequest>,
) -> ApiResult<StatusCode> {
    state.auth_service.logout(&req.refresh_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/auth/forgot-password - Send a reset-password email
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<StatusCode> {
    req.validate()?;

    state.auth_service.forgot_password(&req.email).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/auth/reset-password?token=... - Consume a reset token
pub async fn reset_password(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<StatusCode> {
    req.validate()?;

    state
        .auth_service
        .reset_password(&query.token, &req.password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/auth/send-verification-email - Email a verify-email token
pub async fn send_verification_email(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<StatusCode> {
    state.auth_service.send_verification_email(user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/auth/verify-email?token=... - Consume a verify-email token
pub async fn verify_email(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> ApiResult<StatusCode> {
    state.auth_service.verify_email(&query.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/auth/me - Get the current authenticated user
pub async fn get_current_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<UserResponse>> {
    let user = state.auth_service.users().get_by_id(user.user_id).await?;

    Ok(Json(user.into()))
}
