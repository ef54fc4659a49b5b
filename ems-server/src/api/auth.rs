//! Authentication endpoints: login, logout and the forgot-password OTP flow

use axum::{Json, extract::State};
use chrono::Utc;
use shared::models::{LoginRequest, LoginResponse, SendOtpRequest, TokenResponse, VerifyOtpRequest};

use crate::auth::Principal;
use crate::services;
use crate::state::AppState;

use super::{ApiResult, Message, message};

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let response = services::auth::login(&state.store, &state.jwt, &req).await?;
    Ok(Json(response))
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>, principal: Principal) -> ApiResult<Message> {
    services::auth::logout(&state.store, &principal).await?;
    Ok(message("logged out"))
}

/// POST /api/auth/forgot-password/send-otp
pub async fn send_otp(
    State(state): State<AppState>,
    Json(req): Json<SendOtpRequest>,
) -> ApiResult<Message> {
    services::auth::send_forgot_password_otp(
        &state.store,
        state.mailer.as_ref(),
        &req,
        state.otp_validity,
    )
    .await?;
    Ok(message("otp sent to the registered email"))
}

/// POST /api/auth/forgot-password/verify-otp
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(req): Json<VerifyOtpRequest>,
) -> ApiResult<TokenResponse> {
    let response = services::auth::verify_forgot_password_otp(
        &state.store,
        &state.jwt,
        &req,
        state.otp_validity,
        Utc::now(),
    )
    .await?;
    Ok(Json(response))
}
