//! Login, logout and the forgot-password OTP flow

use chrono::{DateTime, Duration, Utc};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    LoginRequest, LoginResponse, Role, SendOtpRequest, SessionUser, TokenResponse,
    VerifyOtpRequest,
};
use validator::Validate;

use crate::auth::{JwtService, Principal};
use crate::db::{OtpStore, UserStore};
use crate::email::{self, Mailer};
use crate::error::ServiceResult;
use crate::util::{generate_otp, verify_password};

fn issue_token(jwt: &JwtService, user_id: i64) -> Result<String, AppError> {
    jwt.generate_token(user_id).map_err(|e| {
        tracing::error!(user_id, error = %e, "Token generation failed");
        AppError::internal("token generation failed")
    })
}

/// Verify credentials and open the user's single session
pub async fn login<S>(store: &S, jwt: &JwtService, req: &LoginRequest) -> ServiceResult<LoginResponse>
where
    S: UserStore + ?Sized,
{
    req.validate()?;

    let account = store
        .account_by_email(req.email.trim())
        .await?
        .ok_or_else(AppError::invalid_credentials)?;

    if !verify_password(&req.password, &account.password_hash) {
        tracing::warn!(user_id = account.id, "Login with wrong password");
        return Err(AppError::invalid_credentials().into());
    }

    let role = Role::from_id(account.role_id)
        .ok_or_else(|| AppError::internal(format!("unknown role id {}", account.role_id)))?;

    if role.requires_department() && account.department_member_id.is_none() {
        return Err(AppError::new(ErrorCode::NotAssignedToDepartment).into());
    }

    let token = issue_token(jwt, account.id)?;
    store.set_token(account.id, Some(&token)).await?;

    tracing::info!(user_id = account.id, role = %role, "User logged in");

    Ok(LoginResponse {
        token,
        user: SessionUser {
            id: account.id,
            first_name: account.first_name,
            last_name: account.last_name,
            email: account.email,
            role,
            department_id: account.department_id,
            department_member_id: account.department_member_id,
        },
    })
}

pub async fn logout<S>(store: &S, principal: &Principal) -> ServiceResult<()>
where
    S: UserStore + ?Sized,
{
    store.set_token(principal.user_id, None).await?;
    tracing::info!(user_id = principal.user_id, "User logged out");
    Ok(())
}

/// Store a fresh OTP for an active user and mail it
pub async fn send_forgot_password_otp<S>(
    store: &S,
    mailer: &dyn Mailer,
    req: &SendOtpRequest,
    validity: Duration,
) -> ServiceResult<()>
where
    S: UserStore + OtpStore + ?Sized,
{
    req.validate()?;

    let email = req.email.trim();
    let account = store
        .account_by_email(email)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    let otp = generate_otp();
    store.insert_otp(account.id, &account.email, &otp).await?;

    email::send_password_reset_code(mailer, &account.email, &otp, validity.num_minutes())
        .await
        .map_err(|e| {
            tracing::error!(user_id = account.id, error = %e, "OTP mail delivery failed");
            AppError::new(ErrorCode::MailDeliveryFailed)
        })?;

    Ok(())
}

/// Check the latest OTP for `email` and open a session for the reset step
pub async fn verify_forgot_password_otp<S>(
    store: &S,
    jwt: &JwtService,
    req: &VerifyOtpRequest,
    validity: Duration,
    now: DateTime<Utc>,
) -> ServiceResult<TokenResponse>
where
    S: UserStore + OtpStore + ?Sized,
{
    req.validate()?;

    let record = store
        .latest_otp(req.email.trim())
        .await?
        .filter(|r| r.otp == req.otp.trim())
        .ok_or_else(|| AppError::new(ErrorCode::OtpInvalid))?;

    if now - record.created_at > validity {
        return Err(AppError::new(ErrorCode::OtpExpired).into());
    }

    store.mark_otp_used(record.id).await?;

    let account = store
        .account_by_id(record.user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    let token = issue_token(jwt, account.id)?;
    store.set_token(account.id, Some(&token)).await?;

    tracing::info!(user_id = account.id, "Forgot-password OTP verified");
    Ok(TokenResponse { token })
}
