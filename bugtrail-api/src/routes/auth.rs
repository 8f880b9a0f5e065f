/// Authentication endpoints
///
/// Registration is a two-step email-verification flow: submit credentials,
/// receive a 6-digit code, verify. Password recovery follows the same shape.
/// Login issues a 30-day JWT once the account is verified.
///
/// # Endpoints
///
/// - `POST /api/auth/register/send-otp` - Start registration, email a code
/// - `POST /api/auth/register/verify-otp` - Verify the emailed code
/// - `POST /api/auth/login` - Login and get a session token
/// - `POST /api/auth/forgot-password` - Start password recovery
/// - `POST /api/auth/reset-password` - Set a new password with a valid code
/// - `POST /api/auth/resend-otp` - Re-send a code for either flow

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::State, Json};
use bugtrail_shared::{
    auth::{
        jwt,
        otp::{self, OtpCheck},
        password,
    },
    email::EmailMessage,
    models::user::{normalize_email, CreateUser, User, UserRole},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Start-registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (also validated for strength)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Verify-code request, shared by registration and reset flows
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// The 6-digit code from the email
    #[validate(length(equal = 6, message = "Code must be 6 digits"))]
    pub otp: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Login response
///
/// The shape clients persist: identity fields plus the session token.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub token: String,
}

/// Forgot-password request
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Reset-password request
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(equal = 6, message = "Code must be 6 digits"))]
    pub otp: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// Which flow a re-sent code belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpFlow {
    /// Email verification during registration
    Register,

    /// Password reset
    Reset,
}

/// Resend-code request
#[derive(Debug, Deserialize, Validate)]
pub struct ResendOtpRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[serde(rename = "type")]
    pub flow: OtpFlow,
}

/// The only body the forgot-password route ever returns
pub const RESET_REQUESTED_MESSAGE: &str =
    "If that email is registered, a reset code has been sent";

/// Plain message response used by the OTP flows
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

/// Starts registration and emails a verification code
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/register/send-otp
/// Content-Type: application/json
///
/// {
///   "name": "Dana Developer",
///   "email": "dana@example.com",
///   "password": "Str0ngEnough"
/// }
/// ```
///
/// An unverified record for the same email is overwritten, so restarting
/// registration with a new name or password just works. A verified account
/// is never touched.
///
/// # Errors
///
/// - `409 Conflict`: Email already registered and verified
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register_send_otp(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate().map_err(ApiError::from_validation)?;

    password::validate_password_strength(&req.password).map_err(|message| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "password".to_string(),
            message,
        }])
    })?;

    let email = normalize_email(&req.email);
    let password_hash = password::hash_password(&req.password)?;

    let user = match User::find_by_email(&state.db, &email).await? {
        Some(existing) if existing.verified => {
            return Err(ApiError::Conflict("Email already registered".to_string()));
        }
        Some(existing) => User::overwrite_pending(&state.db, existing.id, &req.name, &password_hash)
            .await?
            .ok_or_else(|| ApiError::InternalError("Pending user vanished".to_string()))?,
        None => {
            User::create(
                &state.db,
                CreateUser {
                    name: req.name.clone(),
                    email: email.clone(),
                    password_hash,
                },
            )
            .await?
        }
    };

    let code = otp::generate_code();
    User::save_otp(&state.db, user.id, &code, otp::expiry_from_now()).await?;

    state
        .mailer
        .send(EmailMessage::verification(&email, &code))
        .await?;

    tracing::info!(user_id = %user.id, "registration code sent");
    Ok(MessageResponse::new("Verification code sent"))
}

/// Verifies the registration code and activates the account
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/register/verify-otp
/// Content-Type: application/json
///
/// { "email": "dana@example.com", "otp": "042917" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Wrong or expired code
/// - `404 Not Found`: No account for this email
/// - `409 Conflict`: Account already verified
pub async fn register_verify_otp(
    State(state): State<AppState>,
    Json(req): Json<VerifyOtpRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate().map_err(ApiError::from_validation)?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("No account found for this email".to_string()))?;

    if user.verified {
        return Err(ApiError::Conflict("Email already verified".to_string()));
    }

    match otp::check_code(&req.otp, user.otp_code.as_deref(), user.otp_expires_at) {
        OtpCheck::Valid => {}
        OtpCheck::Mismatch => {
            return Err(ApiError::BadRequest("Invalid verification code".to_string()));
        }
        OtpCheck::Expired => {
            return Err(ApiError::BadRequest(
                "Verification code has expired".to_string(),
            ));
        }
    }

    User::mark_verified(&state.db, user.id).await?;

    tracing::info!(user_id = %user.id, "account verified");
    Ok(MessageResponse::new("Email verified successfully"))
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/login
/// Content-Type: application/json
///
/// { "email": "dana@example.com", "password": "Str0ngEnough" }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "id": "uuid",
///   "name": "Dana Developer",
///   "email": "dana@example.com",
///   "role": "member",
///   "token": "eyJ..."
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email, wrong password, or unverified account
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate().map_err(ApiError::from_validation)?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    if !user.verified {
        return Err(ApiError::Unauthorized(
            "Email not verified".to_string(),
        ));
    }

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let claims = jwt::Claims::new(user.id);
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    Ok(Json(LoginResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        token,
    }))
}

/// Starts password recovery
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/forgot-password
/// Content-Type: application/json
///
/// { "email": "dana@example.com" }
/// ```
///
/// Once the email passes format validation, the answer is always the same
/// generic 200, so the endpoint cannot be used to enumerate which
/// addresses have accounts. A reset code is emailed only when the account
/// actually exists; failures along the way are logged, never surfaced.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate().map_err(ApiError::from_validation)?;

    match User::find_by_email(&state.db, &req.email).await {
        Ok(Some(user)) => {
            if let Err(error) = send_reset_code(&state, &user).await {
                tracing::error!(user_id = %user.id, %error, "password reset delivery failed");
            } else {
                tracing::info!(user_id = %user.id, "password reset code sent");
            }
        }
        Ok(None) => {}
        Err(error) => {
            tracing::error!(%error, "password reset lookup failed");
        }
    }

    Ok(MessageResponse::new(RESET_REQUESTED_MESSAGE))
}

/// Saves a fresh code on the user row and emails it
async fn send_reset_code(state: &AppState, user: &User) -> Result<(), ApiError> {
    let code = otp::generate_code();
    User::save_otp(&state.db, user.id, &code, otp::expiry_from_now()).await?;

    state
        .mailer
        .send(EmailMessage::password_reset(&user.email, &code))
        .await?;

    Ok(())
}

/// Completes password recovery with a valid code
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/reset-password
/// Content-Type: application/json
///
/// {
///   "email": "dana@example.com",
///   "otp": "042917",
///   "new_password": "NewStr0ngOne"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Wrong or expired code
/// - `404 Not Found`: No account for this email
/// - `422 Unprocessable Entity`: Weak password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate().map_err(ApiError::from_validation)?;

    password::validate_password_strength(&req.new_password).map_err(|message| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "new_password".to_string(),
            message,
        }])
    })?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("No account found for this email".to_string()))?;

    match otp::check_code(&req.otp, user.otp_code.as_deref(), user.otp_expires_at) {
        OtpCheck::Valid => {}
        OtpCheck::Mismatch => {
            return Err(ApiError::BadRequest("Invalid reset code".to_string()));
        }
        OtpCheck::Expired => {
            return Err(ApiError::BadRequest("Reset code has expired".to_string()));
        }
    }

    let password_hash = password::hash_password(&req.new_password)?;
    User::update_password(&state.db, user.id, &password_hash).await?;

    tracing::info!(user_id = %user.id, "password reset");
    Ok(MessageResponse::new("Password reset successfully"))
}

/// Re-sends a code for either flow
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/resend-otp
/// Content-Type: application/json
///
/// { "email": "dana@example.com", "type": "register" }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: No account for this email
/// - `409 Conflict`: `type` is `register` but the account is already verified
pub async fn resend_otp(
    State(state): State<AppState>,
    Json(req): Json<ResendOtpRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate().map_err(ApiError::from_validation)?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("No account found for this email".to_string()))?;

    if req.flow == OtpFlow::Register && user.verified {
        return Err(ApiError::Conflict("Email already verified".to_string()));
    }

    let code = otp::generate_code();
    User::save_otp(&state.db, user.id, &code, otp::expiry_from_now()).await?;

    let message = match req.flow {
        OtpFlow::Register => EmailMessage::verification(&user.email, &code),
        OtpFlow::Reset => EmailMessage::password_reset(&user.email, &code),
    };
    state.mailer.send(message).await?;

    tracing::info!(user_id = %user.id, flow = ?req.flow, "code re-sent");
    Ok(MessageResponse::new("Code sent"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            name: "Dana".to_string(),
            email: "dana@example.com".to_string(),
            password: "Str0ngEnough".to_string(),
        };
        assert!(valid.validate().is_ok());

        let bad_email = RegisterRequest {
            email: "not-an-email".to_string(),
            ..valid_clone(&valid)
        };
        assert!(bad_email.validate().is_err());

        let short_password = RegisterRequest {
            password: "Ab1".to_string(),
            ..valid_clone(&valid)
        };
        assert!(short_password.validate().is_err());
    }

    fn valid_clone(req: &RegisterRequest) -> RegisterRequest {
        RegisterRequest {
            name: req.name.clone(),
            email: req.email.clone(),
            password: req.password.clone(),
        }
    }

    #[test]
    fn test_otp_flow_wire_format() {
        let req: ResendOtpRequest = serde_json::from_str(
            r#"{ "email": "a@example.com", "type": "register" }"#,
        )
        .unwrap();
        assert_eq!(req.flow, OtpFlow::Register);

        let req: ResendOtpRequest =
            serde_json::from_str(r#"{ "email": "a@example.com", "type": "reset" }"#).unwrap();
        assert_eq!(req.flow, OtpFlow::Reset);

        assert!(serde_json::from_str::<ResendOtpRequest>(
            r#"{ "email": "a@example.com", "type": "nonsense" }"#
        )
        .is_err());
    }

    #[test]
    fn test_verify_request_requires_six_digits() {
        let req = VerifyOtpRequest {
            email: "a@example.com".to_string(),
            otp: "1234".to_string(),
        };
        assert!(req.validate().is_err());

        let req = VerifyOtpRequest {
            email: "a@example.com".to_string(),
            otp: "123456".to_string(),
        };
        assert!(req.validate().is_ok());
    }
}
