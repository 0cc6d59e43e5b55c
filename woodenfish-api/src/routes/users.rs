/// User account endpoints
///
/// Two ways to get an account:
/// - Registration with username, email and password
/// - Phone login: request a verification code, then redeem it. The first
///   successful login for a phone creates the account.
///
/// # Endpoints
///
/// - `POST /users/register` - Register new user
/// - `GET /users/:user_id` - Fetch a user
/// - `POST /users/send-code` - Issue a login code for a phone number
/// - `POST /users/login` - Log in with phone and code

use crate::{
    app::AppState,
    error::{messages, ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Connection, PgConnection};
use validator::Validate;
use woodenfish_shared::{
    auth::{password, verification},
    models::{
        user::{CreateUser, User, PHONE_CONSTRAINT, USERNAME_CONSTRAINT},
        user_stat::UserStat,
        verification_code::{CreateVerificationCode, VerificationCode},
    },
};

/// Usernames tried for a new phone account before giving up
const MAX_USERNAME_ATTEMPTS: usize = 5;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 50, message = "用户名长度必须在1到50个字符之间"))]
    pub username: String,

    #[validate(email(message = "邮箱格式不正确"))]
    pub email: String,

    #[validate(length(min = 6, max = 128, message = "密码长度必须在6到128个字符之间"))]
    pub password: String,

    #[validate(length(max = 512, message = "头像地址过长"))]
    pub avatar: Option<String>,
}

/// Public view of a user
#[derive(Debug, Serialize, Deserialize)]
pub struct UserOut {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub is_vip: bool,
    pub vip_expire_date: Option<DateTime<Utc>>,
    pub merit_points: i64,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserOut {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            phone: user.phone,
            avatar: user.avatar,
            is_vip: user.is_vip,
            vip_expire_date: user.vip_expire_date,
            merit_points: user.merit_points,
            created_at: user.created_at,
        }
    }
}

/// Send-code request
#[derive(Debug, Deserialize)]
pub struct SendCodeRequest {
    pub phone: String,
}

/// Send-code response
#[derive(Debug, Serialize, Deserialize)]
pub struct SendCodeResponse {
    pub success: bool,
    pub message: String,
    /// Seconds until the code expires
    pub expires_in: i64,
}

/// Phone login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub phone: String,
    pub code: String,
}

/// Phone login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: UserOut,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /users/register
/// Content-Type: application/json
///
/// {
///   "username": "xiaoming",
///   "email": "xiaoming@example.com",
///   "password": "secret123"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Username or email already taken
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<UserOut>> {
    req.validate()?;

    if User::find_by_username(&state.db, &req.username).await?.is_some() {
        return Err(ApiError::BadRequest(messages::USERNAME_TAKEN.to_string()));
    }

    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(ApiError::BadRequest(messages::EMAIL_TAKEN.to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;

    let mut tx = state.db.begin().await?;

    let user = User::create(
        &mut *tx,
        CreateUser {
            username: req.username,
            email: Some(req.email),
            phone: None,
            password_hash: Some(password_hash),
            avatar: req.avatar,
        },
    )
    .await?;

    UserStat::create(&mut *tx, user.id).await?;

    tx.commit().await?;

    tracing::info!(user_id = user.id, "User registered");

    Ok(Json(user.into()))
}

/// Fetch a user by id
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<UserOut>> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(messages::USER_NOT_FOUND.to_string()))?;

    Ok(Json(user.into()))
}

/// Issue a verification code for phone login
///
/// Any earlier unused code for the same phone stops working.
///
/// # Endpoint
///
/// ```text
/// POST /users/send-code
/// Content-Type: application/json
///
/// { "phone": "13800138000" }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "message": "验证码已发送，测试用验证码: 123456",
///   "expires_in": 300
/// }
/// ```
pub async fn send_code(
    State(state): State<AppState>,
    Json(req): Json<SendCodeRequest>,
) -> ApiResult<Json<SendCodeResponse>> {
    if !verification::is_valid_phone(&req.phone) {
        return Err(ApiError::BadRequest(messages::INVALID_PHONE.to_string()));
    }

    let settings = &state.config.verification;
    let code = verification::generate_code();
    let expires_at = Utc::now() + Duration::seconds(settings.code_ttl_seconds);

    let mut tx = state.db.begin().await?;

    VerificationCode::lock_phone(&mut *tx, &req.phone).await?;
    let superseded = VerificationCode::invalidate_for_phone(&mut *tx, &req.phone).await?;
    VerificationCode::create(
        &mut *tx,
        CreateVerificationCode {
            phone: req.phone.clone(),
            code: code.clone(),
            expires_at,
        },
    )
    .await?;

    tx.commit().await?;

    tracing::info!(superseded, "Verification code issued");

    let message = if settings.echo_code {
        format!("验证码已发送，测试用验证码: {}", code)
    } else {
        "验证码已发送".to_string()
    };

    Ok(Json(SendCodeResponse {
        success: true,
        message,
        expires_in: settings.code_ttl_seconds,
    }))
}

/// Log in with a phone number and verification code
///
/// The code is consumed even if the rest of the login fails later, so it
/// can never be replayed. A phone without an account gets one named after
/// its last four digits.
///
/// # Errors
///
/// - `400 Bad Request`: Malformed phone, or code wrong, used or expired
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    if !verification::is_valid_phone(&req.phone) {
        return Err(ApiError::BadRequest(messages::INVALID_PHONE.to_string()));
    }

    if !verification::is_valid_code_format(&req.code) {
        return Err(ApiError::BadRequest(messages::INVALID_CODE.to_string()));
    }

    VerificationCode::redeem(&state.db, &req.phone, &req.code)
        .await?
        .ok_or_else(|| ApiError::BadRequest(messages::INVALID_CODE.to_string()))?;

    let mut tx = state.db.begin().await?;
    let user = find_or_create_phone_user(&mut tx, &req.phone).await?;
    tx.commit().await?;

    tracing::info!(user_id = user.id, "Phone login succeeded");

    Ok(Json(LoginResponse {
        message: "登录成功".to_string(),
        user: user.into(),
    }))
}

async fn find_or_create_phone_user(conn: &mut PgConnection, phone: &str) -> ApiResult<User> {
    if let Some(user) = User::find_by_phone(&mut *conn, phone).await? {
        return Ok(user);
    }

    for attempt in 0..MAX_USERNAME_ATTEMPTS {
        let username = if attempt == 0 {
            verification::default_username(phone)
        } else {
            verification::username_with_random_suffix(phone)
        };

        // Savepoint, so a taken username doesn't abort the outer transaction
        let mut savepoint = conn.begin().await?;
        let created = User::create(
            &mut *savepoint,
            CreateUser {
                username: username.clone(),
                phone: Some(phone.to_string()),
                ..Default::default()
            },
        )
        .await;

        match created {
            Ok(user) => {
                UserStat::create(&mut *savepoint, user.id).await?;
                savepoint.commit().await?;
                tracing::info!(user_id = user.id, username = %user.username, "Created phone account");
                return Ok(user);
            }
            Err(err) if violates(&err, USERNAME_CONSTRAINT) => {
                savepoint.rollback().await?;
                tracing::debug!(username = %username, "Username taken, retrying");
            }
            Err(err) if violates(&err, PHONE_CONSTRAINT) => {
                // a concurrent first login for this phone got there first
                savepoint.rollback().await?;
                let existing = User::find_by_phone(&mut *conn, phone).await?;
                return existing.ok_or_else(|| {
                    ApiError::InternalError("Phone account missing after phone conflict".to_string())
                });
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(ApiError::InternalError(format!(
        "No free username for phone account after {} attempts",
        MAX_USERNAME_ATTEMPTS
    )))
}

fn violates(err: &sqlx::Error, constraint: &str) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.constraint())
        .map_or(false, |name| name == constraint)
}
