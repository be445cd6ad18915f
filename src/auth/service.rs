use argon2::{
    password_hash::PasswordVerifier,
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use axum::http::StatusCode;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

use super::jwt::generate_token;

pub struct RegisterData {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

pub struct LoginData {
    pub email: String,
    pub password: String,
}

pub struct AuthResult {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub token: String,
}

pub enum AuthError {
    InvalidInput(String),
    AlreadyExists(String),
    InvalidCredentials,
    DatabaseError(String),
    TokenError,
    InternalError(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::AlreadyExists(_) => StatusCode::CONFLICT,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::DatabaseError(_) | Self::TokenError | Self::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::DatabaseError(_) | Self::TokenError | Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::InvalidInput(msg) => msg.clone(),
            Self::AlreadyExists(msg) => msg.clone(),
            Self::InvalidCredentials => "Invalid email or password".to_string(),
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::TokenError => "Failed to generate auth token".to_string(),
            Self::InternalError(msg) => msg.clone(),
        }
    }
}

pub async fn register(pool: &PgPool, data: RegisterData) -> Result<AuthResult, AuthError> {
    if data.username.is_empty() || data.email.is_empty() || data.password.is_empty() {
        return Err(AuthError::InvalidInput(
            "Username, email, and password are required".to_string(),
        ));
    }

    let existing_user =
        sqlx::query_as::<_, (Uuid,)>("SELECT id FROM social.users WHERE email = $1")
            .bind(&data.email)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                error!("Database error while checking existing user: {}", e);
                AuthError::DatabaseError(e.to_string())
            })?;

    if existing_user.is_some() {
        info!("User with email {} already exists", data.email);
        return Err(AuthError::AlreadyExists("Email already in use".to_string()));
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(data.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Password hashing failed: {}", e);
            AuthError::InternalError("Password hashing failed".to_string())
        })?
        .to_string();

    let user_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO social.users (id, username, email, password_hash, first_name, last_name)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(user_id)
    .bind(&data.username)
    .bind(&data.email)
    .bind(&password_hash)
    .bind(&data.first_name)
    .bind(&data.last_name)
    .execute(pool)
    .await
    .map_err(|e| {
        error!("Failed to insert new user: {}", e);
        AuthError::DatabaseError(e.to_string())
    })?;

    info!("User created successfully with ID: {}", user_id);

    let token = generate_token(&user_id).map_err(|e| {
        error!("Token generation failed: {:?}", e);
        AuthError::TokenError
    })?;

    Ok(AuthResult {
        user_id,
        username: data.username,
        email: data.email,
        token,
    })
}

pub async fn login(pool: &PgPool, data: LoginData) -> Result<AuthResult, AuthError> {
    info!("Attempting login for user with email: {}", data.email);

    let user = sqlx::query_as::<_, (Uuid, String, String, String)>(
        "SELECT id, username, email, password_hash FROM social.users WHERE email = $1",
    )
    .bind(&data.email)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        error!("Database error while fetching user: {}", e);
        AuthError::DatabaseError(e.to_string())
    })?;

    let user = match user {
        Some(user) => user,
        None => return Err(AuthError::InvalidCredentials),
    };

    let parsed_hash = argon2::password_hash::PasswordHash::new(&user.3)
        .map_err(|_| AuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(data.password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)?;

    let token = generate_token(&user.0).map_err(|e| {
        error!("Token generation failed: {:?}", e);
        AuthError::TokenError
    })?;

    info!("Login successful for user ID: {}", user.0);

    Ok(AuthResult {
        user_id: user.0,
        username: user.1,
        email: user.2,
        token,
    })
}
