use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::{
    activity::record_activity,
    dto::auth::{Claims, LoginRequest, LoginResponse, RegisterRequest},
    entity::sea_orm_active_enums::ActivityType,
    error::{AppError, AppResult},
    middleware::auth::ROLE_CUSTOMER,
    models::User,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const MIN_PASSWORD_LEN: usize = 8;

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let RegisterRequest {
        first_name,
        last_name,
        email,
        password,
        phone,
    } = payload;
    let email = normalize_email(&email)?;
    if first_name.trim().is_empty() || last_name.trim().is_empty() {
        return Err(AppError::BadRequest("first and last name are required".into()));
    }
    validate_password(&password)?;

    let exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(&state.pool)
        .await?;
    if exist.is_some() {
        return Err(AppError::EmailAlreadyRegistered);
    }

    let role_id: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM roles WHERE name = $1")
        .bind(ROLE_CUSTOMER)
        .fetch_optional(&state.pool)
        .await?;
    let (role_id,) = role_id.ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("required role {ROLE_CUSTOMER} is missing"))
    })?;

    let password_hash = hash_password(&password)?;

    let user: User = sqlx::query_as(
        r#"
        INSERT INTO users (id, first_name, last_name, email, password_hash, phone, role_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, first_name, last_name, email, phone, role_id, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(first_name.trim())
    .bind(last_name.trim())
    .bind(email.as_str())
    .bind(password_hash)
    .bind(phone)
    .bind(role_id)
    .fetch_one(&state.pool)
    .await
    .map_err(|err| match err {
        // Lost a race against a concurrent registration with the same email.
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::EmailAlreadyRegistered
        }
        other => AppError::DbError(other),
    })?;

    tracing::info!(user_id = %user.id, "user registered");
    record_activity(
        &state.pool,
        user.id,
        ActivityType::UserCreated,
        &format!("Usuario {} registrado", user.email),
        Some(user.id),
    )
    .await;

    Ok(ApiResponse::success("User created", user, None))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let email = email.trim().to_lowercase();
    let row: Option<(Uuid, String, String)> = sqlx::query_as(
        r#"
        SELECT u.id, u.password_hash, r.name
        FROM users u
        JOIN roles r ON r.id = u.role_id
        WHERE u.email = $1
        "#,
    )
    .bind(email.as_str())
    .fetch_optional(&state.pool)
    .await?;

    let (user_id, password_hash, role) = row.ok_or(AppError::InvalidCredentials)?;
    if !verify_password(&password, &password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let token = issue_token(
        user_id,
        &role,
        &state.config.jwt_secret,
        state.config.jwt_ttl_minutes,
    )?;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            access_token: token,
            token_type: "bearer".into(),
            expires_in: state.config.jwt_ttl_minutes * 60,
            user_id,
            role,
        },
        Some(Meta::empty()),
    ))
}

pub fn issue_token(user_id: Uuid, role: &str, secret: &str, ttl_minutes: i64) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::minutes(ttl_minutes))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AppError::BadRequest("invalid email".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::auth::{ROLE_ADMIN, decode_token};

    #[test]
    fn password_hash_verifies_only_the_original() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("battery staple", &hash).unwrap());
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(matches!(validate_password("1234567"), Err(AppError::BadRequest(_))));
        assert!(validate_password("12345678").is_ok());
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Ana@Example.COM ").unwrap(), "ana@example.com");
        assert!(normalize_email("ana.example.com").is_err());
        assert!(normalize_email("@example.com").is_err());
    }

    #[test]
    fn issued_token_carries_user_and_role() {
        let user_id = Uuid::new_v4();
        let token = issue_token(user_id, ROLE_ADMIN, "test-secret", 5).unwrap();
        let auth = decode_token(&token, "test-secret").unwrap();
        assert_eq!(auth.user_id, user_id);
        assert!(auth.is_admin());
        assert!(decode_token(&token, "other-secret").is_err());
    }
}
