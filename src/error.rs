use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::SqlErr;
use serde::Serialize;
use thiserror::Error;

use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("Invalid date range: start must be before end")]
    InvalidRange,

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Unauthorized {0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::EmailAlreadyRegistered | AppError::InvalidRange => {
                StatusCode::BAD_REQUEST
            }
            AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable code returned next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound => "NO_ENCONTRADO",
            AppError::BadRequest(_) => "SOLICITUD_INVALIDA",
            AppError::EmailAlreadyRegistered => "EMAIL_YA_REGISTRADO",
            AppError::InvalidRange => "RANGO_INVALIDO",
            AppError::InvalidTransition { .. } => "TRANSICION_INVALIDA",
            AppError::InvalidCredentials => "CREDENCIALES_INCORRECTAS",
            AppError::Unauthorized(_) => "NO_AUTENTICADO",
            AppError::Forbidden => "PERMISO_DENEGADO",
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => "ERROR_INTERNO",
        }
    }

    /// Unique and foreign key violations become a 400 carrying `message`.
    pub fn from_constraint(err: sea_orm::DbErr, message: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_))
            | Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                AppError::BadRequest(message.to_string())
            }
            _ => AppError::OrmError(err),
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
    code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            let detail = match &self {
                AppError::DbError(err) => err.to_string(),
                AppError::OrmError(err) => err.to_string(),
                AppError::Internal(err) => format!("{err:#}"),
                other => other.to_string(),
            };
            tracing::error!(error = %detail, "request failed");
        }

        let message = self.to_string();
        let body = ApiResponse {
            message: message.clone(),
            data: Some(ErrorData {
                error: message,
                code: self.code(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::InvalidRange.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::EmailAlreadyRegistered.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        let transition = AppError::InvalidTransition {
            from: "ENTREGADO".into(),
            to: "PENDIENTE".into(),
        };
        assert_eq!(transition.status(), StatusCode::CONFLICT);
        assert_eq!(transition.code(), "TRANSICION_INVALIDA");
    }

    #[test]
    fn storage_errors_are_internal() {
        let err = AppError::Internal(anyhow::anyhow!("upload failed"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Internal Server Error");
        assert_eq!(err.code(), "ERROR_INTERNO");
    }

    #[test]
    fn unrelated_orm_errors_stay_internal() {
        let err = AppError::from_constraint(sea_orm::DbErr::Custom("boom".into()), "in use");
        assert!(matches!(err, AppError::OrmError(_)));
    }

    #[test]
    fn duplicate_email_uses_domain_code() {
        assert_eq!(AppError::EmailAlreadyRegistered.code(), "EMAIL_YA_REGISTRADO");
    }
}
