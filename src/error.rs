use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::env;
use std::fmt::{self, Debug, Display};

#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    pub code: i32,
    pub message: String,
    pub fields: Vec<FieldError>,
}

/// One failing input field of a validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl Error {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            fields: vec![],
        }
    }

    pub fn is_validation(&self) -> bool {
        self.code == VALIDATION
    }

    pub fn is_not_found(&self) -> bool {
        self.code == NOT_FOUND
    }

    pub fn is_upstream(&self) -> bool {
        self.code == REQUEST || self.code == UPSTREAM
    }

    pub fn is_config(&self) -> bool {
        self.code == CONFIG
    }

    pub fn status(&self) -> StatusCode {
        match self.code {
            CONFIG | DATABASE | UNEXPECTED => StatusCode::INTERNAL_SERVER_ERROR,
            REQUEST | UPSTREAM => StatusCode::BAD_GATEWAY,
            NOT_FOUND => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

pub const CONFIG: i32 = 1;
pub const DATABASE: i32 = 2;
pub const REQUEST: i32 = 3;
pub const UPSTREAM: i32 = 4;
pub const UNEXPECTED: i32 = 5;
pub const VALIDATION: i32 = 101;
pub const INVALID_INPUT: i32 = 102;
pub const NOT_FOUND: i32 = 104;

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)?;
        for field in &self.fields {
            write!(f, "; {}: {}", field.field, field.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        env_var_error(err)
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        database_error(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        reqwest_error(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        unexpected_error(err)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        let error_message = match self.code {
            DATABASE | UNEXPECTED => "Internal Server Error",
            _ => self.message.as_str(),
        };

        let body = if self.fields.is_empty() {
            json!({
                "code": self.code,
                "error": error_message,
            })
        } else {
            json!({
                "code": self.code,
                "error": error_message,
                "errors": self.fields,
            })
        };

        (status, Json(body)).into_response()
    }
}

pub fn validation_error(fields: Vec<FieldError>) -> Error {
    Error {
        fields,
        ..Error::new(VALIDATION, "validation failed")
    }
}

pub fn field_error(field: &str, message: &str) -> Error {
    validation_error(vec![FieldError::new(field, message)])
}

/// Malformed request that is not tied to a single record field.
pub fn invalid_input_error(message: impl Into<String>) -> Error {
    Error::new(INVALID_INPUT, message)
}

pub fn not_found_error(kind: &str) -> Error {
    Error::new(NOT_FOUND, format!("{} not found", kind))
}

pub fn config_error(message: impl Into<String>) -> Error {
    Error::new(CONFIG, message)
}

pub fn env_var_error(err: env::VarError) -> Error {
    Error::new(CONFIG, format!("environment variable error: {}", err))
}

pub fn database_error<T: Debug>(err: T) -> Error {
    tracing::error!(error = ?err, "database error");
    Error::new(DATABASE, "database error")
}

pub fn reqwest_error(err: reqwest::Error) -> Error {
    tracing::warn!(error = %err, "request to provider failed");
    Error::new(REQUEST, "upstream request failed")
}

pub fn upstream_error(message: impl Into<String>) -> Error {
    Error::new(UPSTREAM, message)
}

pub fn unexpected_error<T: Debug>(err: T) -> Error {
    tracing::error!(error = ?err, "unexpected error");
    Error::new(UNEXPECTED, "unexpected error")
}

#[test]
fn validation_error_lists_fields() {
    let err = validation_error(vec![
        FieldError::new("name", "Route name is required"),
        FieldError::new("waypoints", "At least 2 waypoints are required"),
    ]);

    assert!(err.is_validation());
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert_eq!(err.fields.len(), 2);
    assert!(err.to_string().contains("waypoints: At least 2 waypoints are required"));
}

#[test]
fn status_codes_follow_error_kind() {
    assert_eq!(not_found_error("Place").status(), StatusCode::NOT_FOUND);
    assert_eq!(not_found_error("Place").message, "Place not found");
    assert_eq!(
        invalid_input_error("Latitude and longitude are required").status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(upstream_error("city not found").status(), StatusCode::BAD_GATEWAY);
    assert_eq!(
        config_error("Weather API key not configured").status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}
