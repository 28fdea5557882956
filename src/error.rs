// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Service-wide error taxonomy.
//!
//! Every failure surfaced to a caller falls into one of six stable categories.
//! The category travels on the wire as `error_code`; the message is meant for
//! humans. Internal details are logged, never returned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::StoreError;

/// Error returned by every Authx operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthxError {
    /// Missing or malformed input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Primary key conflict.
    #[error("already exists: {0}")]
    AlreadyExists(String),
    /// Bad password, bad signature, expired or unknown refresh token.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    /// Disabled device group or failed device capability check.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// Signing, hashing or store failure.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON body of every error reply.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    pub error_code: String,
}

impl AuthxError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::AlreadyExists(message.into())
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated(message.into())
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Stable category name carried as `error_code`.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthxError::InvalidArgument(_) => "INVALID_ARGUMENT",
            AuthxError::NotFound(_) => "NOT_FOUND",
            AuthxError::AlreadyExists(_) => "ALREADY_EXISTS",
            AuthxError::Unauthenticated(_) => "UNAUTHENTICATED",
            AuthxError::PermissionDenied(_) => "PERMISSION_DENIED",
            AuthxError::Internal(_) => "INTERNAL",
        }
    }

    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthxError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AuthxError::NotFound(_) => StatusCode::NOT_FOUND,
            AuthxError::AlreadyExists(_) => StatusCode::CONFLICT,
            AuthxError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AuthxError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AuthxError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Rebuild an error from a remote reply.
    ///
    /// Unknown codes collapse into `Internal`.
    pub fn from_code(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            "INVALID_ARGUMENT" => AuthxError::InvalidArgument(message),
            "NOT_FOUND" => AuthxError::NotFound(message),
            "ALREADY_EXISTS" => AuthxError::AlreadyExists(message),
            "UNAUTHENTICATED" => AuthxError::Unauthenticated(message),
            "PERMISSION_DENIED" => AuthxError::PermissionDenied(message),
            _ => AuthxError::Internal(message),
        }
    }

    /// The human readable part, without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            AuthxError::InvalidArgument(m)
            | AuthxError::NotFound(m)
            | AuthxError::AlreadyExists(m)
            | AuthxError::Unauthenticated(m)
            | AuthxError::PermissionDenied(m)
            | AuthxError::Internal(m) => m,
        }
    }
}

impl From<StoreError> for AuthxError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => AuthxError::NotFound(what),
            StoreError::AlreadyExists(what) => AuthxError::AlreadyExists(what),
            other => {
                tracing::error!(error = %other, "store failure");
                AuthxError::Internal("store failure".to_string())
            }
        }
    }
}

impl IntoResponse for AuthxError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::warn!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        let body = Json(ErrorBody {
            error: self.message().to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn categories_map_to_status() {
        assert_eq!(
            AuthxError::invalid_argument("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AuthxError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AuthxError::already_exists("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AuthxError::unauthenticated("x").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthxError::permission_denied("x").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthxError::internal("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn from_code_round_trips_every_category() {
        for err in [
            AuthxError::invalid_argument("m"),
            AuthxError::not_found("m"),
            AuthxError::already_exists("m"),
            AuthxError::unauthenticated("m"),
            AuthxError::permission_denied("m"),
            AuthxError::internal("m"),
        ] {
            assert_eq!(AuthxError::from_code(err.error_code(), "m"), err);
        }
        assert_eq!(
            AuthxError::from_code("SOMETHING_ELSE", "m"),
            AuthxError::internal("m")
        );
    }

    #[test]
    fn store_errors_keep_their_category() {
        let nf: AuthxError = StoreError::NotFound("role".into()).into();
        assert_eq!(nf.error_code(), "NOT_FOUND");
        let ae: AuthxError = StoreError::AlreadyExists("role".into()).into();
        assert_eq!(ae.error_code(), "ALREADY_EXISTS");
        let other: AuthxError = StoreError::Unavailable("lock poisoned".into()).into();
        assert_eq!(other, AuthxError::internal("store failure"));
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = AuthxError::unauthenticated("bad token").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "UNAUTHENTICATED");
        assert_eq!(body["error"], "bad token");
    }
}
