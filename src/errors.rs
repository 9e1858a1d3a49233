use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors raised by the domain rules (authorisation, credential resolution,
/// onboarding gates). Each variant maps to exactly one HTTP outcome.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("{0}")]
    NotAuthenticated(String),

    #[error("{0}")]
    NotAuthorised(String),

    #[error("{0}")]
    UserAccountDisabled(String),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    NoServicesWithPermission(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    RegistrationSessionMissing(String),

    #[error("{0}")]
    InvalidRegistrationState(String),

    #[error("{0}")]
    InvalidConfiguration(String),

    #[error("{0}")]
    ExpiredInvite(String),
}

impl DomainError {
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::NotAuthenticated(_) => "NotAuthenticatedError",
            DomainError::NotAuthorised(_) => "NotAuthorisedError",
            DomainError::UserAccountDisabled(_) => "UserAccountDisabledError",
            DomainError::PermissionDenied(_) => "PermissionDeniedError",
            DomainError::NoServicesWithPermission(_) => "NoServicesWithPermissionError",
            DomainError::NotFound(_) => "NotFoundError",
            DomainError::RegistrationSessionMissing(_) => "RegistrationSessionMissingError",
            DomainError::InvalidRegistrationState(_) => "InvalidRegistrationStateError",
            DomainError::InvalidConfiguration(_) => "InvalidConfigurationError",
            DomainError::ExpiredInvite(_) => "ExpiredInviteError",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            DomainError::NotAuthenticated(_) | DomainError::UserAccountDisabled(_) => {
                StatusCode::UNAUTHORIZED
            }
            DomainError::NotAuthorised(_)
            | DomainError::PermissionDenied(_)
            | DomainError::NoServicesWithPermission(_) => StatusCode::FORBIDDEN,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::RegistrationSessionMissing(_)
            | DomainError::InvalidRegistrationState(_) => StatusCode::BAD_REQUEST,
            DomainError::InvalidConfiguration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DomainError::ExpiredInvite(_) => StatusCode::GONE,
        }
    }
}

/// Failure of a call to an upstream HTTP service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{service} responded with {status:?}: {message}")]
pub struct RestClientError {
    pub message: String,
    pub service: String,
    /// `None` when the request never produced a response (connect error, bad body).
    pub status: Option<u16>,
    pub error_identifier: Option<String>,
}

impl RestClientError {
    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    RestClient(#[from] RestClientError),

    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// A single failed form field.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, msg, fields) = match &self {
            AppError::Domain(e) => {
                if matches!(e, DomainError::InvalidConfiguration(_)) {
                    tracing::error!("{}: {}", e.kind(), e);
                } else {
                    tracing::info!("{}: {}", e.kind(), e);
                }
                (e.status(), e.kind(), e.to_string(), None)
            }
            AppError::RestClient(e) if e.is_not_found() => {
                tracing::info!(service = %e.service, "upstream resource not found: {}", e.message);
                (
                    StatusCode::NOT_FOUND,
                    "NotFoundError",
                    "page not found".to_string(),
                    None,
                )
            }
            AppError::RestClient(e) => {
                tracing::error!(
                    service = %e.service,
                    status = ?e.status,
                    error_identifier = ?e.error_identifier,
                    "upstream error: {}",
                    e.message
                );
                (
                    StatusCode::BAD_GATEWAY,
                    "RESTClientError",
                    "there is a problem with the payments platform".to_string(),
                    None,
                )
            }
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "ValidationError",
                "there is a problem with the submitted form".to_string(),
                Some(errors.clone()),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalError",
                    "internal server error".to_string(),
                    None,
                )
            }
        };

        let mut body = json!({
            "error": {
                "message": msg,
                "type": error_type,
            }
        });
        if let Some(fields) = fields {
            body["error"]["fields"] = json!(fields);
        }

        let mut response = (status, Json(body)).into_response();

        if matches!(self, AppError::Domain(DomainError::NotAuthenticated(_))) {
            response
                .headers_mut()
                .insert("location", HeaderValue::from_static("/login"));
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_status_mapping() {
        let cases = [
            (DomainError::NotAuthenticated("x".into()), StatusCode::UNAUTHORIZED),
            (DomainError::UserAccountDisabled("x".into()), StatusCode::UNAUTHORIZED),
            (DomainError::NotAuthorised("x".into()), StatusCode::FORBIDDEN),
            (DomainError::PermissionDenied("x".into()), StatusCode::FORBIDDEN),
            (DomainError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (DomainError::ExpiredInvite("x".into()), StatusCode::GONE),
            (
                DomainError::InvalidConfiguration("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_not_authenticated_redirects_to_login() {
        let resp = AppError::from(DomainError::NotAuthenticated("no user".into())).into_response();
        assert_eq!(resp.headers().get("location").unwrap(), "/login");
    }

    #[test]
    fn test_upstream_404_becomes_not_found() {
        let err = RestClientError {
            message: "gateway account not found".into(),
            service: "connector".into(),
            status: Some(404),
            error_identifier: None,
        };
        assert_eq!(
            AppError::from(err).into_response().status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_upstream_500_becomes_bad_gateway() {
        let err = RestClientError {
            message: "boom".into(),
            service: "adminusers".into(),
            status: Some(500),
            error_identifier: Some("GENERIC".into()),
        };
        assert_eq!(
            AppError::from(err).into_response().status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
