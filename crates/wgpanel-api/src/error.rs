use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use wgpanel_core::UserStoreError;

use crate::command::CommandError;
use crate::rate_limit::RateLimitError;
use crate::wifi::WifiError;
use crate::wireguard::editor::EditorError;
use crate::wireguard::service::ServiceError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthenticated,

    #[error("Unauthorized")]
    SessionExpired,

    #[error("Too many login attempts. Please try again later.")]
    RateLimited,

    #[error("{0}")]
    Validation(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Authentication system not configured")]
    NotConfigured,

    #[error("Username already exists")]
    DuplicateUser,

    #[error("User not found")]
    UserNotFound,

    #[error("{0}")]
    ConfigNotFound(String),

    #[error("{0}")]
    ConfigFormatInvalid(String),

    #[error("{0}")]
    Io(String),

    #[error("{0}")]
    CommandFailed(String),

    #[error("Command timed out")]
    CommandTimeout,

    #[error("{0}")]
    DeviceNotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Internal server error")]
    Internal,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated | Self::SessionExpired | Self::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Validation(_) | Self::ConfigFormatInvalid(_) => StatusCode::BAD_REQUEST,
            Self::UserNotFound | Self::ConfigNotFound(_) | Self::DeviceNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::DuplicateUser => StatusCode::CONFLICT,
            Self::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            Self::CommandFailed(_) => StatusCode::BAD_GATEWAY,
            Self::CommandTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Io(_) | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "success": false, "message": self.to_string() }))
    }
}

impl From<UserStoreError> for ApiError {
    fn from(err: UserStoreError) -> Self {
        match err {
            UserStoreError::InvalidUsername | UserStoreError::WeakPassword => {
                Self::Validation(err.to_string())
            }
            UserStoreError::DuplicateUser(_) => Self::DuplicateUser,
            UserStoreError::UserNotFound(_) => Self::UserNotFound,
            UserStoreError::Corrupt(_)
            | UserStoreError::Serialize(_)
            | UserStoreError::PasswordHash
            | UserStoreError::Io(_) => {
                tracing::error!(error = %err, "user store error");
                Self::Internal
            }
        }
    }
}

impl From<CommandError> for ApiError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Timeout { .. } => {
                tracing::warn!(error = %err, "command timed out");
                Self::CommandTimeout
            }
            CommandError::Spawn { .. } => {
                tracing::error!(error = %err, "command could not be run");
                Self::Internal
            }
        }
    }
}

impl From<EditorError> for ApiError {
    fn from(err: EditorError) -> Self {
        match err {
            EditorError::NotFound => Self::ConfigNotFound(err.to_string()),
            EditorError::EmptyInput => Self::Validation(err.to_string()),
            EditorError::FormatInvalid | EditorError::MissingFields => {
                Self::ConfigFormatInvalid(err.to_string())
            }
            EditorError::Read(ref source)
            | EditorError::DirCreate(ref source)
            | EditorError::Write(ref source) => {
                tracing::error!(error = %err, cause = %source, "wireguard config io error");
                Self::Io(err.to_string())
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::ConfigMissing => Self::ConfigNotFound(err.to_string()),
            ServiceError::StartFailed(_) | ServiceError::StopFailed(_) => {
                Self::CommandFailed(err.to_string())
            }
            ServiceError::Command(e) => e.into(),
        }
    }
}

impl From<WifiError> for ApiError {
    fn from(err: WifiError) -> Self {
        match err {
            WifiError::InvalidSsid | WifiError::InvalidPassword => {
                Self::Validation(err.to_string())
            }
            WifiError::DeviceStatus | WifiError::NoActiveConnection => {
                Self::DeviceNotFound(err.to_string())
            }
            WifiError::StepFailed { .. } | WifiError::RestartFailed(_) => {
                Self::CommandFailed(err.to_string())
            }
            WifiError::Command(e) => e.into(),
        }
    }
}

impl From<RateLimitError> for ApiError {
    fn from(err: RateLimitError) -> Self {
        tracing::error!(error = %err, "rate limit store error");
        Self::Internal
    }
}

impl From<actix_web::error::BlockingError> for ApiError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        tracing::error!(error = %err, "blocking task failed");
        Self::Internal
    }
}
