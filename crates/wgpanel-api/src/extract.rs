use actix_web::dev::Payload;
use actix_web::web::Data;
use actix_web::{FromRequest, HttpRequest};
use chrono::{DateTime, Utc};
use std::future::{Ready, ready};

use crate::auth::SESSION_COOKIE;
use crate::error::ApiError;
use crate::session::{SessionError, SessionStore};

/// The authenticated operator behind a request. Handlers that take this are
/// guarded; a missing, unknown or expired session rejects with 401.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub session_id: String,
    pub username: String,
    pub login_time: DateTime<Utc>,
}

impl FromRequest for AuthSession {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_session(req))
    }
}

fn extract_session(req: &HttpRequest) -> Result<AuthSession, ApiError> {
    let store = req
        .app_data::<Data<SessionStore>>()
        .ok_or(ApiError::Internal)?;

    let cookie = req.cookie(SESSION_COOKIE).ok_or(ApiError::Unauthenticated)?;
    let session_id = cookie.value().to_owned();

    match store.validate(&session_id, Utc::now()) {
        Ok(session) => Ok(AuthSession {
            session_id,
            username: session.username,
            login_time: session.login_time,
        }),
        Err(SessionError::Unknown) => {
            tracing::debug!(path = %req.path(), "unknown session id");
            Err(ApiError::Unauthenticated)
        }
        Err(SessionError::Expired) => {
            tracing::info!(path = %req.path(), "session expired");
            Err(ApiError::SessionExpired)
        }
    }
}
