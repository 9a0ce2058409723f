use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Utc;
use serde::Deserialize;
use wgpanel_core::UserStore;

use crate::auth::{SESSION_COOKIE, authenticate, clear_session_cookie, finish_login, set_session_cookie};
use crate::error::ApiError;
use crate::extract::AuthSession;
use crate::rate_limit::RateLimiter;
use crate::session::SessionStore;

use super::peer_ip;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: Option<String>,
    pub password: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/login", web::post().to(login))
        .route("/logout", web::post().to(logout))
        .route("/check_session", web::get().to(check_session));
}

#[tracing::instrument(skip_all)]
async fn login(
    req: HttpRequest,
    form: Option<web::Form<LoginForm>>,
    users: web::Data<UserStore>,
    limiter: web::Data<RateLimiter>,
    sessions: web::Data<SessionStore>,
) -> Result<HttpResponse, ApiError> {
    // An unreadable body is an attempt with no credentials, not a free retry.
    let (username, password) = match form {
        Some(form) => {
            let LoginForm { username, password } = form.into_inner();
            (username, password)
        }
        None => (None, None),
    };
    let addr = peer_ip(&req);
    let now = Utc::now();

    let username = {
        let (users, limiter, addr) = (users.clone(), limiter.clone(), addr.clone());
        let password = password.clone();
        web::block(move || {
            authenticate(
                &users,
                &limiter,
                &addr,
                username.as_deref(),
                password.as_deref(),
                now,
            )
        })
        .await??
    };

    let previous = req.cookie(SESSION_COOKIE).map(|c| c.value().to_owned());
    let session_id = sessions.regenerate(previous.as_deref(), &username, now);
    tracing::info!(username = %username, addr = %addr, "login success");

    let password = password.unwrap_or_default();
    web::block(move || finish_login(&users, &limiter, &addr, &username, &password)).await?;

    Ok(HttpResponse::Ok()
        .cookie(set_session_cookie(&session_id, sessions.timeout()))
        .json(serde_json::json!({ "success": true, "message": "Login successful" })))
}

#[tracing::instrument(skip_all)]
async fn logout(req: HttpRequest, sessions: web::Data<SessionStore>) -> HttpResponse {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        if sessions.destroy(cookie.value()) {
            tracing::info!("session destroyed");
        }
    }

    HttpResponse::Ok()
        .cookie(clear_session_cookie())
        .json(serde_json::json!({ "success": true, "message": "Logged out successfully" }))
}

async fn check_session(session: Option<AuthSession>) -> HttpResponse {
    let body = match session {
        Some(s) => serde_json::json!({
            "authenticated": true,
            "username": s.username,
            "login_time": s.login_time.timestamp(),
        }),
        None => serde_json::json!({
            "authenticated": false,
            "username": null,
            "login_time": null,
        }),
    };
    HttpResponse::Ok().json(body)
}
