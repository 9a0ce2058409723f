// Copyright (C) 2025 Joseph Sacchini
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU Affero General Public License as published by the Free
// Software Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more
// details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use actix_web::cookie::time::Duration;
use actix_web::cookie::{Cookie, SameSite};
use chrono::{DateTime, Utc};
use wgpanel_core::UserStore;
use wgpanel_core::user::{is_valid_username, verify_dummy};

use crate::error::ApiError;
use crate::rate_limit::RateLimiter;

pub const SESSION_COOKIE: &str = "session";

pub fn set_session_cookie(session_id: &str, max_age: chrono::Duration) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, session_id.to_owned())
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(Duration::seconds(max_age.num_seconds()))
        .finish()
}

pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, "")
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(Duration::ZERO)
        .finish()
}

/// Check a login attempt against the rate limit and the user file.
///
/// The attempt is counted before any credential work, in the same locked
/// step as the limit check; [`finish_login`] clears the count on success.
/// Returns the trimmed username. Blocking: hashes and reads files.
#[tracing::instrument(skip(users, limiter, password))]
pub fn authenticate(
    users: &UserStore,
    limiter: &RateLimiter,
    addr: &str,
    username: Option<&str>,
    password: Option<&str>,
    now: DateTime<Utc>,
) -> Result<String, ApiError> {
    if !limiter.reserve_at(addr, now.timestamp())? {
        tracing::warn!(addr, "login rate limited");
        return Err(ApiError::RateLimited);
    }

    let username = username.map(str::trim).unwrap_or_default();
    let password = password.unwrap_or_default();
    if username.is_empty() || password.is_empty() {
        return Err(ApiError::Validation(
            "Username and password cannot be empty".into(),
        ));
    }

    if !is_valid_username(username) {
        return Err(ApiError::Validation("Invalid username format".into()));
    }

    let directory = users.load()?;
    if directory.is_empty() {
        tracing::error!(path = %users.path().display(), "no users configured");
        return Err(ApiError::NotConfigured);
    }

    let Some(record) = directory.get(username).filter(|r| r.is_active) else {
        verify_dummy(password);
        tracing::warn!(username, addr, "login failed: unknown or inactive user");
        return Err(ApiError::InvalidCredentials);
    };

    if !users.verify_password(record, password)? {
        tracing::warn!(username, addr, "login failed: invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    Ok(username.to_owned())
}

/// Post-login bookkeeping. Both writes are best effort.
#[tracing::instrument(skip(users, limiter, password))]
pub fn finish_login(users: &UserStore, limiter: &RateLimiter, addr: &str, username: &str, password: &str) {
    if let Err(e) = users.record_login(username, password) {
        tracing::error!(error = %e, username, "failed to update last login");
    }
    if let Err(e) = limiter.clear(addr) {
        tracing::error!(error = %e, addr, "failed to clear login attempts");
    }
}
