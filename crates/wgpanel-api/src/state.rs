use std::sync::Arc;

use actix_web::web::{self, Data};
use wgpanel_core::UserStore;

use crate::command::CommandRunner;
use crate::config::Config;
use crate::error::ApiError;
use crate::rate_limit::RateLimiter;
use crate::session::SessionStore;

/// Shared handles registered as app data. Cloning is cheap; every field is
/// reference counted.
#[derive(Clone)]
pub struct AppState {
    pub config: Data<Config>,
    pub users: Data<UserStore>,
    pub sessions: Data<SessionStore>,
    pub limiter: Data<RateLimiter>,
    pub runner: Data<dyn CommandRunner>,
}

impl AppState {
    pub fn new(config: Config, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            users: Data::new(UserStore::new(&config.users_file)),
            sessions: Data::new(SessionStore::new(config.session_timeout)),
            limiter: Data::new(RateLimiter::new(&config.rate_limit_dir)),
            runner: Data::from(runner),
            config: Data::new(config),
        }
    }

    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.config.clone())
            .app_data(self.users.clone())
            .app_data(self.sessions.clone())
            .app_data(self.limiter.clone())
            .app_data(self.runner.clone())
            .app_data(
                web::JsonConfig::default()
                    .content_type_required(false)
                    .error_handler(|err, _req| {
                        tracing::debug!(error = %err, "rejected json body");
                        ApiError::Validation("Invalid request body".into()).into()
                    }),
            )
            .app_data(web::FormConfig::default().error_handler(|err, _req| {
                tracing::debug!(error = %err, "rejected form body");
                ApiError::Validation("Invalid request body".into()).into()
            }));
    }
}
