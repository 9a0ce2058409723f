use actix_web::{HttpRequest, HttpResponse, web};

use crate::error::ApiError;
use crate::extract::AuthSession;

pub mod auth;
pub mod vpn;
pub mod wifi;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .configure(auth::configure)
        .service(
            web::scope("/api")
                .configure(vpn::configure)
                .configure(wifi::configure),
        );
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Fallback for guarded resources hit with the wrong verb. Authentication is
/// checked first, so anonymous callers still see 401.
pub(crate) async fn method_not_allowed(_auth: AuthSession) -> Result<HttpResponse, ApiError> {
    Err(ApiError::MethodNotAllowed)
}

/// Client address used for rate limiting: the socket peer, never a header.
pub(crate) fn peer_ip(req: &HttpRequest) -> String {
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}
