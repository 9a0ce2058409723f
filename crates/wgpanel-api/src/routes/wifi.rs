use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Deserialize;
use wgpanel_core::timestamp;

use crate::command::CommandRunner;
use crate::config::Config;
use crate::error::ApiError;
use crate::extract::AuthSession;
use crate::wifi::WifiController;

#[derive(Debug, Deserialize)]
pub struct WifiConfigRequest {
    pub action: Option<String>,
    pub ssid: Option<String>,
    pub password: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/wifi_config")
            .route(web::post().to(wifi_config))
            .default_service(web::to(super::method_not_allowed)),
    )
    .route("/wifi_status", web::get().to(wifi_status));
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[tracing::instrument(skip_all, fields(user = %auth.username))]
async fn wifi_config(
    auth: AuthSession,
    config: web::Data<Config>,
    runner: web::Data<dyn CommandRunner>,
    body: web::Json<WifiConfigRequest>,
) -> Result<HttpResponse, ApiError> {
    let controller = WifiController::new(runner.get_ref(), &config.wifi_device);

    let message = match non_empty(body.action.as_deref()) {
        None => return Err(ApiError::Validation("Action parameter required".into())),
        Some("configure_hotspot") => {
            let (Some(ssid), Some(password)) = (
                non_empty(body.ssid.as_deref()),
                non_empty(body.password.as_deref()),
            ) else {
                return Err(ApiError::Validation("SSID and password required".into()));
            };
            let message = controller.configure_hotspot(ssid, password).await?;
            tracing::info!(user = %auth.username, ssid, "hotspot configured");
            message
        }
        Some("restart") => {
            controller.restart().await?;
            tracing::info!(user = %auth.username, "wifi restarted");
            "WiFi connection restarted successfully".to_owned()
        }
        Some(_) => return Err(ApiError::Validation("Invalid action".into())),
    };

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": message,
    })))
}

#[tracing::instrument(skip_all, fields(user = %auth.username))]
async fn wifi_status(
    auth: AuthSession,
    config: web::Data<Config>,
    runner: web::Data<dyn CommandRunner>,
) -> Result<HttpResponse, ApiError> {
    let status = WifiController::new(runner.get_ref(), &config.wifi_device)
        .status()
        .await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "wifi_status": status,
        "timestamp": timestamp::format(&Utc::now()),
    })))
}
