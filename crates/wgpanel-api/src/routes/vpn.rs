use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Deserialize;
use wgpanel_core::timestamp;

use crate::command::CommandRunner;
use crate::config::Config;
use crate::error::ApiError;
use crate::extract::AuthSession;
use crate::wireguard::{ConfigEditor, ServiceController};

#[derive(Debug, Deserialize)]
pub struct SaveConfigRequest {
    pub config: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub action: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/load_config", web::get().to(load_config))
        .route("/save_config", web::post().to(save_config))
        .route("/status", web::get().to(status))
        .service(
            web::resource("/toggle")
                .route(web::post().to(toggle))
                .default_service(web::to(super::method_not_allowed)),
        );
}

#[tracing::instrument(skip_all, fields(user = %auth.username))]
async fn load_config(
    auth: AuthSession,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let editor = ConfigEditor::new(&config.wg_config_path);
    let text = editor.load().await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "config": text,
        "message": format!("Configuration loaded from {}", editor.path().display()),
    })))
}

#[tracing::instrument(skip_all, fields(user = %auth.username))]
async fn save_config(
    auth: AuthSession,
    config: web::Data<Config>,
    body: web::Json<SaveConfigRequest>,
) -> Result<HttpResponse, ApiError> {
    let editor = ConfigEditor::new(&config.wg_config_path);
    editor.save(body.config.as_deref().unwrap_or_default()).await?;
    tracing::info!(user = %auth.username, path = %editor.path().display(), "wireguard config replaced");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": format!("Configuration saved to {}", editor.path().display()),
    })))
}

#[tracing::instrument(skip_all, fields(user = %auth.username))]
async fn status(
    auth: AuthSession,
    config: web::Data<Config>,
    runner: web::Data<dyn CommandRunner>,
) -> Result<HttpResponse, ApiError> {
    let details = ServiceController::new(runner.get_ref(), &config.wg_interface, &config.wg_config_path)
        .status()
        .await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "isActive": details.is_active(),
        "details": details,
        "timestamp": timestamp::format(&Utc::now()),
    })))
}

#[tracing::instrument(skip_all, fields(user = %auth.username))]
async fn toggle(
    auth: AuthSession,
    config: web::Data<Config>,
    runner: web::Data<dyn CommandRunner>,
    body: web::Json<ToggleRequest>,
) -> Result<HttpResponse, ApiError> {
    let controller =
        ServiceController::new(runner.get_ref(), &config.wg_interface, &config.wg_config_path);

    let outcome = match body.action.as_deref() {
        Some("start") => controller.start().await?,
        Some("stop") => controller.stop().await?,
        _ => {
            return Err(ApiError::Validation(
                r#"Invalid action. Use "start" or "stop"."#.into(),
            ));
        }
    };
    tracing::info!(user = %auth.username, ?outcome, "wireguard toggled");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": outcome.message(),
    })))
}
