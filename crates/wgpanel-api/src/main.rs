use std::sync::Arc;

use actix_web::{App, HttpServer};
use tracing::info;

use wgpanel_api::command::SystemRunner;
use wgpanel_api::config::Config;
use wgpanel_api::middleware::RequestLogger;
use wgpanel_api::{AppState, app_config};

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    #[cfg(distribute)]
    {
        fmt().json().with_env_filter(filter).init();
    }

    #[cfg(not(distribute))]
    {
        fmt().pretty().with_env_filter(filter).init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env().expect("failed to load configuration");
    info!(
        addr = %config.bind_addr,
        version = env!("GIT_VERSION"),
        users_file = %config.users_file.display(),
        wg_interface = %config.wg_interface,
        wifi_device = %config.wifi_device,
        "starting wgpanel-api"
    );

    let runner = Arc::new(SystemRunner::new(config.command_timeout, config.use_sudo));
    let bind = config.bind_addr.clone();
    let state = AppState::new(config, runner);

    HttpServer::new(move || {
        App::new()
            .wrap(RequestLogger)
            .configure(app_config(state.clone()))
    })
    .bind(&bind)?
    .run()
    .await
}
