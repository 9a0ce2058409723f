//! HTTP admin panel for a WireGuard/NetworkManager gateway.

pub mod auth;
pub mod command;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod parse;
pub mod rate_limit;
pub mod routes;
pub mod session;
pub mod state;
pub mod wifi;
pub mod wireguard;

use actix_web::web;

pub use state::AppState;

/// Registers app data and every route.
pub fn app_config(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        state.configure(cfg);
        routes::configure(cfg);
    }
}
