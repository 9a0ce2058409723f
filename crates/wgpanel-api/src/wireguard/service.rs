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

use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, warn};
use wgpanel_core::VpnStatusDetails;

use crate::command::{CommandError, CommandOutput, CommandRunner};
use crate::parse;

const ALREADY_UP: &[&str] = &["already exists"];
const ALREADY_DOWN: &[&str] = &["is not a WireGuard interface", "does not exist"];

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("WireGuard configuration file not found. Please upload a configuration first.")]
    ConfigMissing,

    #[error("Failed to start WireGuard: {0}")]
    StartFailed(String),

    #[error("Failed to stop WireGuard: {0}")]
    StopFailed(String),

    #[error(transparent)]
    Command(#[from] CommandError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceOutcome {
    Started,
    AlreadyRunning,
    Stopped,
    AlreadyStopped,
}

impl ServiceOutcome {
    pub fn message(self) -> &'static str {
        match self {
            Self::Started => "WireGuard started successfully",
            Self::AlreadyRunning => "WireGuard is already running",
            Self::Stopped => "WireGuard stopped successfully",
            Self::AlreadyStopped => "WireGuard is already stopped",
        }
    }
}

fn contains_any(output: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| output.contains(m))
}

/// Drives `wg-quick` and queries interface state for one WireGuard interface.
pub struct ServiceController<'a> {
    runner: &'a dyn CommandRunner,
    interface: &'a str,
    config_path: &'a Path,
}

impl<'a> ServiceController<'a> {
    pub fn new(runner: &'a dyn CommandRunner, interface: &'a str, config_path: &'a Path) -> Self {
        Self {
            runner,
            interface,
            config_path,
        }
    }

    #[tracing::instrument(skip(self), fields(interface = self.interface))]
    pub async fn start(&self) -> Result<ServiceOutcome, ServiceError> {
        if !tokio::fs::try_exists(self.config_path).await.unwrap_or(false) {
            warn!(path = %self.config_path.display(), "refusing to start without config");
            return Err(ServiceError::ConfigMissing);
        }

        let result = self
            .runner
            .run("wg-quick", &["up", self.interface])
            .await?;

        if result.success() {
            info!("wireguard interface brought up");
            Ok(ServiceOutcome::Started)
        } else if contains_any(&result.output, ALREADY_UP) {
            debug!(exit_code = result.exit_code, "interface already up");
            Ok(ServiceOutcome::AlreadyRunning)
        } else {
            warn!(exit_code = result.exit_code, output = %result.output, "wg-quick up failed");
            Err(ServiceError::StartFailed(result.output))
        }
    }

    #[tracing::instrument(skip(self), fields(interface = self.interface))]
    pub async fn stop(&self) -> Result<ServiceOutcome, ServiceError> {
        let result = self
            .runner
            .run("wg-quick", &["down", self.interface])
            .await?;

        if result.success() {
            info!("wireguard interface brought down");
            Ok(ServiceOutcome::Stopped)
        } else if contains_any(&result.output, ALREADY_DOWN) {
            debug!(exit_code = result.exit_code, "interface already down");
            Ok(ServiceOutcome::AlreadyStopped)
        } else {
            warn!(exit_code = result.exit_code, output = %result.output, "wg-quick down failed");
            Err(ServiceError::StopFailed(result.output))
        }
    }

    /// Query link state and `wg show`. See [`VpnStatusDetails::is_active`].
    ///
    /// Never fails: a query that cannot run reads as down.
    #[tracing::instrument(skip(self), fields(interface = self.interface))]
    pub async fn status(&self) -> VpnStatusDetails {
        let mut details = VpnStatusDetails::default();

        if let Some(link) = self.query("ip", &["link", "show", self.interface]).await {
            details.interface_up = link.success() && parse::link_is_up(&link.output);
        }

        if let Some(wg) = self.query("wg", &["show", self.interface]).await {
            details.wg_running = wg.success();
            if details.wg_running && !wg.output.is_empty() {
                details.recent_handshake = parse::handshake_is_recent(&wg.output);
                details.last_handshake = parse::last_handshake(&wg.output);
                details.peer_info = Some(wg.output);
            }
        }

        debug!(
            interface_up = details.interface_up,
            wg_running = details.wg_running,
            recent_handshake = details.recent_handshake,
            "queried wireguard status"
        );
        details
    }

    async fn query(&self, program: &str, args: &[&str]) -> Option<CommandOutput> {
        match self.runner.run(program, args).await {
            Ok(output) => Some(output),
            Err(e) => {
                warn!(error = %e, "status query failed");
                None
            }
        }
    }
}
