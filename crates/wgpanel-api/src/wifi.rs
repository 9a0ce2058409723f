//! NetworkManager control for the WiFi radio.

use thiserror::Error;
use tracing::{debug, info, warn};
use wgpanel_core::WifiStatus;

use crate::command::{CommandError, CommandOutput, CommandRunner};
use crate::parse;

pub const HOTSPOT_CONNECTION: &str = "hotspot";

#[derive(Debug, Error)]
pub enum WifiError {
    #[error("Invalid SSID. Must be 1-32 printable characters.")]
    InvalidSsid,

    #[error("Invalid password. Must be 8-63 characters.")]
    InvalidPassword,

    #[error("Failed to get WiFi device status")]
    DeviceStatus,

    #[error("No active WiFi connection found")]
    NoActiveConnection,

    #[error("{step}: {output}")]
    StepFailed { step: &'static str, output: String },

    #[error("Failed to restart WiFi: {0}")]
    RestartFailed(String),

    #[error(transparent)]
    Command(#[from] CommandError),
}

fn printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7e).contains(&b))
}

pub fn validate_ssid(ssid: &str) -> bool {
    (1..=32).contains(&ssid.len()) && printable_ascii(ssid)
}

pub fn validate_password(password: &str) -> bool {
    (8..=63).contains(&password.len()) && printable_ascii(password)
}

pub struct WifiController<'a> {
    runner: &'a dyn CommandRunner,
    device: &'a str,
}

impl<'a> WifiController<'a> {
    pub fn new(runner: &'a dyn CommandRunner, device: &'a str) -> Self {
        Self { runner, device }
    }

    async fn nmcli(&self, args: &[&str]) -> Result<CommandOutput, CommandError> {
        self.runner.run("nmcli", args).await
    }

    async fn device_row(&self) -> Result<Option<parse::DeviceRow>, CommandError> {
        let result = self
            .nmcli(&["-t", "-f", "DEVICE,TYPE,STATE,CONNECTION", "device", "status"])
            .await?;
        if !result.success() {
            debug!(exit_code = result.exit_code, "nmcli device status failed");
            return Ok(None);
        }
        Ok(parse::find_device(&result.output, self.device))
    }

    /// Name of the connection currently bound to the device, if any.
    pub async fn current_connection(&self) -> Result<Option<String>, WifiError> {
        let row = self.device_row().await?.ok_or(WifiError::DeviceStatus)?;
        Ok(row.connection)
    }

    /// Replace the device's connection with a WPA2 access point.
    ///
    /// Steps run in order and stop at the first failure. Nothing is rolled
    /// back, so a failure after the delete leaves the device without a
    /// connection.
    #[tracing::instrument(skip(self, password), fields(device = self.device))]
    pub async fn configure_hotspot(&self, ssid: &str, password: &str) -> Result<String, WifiError> {
        if !validate_ssid(ssid) {
            return Err(WifiError::InvalidSsid);
        }
        if !validate_password(password) {
            return Err(WifiError::InvalidPassword);
        }

        let current = self.current_connection().await?;
        let stale = current.as_deref().unwrap_or(HOTSPOT_CONNECTION);
        match self.nmcli(&["connection", "delete", stale]).await {
            Ok(result) if result.success() => info!(connection = stale, "deleted existing connection"),
            Ok(result) => debug!(connection = stale, exit_code = result.exit_code, "nothing to delete"),
            Err(e) => warn!(connection = stale, error = %e, "failed to delete existing connection"),
        }

        let steps: [(&'static str, Vec<&str>); 7] = [
            (
                "Failed to create hotspot connection",
                vec![
                    "connection", "add", "type", "wifi", "ifname", self.device, "con-name",
                    HOTSPOT_CONNECTION, "autoconnect", "yes", "ssid", ssid,
                ],
            ),
            (
                "Failed to set AP mode",
                vec!["connection", "modify", HOTSPOT_CONNECTION, "802-11-wireless.mode", "ap"],
            ),
            (
                "Failed to set band",
                vec!["connection", "modify", HOTSPOT_CONNECTION, "802-11-wireless.band", "bg"],
            ),
            (
                "Failed to set IP sharing",
                vec!["connection", "modify", HOTSPOT_CONNECTION, "ipv4.method", "shared"],
            ),
            (
                "Failed to set security type",
                vec![
                    "connection", "modify", HOTSPOT_CONNECTION,
                    "802-11-wireless-security.key-mgmt", "wpa-psk",
                ],
            ),
            (
                "Failed to set password",
                vec![
                    "connection", "modify", HOTSPOT_CONNECTION,
                    "802-11-wireless-security.psk", password,
                ],
            ),
            (
                "Failed to activate hotspot",
                vec!["connection", "up", HOTSPOT_CONNECTION],
            ),
        ];

        for &(step, ref args) in &steps {
            let result = self.nmcli(args).await?;
            if !result.success() {
                warn!(step, exit_code = result.exit_code, "hotspot step failed");
                return Err(WifiError::StepFailed {
                    step,
                    output: result.output,
                });
            }
        }

        info!(ssid, "hotspot configured");
        Ok(format!("Hotspot '{ssid}' configured and activated successfully"))
    }

    /// Bounce the current connection. `up` only runs after a successful
    /// `down`; if `up` fails the radio stays down.
    #[tracing::instrument(skip(self), fields(device = self.device))]
    pub async fn restart(&self) -> Result<(), WifiError> {
        let connection = self
            .current_connection()
            .await?
            .ok_or(WifiError::NoActiveConnection)?;

        for verb in ["down", "up"] {
            let result = self.nmcli(&["connection", verb, &connection]).await?;
            if !result.success() {
                warn!(connection = %connection, verb, exit_code = result.exit_code, "restart failed");
                return Err(WifiError::RestartFailed(result.output));
            }
        }

        info!(connection = %connection, "wifi connection restarted");
        Ok(())
    }

    /// Best-effort status; unparsed fields keep their defaults and a query
    /// that cannot run is treated like one that failed.
    #[tracing::instrument(skip(self), fields(device = self.device))]
    pub async fn status(&self) -> WifiStatus {
        let mut status = WifiStatus::default();

        let row = match self.device_row().await {
            Ok(row) => row,
            Err(e) => {
                warn!(error = %e, "wifi status query failed");
                None
            }
        };
        let Some(row) = row else {
            return status;
        };
        status.is_connected = row.state == "connected";
        status.device_status = row.state;
        status.connection_name = row.connection;

        let Some(connection) = status.connection_name.clone().filter(|_| status.is_connected)
        else {
            return status;
        };

        if let Some(details) = self.query(&["connection", "show", &connection]).await {
            let parsed = parse::connection_details(&details.output);
            status.ssid = parsed.ssid;
            if let Some(mode) = parsed.mode {
                status.is_hotspot = mode == "ap";
                status.mode = mode;
            }
            status.ip_address = parsed.ip_address;
        }

        if let Some(list) = self
            .query(&["-t", "-f", "IN-USE,CHAN,SIGNAL", "device", "wifi", "list"])
            .await
        {
            if let Some(network) = parse::in_use_network(&list.output) {
                status.channel = network.channel;
                status.signal = network.signal;
            }
        }

        status
    }

    /// Output of a successful nmcli call; failures are logged and dropped.
    async fn query(&self, args: &[&str]) -> Option<CommandOutput> {
        match self.nmcli(args).await {
            Ok(result) if result.success() => Some(result),
            Ok(result) => {
                debug!(exit_code = result.exit_code, "nmcli status query failed");
                None
            }
            Err(e) => {
                warn!(error = %e, "wifi status query failed");
                None
            }
        }
    }
}
