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

//! Status payloads reported by the API.

use serde::{Deserialize, Serialize};

/// Results of querying the WireGuard interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpnStatusDetails {
    /// `ip link` reports the interface administratively up.
    pub interface_up: bool,
    /// `wg show` succeeded for the interface.
    pub wg_running: bool,
    /// `wg show` mentions a handshake "... ago".
    pub recent_handshake: bool,
    /// Text following `latest handshake:`, if any.
    pub last_handshake: Option<String>,
    /// Raw `wg show` output while running.
    pub peer_info: Option<String>,
}

impl VpnStatusDetails {
    /// Interface up and reported by `wg`. Handshake recency is not required.
    pub fn is_active(&self) -> bool {
        self.interface_up && self.wg_running
    }
}

/// WiFi radio state as reported by NetworkManager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiStatus {
    /// Device `STATE` column, `"unknown"` when unparsed.
    pub device_status: String,
    /// Active connection profile name.
    pub connection_name: Option<String>,
    /// SSID of the active profile.
    pub ssid: Option<String>,
    /// `802-11-wireless.mode` (`ap`, `infrastructure`, ...), `"unknown"` when unparsed.
    pub mode: String,
    /// Channel of the in-use network.
    pub channel: Option<String>,
    /// Signal strength of the in-use network.
    pub signal: Option<String>,
    /// First IPv4 address of the connection, without prefix.
    pub ip_address: Option<String>,
    /// Radio is acting as an access point.
    pub is_hotspot: bool,
    /// Device state is `connected`.
    pub is_connected: bool,
}

impl Default for WifiStatus {
    fn default() -> Self {
        Self {
            device_status: "unknown".into(),
            connection_name: None,
            ssid: None,
            mode: "unknown".into(),
            channel: None,
            signal: None,
            ip_address: None,
            is_hotspot: false,
            is_connected: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(true, true, false, true; "up and running without handshake")]
    #[test_case(true, false, false, false; "link up only")]
    #[test_case(false, true, true, false; "wg running but link down")]
    fn active_ignores_handshake(up: bool, running: bool, handshake: bool, expected: bool) {
        let details = VpnStatusDetails {
            interface_up: up,
            wg_running: running,
            recent_handshake: handshake,
            ..Default::default()
        };
        assert_eq!(details.is_active(), expected);
    }

    #[test]
    fn wifi_defaults_serialize() {
        let json = serde_json::to_value(WifiStatus::default()).unwrap();
        assert_eq!(json["device_status"], "unknown");
        assert_eq!(json["mode"], "unknown");
        assert!(json["ssid"].is_null());
        assert_eq!(json["is_hotspot"], false);
    }
}
