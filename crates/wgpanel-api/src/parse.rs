//! Scrapers for `ip`, `wg` and `nmcli` text output.
//!
//! Every function returns `None`/`false` for output it does not recognise;
//! callers treat that as "unknown", never as an error.

use std::sync::LazyLock;

use regex::Regex;

static HANDSHAKE_RECENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"latest handshake.*ago").expect("valid regex"));
static HANDSHAKE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"latest handshake: (.+)").expect("valid regex"));
static CONN_SSID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"802-11-wireless\.ssid:\s+(.+)").expect("valid regex"));
static CONN_MODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"802-11-wireless\.mode:\s+(.+)").expect("valid regex"));
static CONN_IP4: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"IP4\.ADDRESS\[1\]:\s+([0-9.]+)/\d+").expect("valid regex")
});

/// `ip link show <iface>`: true when the `<...>` flag list contains `UP`.
pub fn link_is_up(output: &str) -> bool {
    output.lines().take(1).any(|line| {
        let Some(start) = line.find('<') else {
            return false;
        };
        let Some(len) = line[start..].find('>') else {
            return false;
        };
        line[start + 1..start + len].split(',').any(|flag| flag == "UP")
    })
}

/// `wg show <iface>`: a peer reports `latest handshake: ... ago`.
pub fn handshake_is_recent(output: &str) -> bool {
    HANDSHAKE_RECENT.is_match(output)
}

/// `wg show <iface>`: the text after the first `latest handshake:`.
pub fn last_handshake(output: &str) -> Option<String> {
    HANDSHAKE_LINE
        .captures(output)
        .map(|caps| caps[1].trim().to_owned())
}

/// Split one line of `nmcli -t` output, honouring `\:` and `\\` escapes.
pub fn split_terse(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ':' => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// One row of `nmcli -t -f DEVICE,TYPE,STATE,CONNECTION device status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRow {
    pub device: String,
    pub kind: String,
    pub state: String,
    pub connection: Option<String>,
}

pub fn find_device(output: &str, device: &str) -> Option<DeviceRow> {
    output.lines().find_map(|line| {
        let mut fields = split_terse(line).into_iter();
        let name = fields.next()?;
        if name != device {
            return None;
        }
        let kind = fields.next().unwrap_or_default();
        let state = fields.next().unwrap_or_default();
        let connection = fields
            .next()
            .filter(|c| !c.is_empty() && c != "--");
        Some(DeviceRow {
            device: name,
            kind,
            state,
            connection,
        })
    })
}

/// Fields of interest from `nmcli connection show <name>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionDetails {
    pub ssid: Option<String>,
    pub mode: Option<String>,
    pub ip_address: Option<String>,
}

pub fn connection_details(output: &str) -> ConnectionDetails {
    let field = |re: &Regex| re.captures(output).map(|caps| caps[1].trim().to_owned());
    ConnectionDetails {
        ssid: field(&CONN_SSID),
        mode: field(&CONN_MODE),
        ip_address: field(&CONN_IP4),
    }
}

/// Channel and signal of the `*` row in `nmcli -t -f IN-USE,CHAN,SIGNAL device wifi list`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InUseNetwork {
    pub channel: Option<String>,
    pub signal: Option<String>,
}

pub fn in_use_network(output: &str) -> Option<InUseNetwork> {
    output.lines().find_map(|line| {
        let fields = split_terse(line);
        if fields.first().map(String::as_str) != Some("*") {
            return None;
        }
        let non_empty = |i: usize| fields.get(i).filter(|f| !f.is_empty()).cloned();
        Some(InUseNetwork {
            channel: non_empty(1),
            signal: non_empty(2),
        })
    })
}
