#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use wgpanel_api::AppState;
use wgpanel_api::command::{CommandError, CommandOutput, CommandRunner};
use wgpanel_api::config::Config;

#[derive(Clone)]
enum Scripted {
    Output(CommandOutput),
    Timeout,
}

/// Replays canned outputs keyed by the full command line. Each rule is a
/// queue; the last entry repeats once the rest are used up. Unscripted
/// commands exit 127.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, command_line: &str, exit_code: i32, output: &str) -> &Self {
        self.push(command_line, Scripted::Output(CommandOutput::new(exit_code, output)))
    }

    /// The command never finishes; the runner reports a timeout.
    pub fn hang(&self, command_line: &str) -> &Self {
        self.push(command_line, Scripted::Timeout)
    }

    fn push(&self, command_line: &str, outcome: Scripted) -> &Self {
        self.rules
            .lock()
            .unwrap()
            .entry(command_line.to_owned())
            .or_default()
            .push_back(outcome);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run<'a>(
        &'a self,
        program: &'a str,
        args: &'a [&'a str],
    ) -> BoxFuture<'a, Result<CommandOutput, CommandError>> {
        let line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.lock().unwrap().push(line.clone());

        let mut rules = self.rules.lock().unwrap();
        let outcome = match rules.get_mut(&line) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Scripted::Output(CommandOutput::new(
                127,
                format!("{program}: command not scripted"),
            )),
        };
        let result = match outcome {
            Scripted::Output(output) => Ok(output),
            Scripted::Timeout => Err(CommandError::Timeout {
                program: program.to_owned(),
                timeout: Duration::from_secs(5),
            }),
        };
        Box::pin(async move { result })
    }
}

pub struct TestEnv {
    pub dir: tempfile::TempDir,
    pub config: Config,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            bind_addr: "127.0.0.1:0".into(),
            users_file: dir.path().join("users.json"),
            wg_config_path: dir.path().join("wireguard").join("wg0.conf"),
            wg_interface: "wg0".into(),
            wifi_device: "wlan0".into(),
            rate_limit_dir: dir.path().join("attempts"),
            session_timeout: Duration::from_secs(1800),
            command_timeout: Duration::from_secs(5),
            use_sudo: false,
        };
        std::fs::create_dir_all(&config.rate_limit_dir).unwrap();
        Self { dir, config }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn wg_config(&self) -> PathBuf {
        self.config.wg_config_path.clone()
    }

    pub fn state(&self, runner: Arc<ScriptedRunner>) -> AppState {
        AppState::new(self.config.clone(), runner)
    }
}

pub const VALID_WG: &str = "\
[Interface]
PrivateKey = yAnz5TF+lXXJte14tji3zlMNq+hd2rYUIgJBgB3fBmk=
Address = 10.0.0.2/32

[Peer]
PublicKey = xTIBA5rboUvnH4htodjb6e697QjLERt1NAB4mZqp8Dg=
Endpoint = vpn.example.com:51820
AllowedIPs = 0.0.0.0/0
";

pub const PEER: &str = "192.0.2.10:40000";

pub fn login_request(username: &str, password: &str) -> actix_web::test::TestRequest {
    actix_web::test::TestRequest::post()
        .uri("/login")
        .peer_addr(PEER.parse().unwrap())
        .set_form(vec![("username", username), ("password", password)])
}

pub fn session_cookie(
    resp: &actix_web::dev::ServiceResponse,
) -> Option<actix_web::cookie::Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == "session")
        .map(|c| c.into_owned())
}

/// Cookie for a fresh session, skipping the login round trip.
pub fn auth_cookie(state: &AppState) -> actix_web::cookie::Cookie<'static> {
    let id = state
        .sessions
        .regenerate(None, "admin", chrono::Utc::now());
    actix_web::cookie::Cookie::new("session", id)
}
