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

use std::process::Stdio;
use std::time::Duration;

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

/// Exit code and merged stdout/stderr of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub output: String,
}

impl CommandOutput {
    pub fn new(exit_code: i32, output: impl Into<String>) -> Self {
        Self {
            exit_code,
            output: output.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} did not finish within {}s", .timeout.as_secs())]
    Timeout { program: String, timeout: Duration },
}

/// Runs external programs. Arguments are passed as a vector, never through a shell.
pub trait CommandRunner: Send + Sync {
    fn run<'a>(
        &'a self,
        program: &'a str,
        args: &'a [&'a str],
    ) -> BoxFuture<'a, Result<CommandOutput, CommandError>>;
}

/// Runs commands on the host, optionally through `sudo -n`, with a deadline.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
    use_sudo: bool,
}

impl SystemRunner {
    pub fn new(timeout: Duration, use_sudo: bool) -> Self {
        Self { timeout, use_sudo }
    }

    fn command(&self, program: &str, args: &[&str]) -> Command {
        let mut cmd = if self.use_sudo {
            let mut cmd = Command::new("sudo");
            cmd.arg("-n").arg(program);
            cmd
        } else {
            Command::new(program)
        };
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl CommandRunner for SystemRunner {
    fn run<'a>(
        &'a self,
        program: &'a str,
        args: &'a [&'a str],
    ) -> BoxFuture<'a, Result<CommandOutput, CommandError>> {
        Box::pin(async move {
            // args may carry secrets (wifi psk), so only the program is logged
            debug!(program, sudo = self.use_sudo, "running command");

            let spawn_err = |source| CommandError::Spawn {
                program: program.to_owned(),
                source,
            };
            let child = self.command(program, args).spawn().map_err(spawn_err)?;

            // dropping the wait future on timeout kills the child
            let out = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
                Ok(result) => result.map_err(spawn_err)?,
                Err(_) => {
                    warn!(program, timeout_secs = self.timeout.as_secs(), "command timed out");
                    return Err(CommandError::Timeout {
                        program: program.to_owned(),
                        timeout: self.timeout,
                    });
                }
            };

            let mut output = String::from_utf8_lossy(&out.stdout).into_owned();
            output.push_str(&String::from_utf8_lossy(&out.stderr));
            let output = output.trim_end().to_owned();
            let exit_code = out.status.code().unwrap_or(-1);

            debug!(program, exit_code, "command finished");
            Ok(CommandOutput { exit_code, output })
        })
    }
}
