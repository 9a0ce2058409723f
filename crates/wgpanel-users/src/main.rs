use std::process::ExitCode;

use wgpanel_users::{CliError, run};

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    #[cfg(distribute)]
    {
        fmt().json().with_env_filter(filter).with_writer(std::io::stderr).init();
    }

    #[cfg(not(distribute))]
    {
        fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    }
}

fn main() -> ExitCode {
    init_tracing();

    match run(std::env::args_os()) {
        Ok(message) => {
            println!("{message}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            match &e {
                CliError::Usage(usage) => {
                    let _ = usage.print();
                }
                CliError::Store(_) => eprintln!("{e}"),
            }
            ExitCode::from(e.exit_code())
        }
    }
}
