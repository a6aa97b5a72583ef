//! `imusim` – synthetic IMU/GNSS telemetry source.
//!
//! Stands in for real inertial/GNSS hardware while developing clients.  The
//! binary:
//!
//! 1. Initialises structured logging (see [`telemetry`]).
//! 2. Loads `~/.imusim/config.toml` (or `$IMUSIM_CONFIG`), falling back to
//!    defaults, then applies `IMUSIM_*` overrides.
//! 3. Serves one WebSocket stream per connected consumer until Ctrl-C.
//!
//! `imusim init` writes the default configuration file and exits.

mod config;
mod telemetry;

use std::process::ExitCode;

use colored::Colorize;
use imusim_server::TelemetryServer;
use tracing::{error, info, warn};

fn main() -> ExitCode {
    let _guard = telemetry::init_tracing("imusim");

    print_banner();

    if std::env::args().nth(1).as_deref() == Some("init") {
        return write_default_config();
    }

    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            info!(path = %config::config_path().display(), "config loaded");
            cfg
        }
        Ok(None) => {
            info!(
                path = %config::config_path().display(),
                "no config file, using defaults"
            );
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
        Err(e) => {
            error!(error = %e, "config error");
            return ExitCode::FAILURE;
        }
    };

    let server = TelemetryServer::new(cfg.to_server_config());
    let shutdown = server.shutdown_handle();

    if let Err(e) = ctrlc::set_handler(move || {
        if shutdown.is_triggered() {
            eprintln!("{}", "  Second Ctrl-C, exiting without waiting for sessions.".red());
            std::process::exit(130);
        }
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping telemetry streams …".yellow().bold());
        shutdown.trigger();
    }) {
        warn!(error = %e, "failed to install Ctrl-C handler; stop the process with a signal instead");
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to start tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    println!(
        "  Streaming {} profile on {} at {} Hz\n",
        cfg.signal.profile.to_string().bold(),
        format!("ws://{}:{}", cfg.host, cfg.port).bold().cyan(),
        cfg.rate_hz
    );

    match runtime.block_on(server.run()) {
        Ok(()) => {
            println!("{}", "  ✓ Exiting imusim.".green());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "telemetry server failed");
            ExitCode::FAILURE
        }
    }
}

fn write_default_config() -> ExitCode {
    match config::save(&config::Config::default()) {
        Ok(path) => {
            println!(
                "  {} Config written to {}",
                "✓".green().bold(),
                path.display().to_string().bold()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "failed to write config");
            ExitCode::FAILURE
        }
    }
}

fn print_banner() {
    println!();
    println!(
        "  {} {}",
        "imusim".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Synthetic IMU / GNSS telemetry source");
    println!();
}
