//! Billboard deploy entry point: CLI dispatch and the provisioning run.

mod app;
mod config;
mod deploy;
mod system;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use app::cli::{Args, HELP_TEXT};
use app::logging::init_tracing;
use config::persistence::load_config;
use deploy::install::Installer;
use deploy::service::{has_systemd, render_unit, uninstall};
use deploy::status::{run_health_check, show_status};
use system::runner::SystemRunner;

fn require_root(action: &str) -> Result<()> {
    if !system::is_root() {
        return Err(anyhow::anyhow!(
            "Root privileges required. Run with: sudo billboard-deploy --{}",
            action
        ));
    }
    Ok(())
}

fn require_systemd() -> Result<()> {
    if !has_systemd() {
        eprintln!("❌ systemd not detected on this system.");
        eprintln!("   The daemon can still run manually from the venv:");
        eprintln!("   /opt/billboard/venv/bin/python /opt/billboard/billboard.py");
        return Err(anyhow::anyhow!("systemd is required to install the service"));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse arguments with custom error handling
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            if err.kind() == clap::error::ErrorKind::DisplayHelp {
                print!("{}", HELP_TEXT);
                std::process::exit(0);
            }
            if err.kind() == clap::error::ErrorKind::DisplayVersion {
                println!(
                    "\x1b[32mbillboard-deploy {} ({})\x1b[0m",
                    env!("CARGO_PKG_VERSION"),
                    std::env::consts::ARCH
                );
                std::process::exit(0);
            }

            eprintln!("{}", err);
            eprintln!();
            print!("{}", HELP_TEXT);
            eprintln!("\nFor more information, try '--help'.");
            std::process::exit(1);
        }
    };

    // Log level priority: --log-level flag, LOG_LEVEL env, default (info)
    let log_level = if let Some(level) = args.log_level.as_ref() {
        level.to_lowercase()
    } else if let Ok(env_level) = std::env::var("LOG_LEVEL") {
        env_level.to_lowercase()
    } else {
        "info".to_string()
    };

    let filter = match log_level.as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" => "warn",
        "error" => "error",
        _ => {
            eprintln!(
                "Invalid log level '{}'. Using INFO. Valid levels: TRACE, DEBUG, INFO, WARN, ERROR",
                log_level
            );
            "info"
        }
    };

    init_tracing(filter);

    let mut config = load_config(args.config_file.as_deref()).await?;
    args.apply_overrides(&mut config);

    if args.config {
        println!("\n{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    if args.render {
        print!("{}", render_unit(&config));
        return Ok(());
    }

    if args.install {
        require_root("install")?;
        require_systemd()?;

        info!(
            "Deploying {} v{} to {}",
            config.service.name,
            env!("CARGO_PKG_VERSION"),
            config.paths.install_dir.display()
        );

        let installer = Installer::new(config.clone(), Arc::new(SystemRunner));
        installer.run().await?;

        println!();
        println!("\x1b[32m✓ Billboard service deployed\x1b[0m");
        println!("  Unit:   {}", config.unit_path().display());
        println!("  Python: {}", config.venv_python().display());
        println!("  Logs:   {}", config.stdout_log().display());
        println!();
        println!("Check it with: systemctl status {}", config.service.name);
        return Ok(());
    }

    if args.uninstall {
        require_root("uninstall")?;
        return uninstall(&config, &SystemRunner).await;
    }

    if args.status {
        return show_status(&config, &SystemRunner).await;
    }

    if args.check {
        return run_health_check(&config, &SystemRunner).await;
    }

    // No command was provided
    eprintln!("ERROR: No command specified. You must specify a command.");
    eprintln!();
    print!("{}", HELP_TEXT);
    eprintln!();
    eprintln!("Common commands:");
    eprintln!("  sudo billboard-deploy --install     Provision and start the service");
    eprintln!("  billboard-deploy --check            Verify the deployment");
    eprintln!("  billboard-deploy -i                 Show status");
    std::process::exit(1);
}
