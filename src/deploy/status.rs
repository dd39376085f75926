//! Deployment inspection: status summary and health check.

use std::fs;

use anyhow::Result;

use crate::config::types::DeployConfig;
use crate::deploy::service::has_systemd;
use crate::system::runner::CommandRunner;

async fn systemctl_query(runner: &dyn CommandRunner, verb: &str, name: &str) -> Option<String> {
    match runner.run("systemctl", &[verb, name]).await {
        Ok(output) => {
            let state = output.stdout.trim().to_string();
            if state.is_empty() {
                None
            } else {
                Some(state)
            }
        }
        Err(_) => None,
    }
}

pub async fn show_status(config: &DeployConfig, runner: &dyn CommandRunner) -> Result<()> {
    println!(
        "\x1b[32mbillboard-deploy v{} ({})\x1b[0m",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::ARCH
    );
    println!("================================");

    println!("Service: {}", config.service.name);
    println!("Install dir: {}", config.paths.install_dir.display());

    if config.installed_script().exists() {
        println!("Daemon source: installed");
    } else {
        println!("Daemon source: not installed");
    }

    if config.venv_python().exists() {
        println!("Virtual environment: present");
    } else {
        println!("Virtual environment: missing");
    }

    if config.unit_path().exists() {
        println!("Service unit: {}", config.unit_path().display());
        let active = systemctl_query(runner, "is-active", &config.service.name)
            .await
            .unwrap_or_else(|| "unknown".to_string());
        let enabled = systemctl_query(runner, "is-enabled", &config.service.name)
            .await
            .unwrap_or_else(|| "unknown".to_string());
        println!("State: {} ({})", active, enabled);
    } else {
        println!("Service unit: not installed");
    }

    Ok(())
}

/// Verify the deployed installation end to end.
pub async fn run_health_check(config: &DeployConfig, runner: &dyn CommandRunner) -> Result<()> {
    println!(
        "\x1b[32mbillboard-deploy v{} ({})\x1b[0m",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::ARCH
    );
    println!("Health Check");
    println!("============\n");

    let mut all_ok = true;

    if config.installed_script().exists() {
        println!("✓ Daemon source: {}", config.installed_script().display());
    } else {
        println!("✗ Daemon source: NOT FOUND");
        println!("  Run: sudo billboard-deploy --install");
        all_ok = false;
    }

    if config.venv_python().exists() {
        println!("✓ Venv interpreter: {}", config.venv_python().display());
    } else {
        println!("✗ Venv interpreter: NOT FOUND");
        all_ok = false;
    }

    if config.paths.log_dir.exists() {
        println!("✓ Log dir: {}", config.paths.log_dir.display());
    } else {
        println!("⚠ Log dir: Not created (will be created on install)");
    }

    let unit_path = config.unit_path();
    if unit_path.exists() {
        println!("✓ Service unit: {}", unit_path.display());

        // The start command must point inside the venv, never at a
        // system-wide interpreter.
        let isolated = fs::read_to_string(&unit_path)
            .ok()
            .and_then(|content| {
                content.lines().find_map(|l| {
                    l.strip_prefix("ExecStart=")
                        .and_then(|rest| rest.split_whitespace().next())
                        .map(|bin| config.is_venv_path(std::path::Path::new(bin)))
                })
            })
            .unwrap_or(false);
        if isolated {
            println!("✓ ExecStart uses the venv interpreter");
        } else {
            println!("✗ ExecStart does NOT use the venv interpreter");
            all_ok = false;
        }
    } else {
        println!("✗ Service unit: NOT INSTALLED");
        println!("  Run: sudo billboard-deploy --install");
        all_ok = false;
    }

    if has_systemd() {
        match systemctl_query(runner, "is-enabled", &config.service.name).await {
            Some(state) if state == "enabled" => println!("✓ Service enabled"),
            Some(state) => {
                println!("⚠ Service not enabled (is-enabled: {})", state);
                all_ok = false;
            }
            None => {
                println!("⚠ Service enablement unknown");
                all_ok = false;
            }
        }

        match systemctl_query(runner, "is-active", &config.service.name).await {
            Some(state) if state == "active" => println!("✓ Service active"),
            Some(state) => {
                println!("⚠ Service not active (is-active: {})", state);
                all_ok = false;
            }
            None => {
                println!("⚠ Service activity unknown");
                all_ok = false;
            }
        }
    } else {
        println!("- Systemd: Not available on this system");
    }

    println!();
    if all_ok {
        println!("\x1b[32m✓ All checks passed!\x1b[0m");
    } else {
        println!("\x1b[33m⚠ Some issues found - see above\x1b[0m");
    }

    Ok(())
}
