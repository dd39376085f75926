//! Systemd unit rendering and lifecycle.

use std::path::Path;

use anyhow::Result;

use crate::config::types::DeployConfig;
use crate::deploy::SYSTEMD_SERVICE_TEMPLATE;
use crate::system::runner::CommandRunner;

/// Check if systemd is available on this system
pub fn has_systemd() -> bool {
    Path::new("/run/systemd/system").exists()
}

/// Render the service unit from the template. ExecStart always points at the
/// interpreter inside the virtual environment so the daemon never picks up
/// system-wide packages.
pub fn render_unit(config: &DeployConfig) -> String {
    SYSTEMD_SERVICE_TEMPLATE
        .replace("{{DESCRIPTION}}", &config.service.description)
        .replace("{{PYTHON_BIN}}", &config.venv_python().to_string_lossy())
        .replace("{{SCRIPT_PATH}}", &config.installed_script().to_string_lossy())
        .replace("{{WORK_DIR}}", &config.paths.install_dir.to_string_lossy())
        .replace("{{RUN_USER}}", &config.service.run_user)
        .replace("{{RUN_GROUP}}", &config.service.run_group)
        .replace("{{STDOUT_LOG}}", &config.stdout_log().to_string_lossy())
        .replace("{{STDERR_LOG}}", &config.stderr_log().to_string_lossy())
}

/// Uninstall the service: stop, disable, remove the unit, reload systemd.
/// Stop/disable failures are tolerated so a half-installed service can still
/// be cleaned up.
pub async fn uninstall(config: &DeployConfig, runner: &dyn CommandRunner) -> Result<()> {
    let unit_path = config.unit_path();
    if !unit_path.exists() {
        println!("✓ Service is not installed");
        return Ok(());
    }

    let name = config.service.name.as_str();

    let _ = runner.run("systemctl", &["stop", name]).await;
    println!("✓ Service stopped");

    let _ = runner.run("systemctl", &["disable", name]).await;
    println!("✓ Service disabled");

    std::fs::remove_file(&unit_path)?;
    println!("✓ Service file removed: {}", unit_path.display());

    let _ = runner.run("systemctl", &["daemon-reload"]).await;
    println!("✓ Systemd daemon reloaded");

    Ok(())
}
