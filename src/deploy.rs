//! Provisioning constants, the systemd unit template, and the error taxonomy.

pub mod install;
pub mod service;
pub mod status;

use thiserror::Error;

pub const SERVICE_NAME: &str = "billboard";
pub const INSTALL_DIR: &str = "/opt/billboard";
pub const LOG_DIR: &str = "/var/log/billboard";
pub const SYSTEMD_UNIT_DIR: &str = "/etc/systemd/system";

pub const SYSTEMD_SERVICE_TEMPLATE: &str = r#"[Unit]
Description={{DESCRIPTION}}
After=network-online.target
Wants=network-online.target

[Service]
Type=simple
ExecStart={{PYTHON_BIN}} {{SCRIPT_PATH}}
WorkingDirectory={{WORK_DIR}}
Restart=on-failure
RestartSec=5
User={{RUN_USER}}
Group={{RUN_GROUP}}
Environment=PYTHONUNBUFFERED=1
StandardOutput=append:{{STDOUT_LOG}}
StandardError=append:{{STDERR_LOG}}

[Install]
WantedBy=multi-user.target
"#;

/// Errors raised by the provisioning procedure. Every step is fatal: the
/// first error aborts the remaining steps, and a re-run starts from the top.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("preflight check failed: {0}")]
    Preflight(String),

    #[error("filesystem operation failed: {0}")]
    Filesystem(#[from] std::io::Error),

    #[error("package installation failed: {0}")]
    PackageInstall(String),

    #[error("init system operation failed: {0}")]
    InitSystem(String),
}
