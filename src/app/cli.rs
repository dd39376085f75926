//! Command-line argument definitions (clap) and help text.

use std::path::PathBuf;

use clap::Parser;

use crate::config::types::DeployConfig;

pub const HELP_TEXT: &str = "
Billboard Deployment Tool
Usage: billboard-deploy [OPTIONS]

Options:
  -h, --help                    Print help
  -V, --version                 Print version
Provisioning:
  -I, --install                 Provision the billboard service and start it
  -U, --uninstall               Stop the service and remove its systemd unit
      --render                  Print the rendered systemd unit without installing
Status:
  -i, --status                  Show deployment status
      --check                   Run health check (payload, venv, unit, service state)
Config:
  -c, --config                  Show the effective configuration
      --config-file <PATH>      Load configuration from a specific file
Overrides:
      --install-dir <DIR>       Application directory (default: /opt/billboard)
      --source <FILE>           Daemon source script (default: billboard.py)
      --requirements <FILE>     Dependency manifest (default: requirements.txt)
      --user <USER>             Run-as user and group (default: pi)
      --log-level <LOG_LEVEL>   Set log level (TRACE, DEBUG, INFO, WARN, ERROR)
";

#[derive(Parser, Debug)]
#[command(name = "billboard-deploy")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Provisions the Billboard LED panel daemon as a systemd service", long_about = None)]
pub struct Args {
    // === Provisioning ===
    /// Provision the billboard service and start it
    #[arg(short = 'I', long, help_heading = "Provisioning")]
    pub install: bool,

    /// Stop the service and remove its systemd unit
    #[arg(short = 'U', long, help_heading = "Provisioning")]
    pub uninstall: bool,

    /// Print the rendered systemd unit without installing
    #[arg(long, help_heading = "Provisioning")]
    pub render: bool,

    // === Status ===
    /// Show deployment status
    #[arg(short = 'i', long = "status", help_heading = "Status")]
    pub status: bool,

    /// Run health check (payload, venv, unit, service state)
    #[arg(long, help_heading = "Status")]
    pub check: bool,

    // === Config ===
    /// Show the effective configuration
    #[arg(short = 'c', long, help_heading = "Config")]
    pub config: bool,

    /// Load configuration from a specific file
    #[arg(long = "config-file", help_heading = "Config")]
    pub config_file: Option<String>,

    // === Overrides ===
    /// Application directory
    #[arg(long = "install-dir", help_heading = "Overrides")]
    pub install_dir: Option<PathBuf>,

    /// Daemon source script
    #[arg(long, help_heading = "Overrides")]
    pub source: Option<PathBuf>,

    /// Dependency manifest
    #[arg(long, help_heading = "Overrides")]
    pub requirements: Option<PathBuf>,

    /// Run-as user and group
    #[arg(long, help_heading = "Overrides")]
    pub user: Option<String>,

    /// Set log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(long = "log-level", help_heading = "Overrides")]
    pub log_level: Option<String>,
}

impl Args {
    /// Fold command-line overrides into the loaded configuration.
    pub fn apply_overrides(&self, config: &mut DeployConfig) {
        if let Some(dir) = &self.install_dir {
            config.paths.install_dir = dir.clone();
        }
        if let Some(source) = &self.source {
            config.paths.source_script = source.clone();
        }
        if let Some(requirements) = &self.requirements {
            config.paths.requirements = requirements.clone();
        }
        if let Some(user) = &self.user {
            config.service.run_user = user.clone();
            config.service.run_group = user.clone();
        }
    }
}
