//! Deploy configuration structs and defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::deploy::{INSTALL_DIR, LOG_DIR, SERVICE_NAME, SYSTEMD_UNIT_DIR};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    pub service: ServiceSettings,
    pub paths: PathSettings,
    pub python: PythonSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSettings {
    pub name: String,
    pub description: String,
    pub run_user: String,
    pub run_group: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    pub install_dir: PathBuf,
    pub source_script: PathBuf,
    pub requirements: PathBuf,
    /// Additional payload copied next to the script when present (config.yaml).
    pub extra_files: Vec<PathBuf>,
    pub log_dir: PathBuf,
    pub unit_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PythonSettings {
    /// System interpreter used to bootstrap the virtual environment.
    pub interpreter: String,
    /// Virtual environment directory name inside the install dir.
    pub venv_dir: String,
    pub upgrade_pip: bool,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            service: ServiceSettings {
                name: SERVICE_NAME.to_string(),
                description: "Billboard LED Panel Daemon".to_string(),
                run_user: "pi".to_string(),
                run_group: "pi".to_string(),
            },
            paths: PathSettings {
                install_dir: PathBuf::from(INSTALL_DIR),
                source_script: PathBuf::from("billboard.py"),
                requirements: PathBuf::from("requirements.txt"),
                extra_files: vec![PathBuf::from("config.yaml")],
                log_dir: PathBuf::from(LOG_DIR),
                unit_dir: PathBuf::from(SYSTEMD_UNIT_DIR),
            },
            python: PythonSettings {
                interpreter: "python3".to_string(),
                venv_dir: "venv".to_string(),
                upgrade_pip: true,
            },
        }
    }
}

impl DeployConfig {
    /// Virtual environment root inside the install dir.
    pub fn venv_path(&self) -> PathBuf {
        self.paths.install_dir.join(&self.python.venv_dir)
    }

    /// Interpreter inside the virtual environment. The installed unit must
    /// start the daemon with this path, never a system-wide python.
    pub fn venv_python(&self) -> PathBuf {
        self.venv_path().join("bin").join("python")
    }

    pub fn venv_pip(&self) -> PathBuf {
        self.venv_path().join("bin").join("pip")
    }

    /// Where the daemon source lands after installation.
    pub fn installed_script(&self) -> PathBuf {
        self.paths.install_dir.join(self.script_file_name())
    }

    pub fn script_file_name(&self) -> &str {
        self.paths
            .source_script
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("billboard.py")
    }

    pub fn unit_path(&self) -> PathBuf {
        self.paths
            .unit_dir
            .join(format!("{}.service", self.service.name))
    }

    pub fn stdout_log(&self) -> PathBuf {
        self.paths.log_dir.join(format!("{}.log", self.service.name))
    }

    pub fn stderr_log(&self) -> PathBuf {
        self.paths
            .log_dir
            .join(format!("{}.err.log", self.service.name))
    }

    /// True when `path` lies inside the virtual environment.
    pub fn is_venv_path(&self, path: &Path) -> bool {
        path.starts_with(self.venv_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_resolve_inside_install_dir() {
        let config = DeployConfig::default();
        assert_eq!(config.venv_python(), PathBuf::from("/opt/billboard/venv/bin/python"));
        assert_eq!(config.installed_script(), PathBuf::from("/opt/billboard/billboard.py"));
        assert_eq!(config.unit_path(), PathBuf::from("/etc/systemd/system/billboard.service"));
        assert!(config.is_venv_path(&config.venv_python()));
        assert!(!config.is_venv_path(Path::new("/usr/bin/python3")));
    }

    #[test]
    fn default_identity_is_the_pi_account() {
        let config = DeployConfig::default();
        assert_eq!(config.service.run_user, "pi");
        assert_eq!(config.service.run_group, "pi");
    }

    #[test]
    fn script_file_name_drops_source_directories() {
        let mut config = DeployConfig::default();
        config.paths.source_script = PathBuf::from("/home/pi/src/billboard.py");
        assert_eq!(config.script_file_name(), "billboard.py");
        assert_eq!(config.installed_script(), PathBuf::from("/opt/billboard/billboard.py"));
    }
}
