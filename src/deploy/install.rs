//! The provisioning procedure: one forward pass, fail fast, no rollback.
//! Every step is idempotent, so an aborted run is recovered by re-running.

use std::fs;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::types::DeployConfig;
use crate::deploy::service::render_unit;
use crate::deploy::DeployError;
use crate::system::runner::CommandRunner;

pub struct Installer {
    config: DeployConfig,
    runner: Arc<dyn CommandRunner>,
}

impl Installer {
    pub fn new(config: DeployConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    /// Run the full provisioning sequence.
    pub async fn run(&self) -> Result<(), DeployError> {
        self.preflight()?;
        self.ensure_install_dirs()?;
        self.copy_payload()?;
        self.create_venv().await?;
        self.install_requirements().await?;
        self.install_unit()?;
        self.activate().await?;
        Ok(())
    }

    /// Validate the external collaborators before touching the system.
    fn preflight(&self) -> Result<(), DeployError> {
        let source = &self.config.paths.source_script;
        if !source.exists() {
            return Err(DeployError::Preflight(format!(
                "daemon source not found: {}",
                source.display()
            )));
        }

        let manifest = &self.config.paths.requirements;
        if !manifest.exists() {
            return Err(DeployError::Preflight(format!(
                "requirements manifest not found: {}",
                manifest.display()
            )));
        }

        let content = fs::read_to_string(manifest)?;
        let candidates = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .count();
        if candidates == 0 {
            return Err(DeployError::Preflight(format!(
                "requirements manifest lists no packages: {}",
                manifest.display()
            )));
        }

        debug!("Preflight OK: {} dependency entries", candidates);
        Ok(())
    }

    fn ensure_install_dirs(&self) -> Result<(), DeployError> {
        fs::create_dir_all(&self.config.paths.install_dir)?;
        fs::create_dir_all(&self.config.paths.log_dir)?;
        println!("✓ Application directory: {}", self.config.paths.install_dir.display());
        Ok(())
    }

    fn copy_payload(&self) -> Result<(), DeployError> {
        let target = self.config.installed_script();
        fs::copy(&self.config.paths.source_script, &target)?;
        println!("✓ Daemon source installed: {}", target.display());

        // Extra payload (config.yaml) rides along when it exists next to the
        // source; the daemon reads it from its working directory.
        let source_dir = self.config.paths.source_script.parent();
        for extra in &self.config.paths.extra_files {
            let from = match source_dir {
                Some(dir) if extra.is_relative() => dir.join(extra),
                _ => extra.clone(),
            };
            if from.exists() {
                let file_name = from
                    .file_name()
                    .ok_or_else(|| DeployError::Preflight(format!(
                        "extra payload has no file name: {}",
                        from.display()
                    )))?;
                let to = self.config.paths.install_dir.join(file_name);
                fs::copy(&from, &to)?;
                println!("✓ Payload file installed: {}", to.display());
            } else {
                debug!("Extra payload not present, skipping: {:?}", from);
            }
        }
        Ok(())
    }

    async fn create_venv(&self) -> Result<(), DeployError> {
        if self.config.venv_python().exists() {
            println!("✓ Virtual environment already present");
            return Ok(());
        }

        let venv = self.config.venv_path();
        let venv_arg = venv.to_string_lossy();
        self.runner
            .run_checked(&self.config.python.interpreter, &["-m", "venv", venv_arg.as_ref()])
            .await
            .map_err(|e| DeployError::PackageInstall(format!("venv creation: {}", e)))?;
        println!("✓ Virtual environment created: {}", venv.display());
        Ok(())
    }

    async fn install_requirements(&self) -> Result<(), DeployError> {
        let pip = self.config.venv_pip();
        let pip_bin = pip.to_string_lossy();

        if self.config.python.upgrade_pip {
            self.runner
                .run_checked(pip_bin.as_ref(), &["install", "--upgrade", "pip"])
                .await
                .map_err(|e| DeployError::PackageInstall(format!("pip upgrade: {}", e)))?;
            println!("✓ pip upgraded");
        }

        let manifest = self.config.paths.requirements.to_string_lossy();
        self.runner
            .run_checked(pip_bin.as_ref(), &["install", "-r", manifest.as_ref()])
            .await
            .map_err(|e| DeployError::PackageInstall(e.to_string()))?;
        println!("✓ Dependencies installed from {}", manifest);
        Ok(())
    }

    fn install_unit(&self) -> Result<(), DeployError> {
        let unit_content = render_unit(&self.config);
        let unit_path = self.config.unit_path();

        if unit_path.exists() {
            if let Ok(existing) = fs::read_to_string(&unit_path) {
                if existing == unit_content {
                    println!("✓ Service unit already up-to-date");
                    return Ok(());
                }
            }
            info!("Existing service unit found, updating");
        }

        fs::write(&unit_path, &unit_content)?;
        println!("✓ Service unit written: {}", unit_path.display());
        Ok(())
    }

    async fn activate(&self) -> Result<(), DeployError> {
        let name = &self.config.service.name;
        let unit = format!("{}.service", name);

        self.runner
            .run_checked("systemctl", &["daemon-reload"])
            .await
            .map_err(|e| DeployError::InitSystem(e.to_string()))?;
        println!("✓ Systemd daemon reloaded");

        self.runner
            .run_checked("systemctl", &["enable", &unit])
            .await
            .map_err(|e| DeployError::InitSystem(e.to_string()))?;
        println!("✓ Service enabled (will start on boot)");

        self.runner
            .run_checked("systemctl", &["start", name])
            .await
            .map_err(|e| DeployError::InitSystem(e.to_string()))?;
        println!("✓ Service started");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    use crate::system::runner::testing::{FailingRunner, RecordingRunner};

    /// Config rooted in a scratch tree, with the daemon source and a valid
    /// requirements manifest already in place.
    fn scratch_config(tmp: &TempDir) -> DeployConfig {
        let src_dir = tmp.path().join("src");
        fs::create_dir_all(&src_dir).unwrap();
        fs::write(src_dir.join("billboard.py"), "print('billboard')\n").unwrap();
        fs::write(src_dir.join("requirements.txt"), "Pillow\nrequests\nPyYAML\n").unwrap();
        fs::write(src_dir.join("config.yaml"), "sources: []\ntargets: []\n").unwrap();

        let unit_dir = tmp.path().join("units");
        fs::create_dir_all(&unit_dir).unwrap();

        let mut config = DeployConfig::default();
        config.paths.install_dir = tmp.path().join("opt/billboard");
        config.paths.source_script = src_dir.join("billboard.py");
        config.paths.requirements = src_dir.join("requirements.txt");
        config.paths.log_dir = tmp.path().join("log");
        config.paths.unit_dir = unit_dir;
        config
    }

    #[tokio::test]
    async fn full_run_provisions_in_order() {
        let tmp = TempDir::new().unwrap();
        let config = scratch_config(&tmp);
        let runner = Arc::new(RecordingRunner::default());

        let installer = Installer::new(config.clone(), runner.clone());
        installer.run().await.unwrap();

        // Payload landed in the install dir.
        assert!(config.installed_script().exists());
        assert!(config.paths.install_dir.join("config.yaml").exists());
        assert!(config.paths.log_dir.exists());

        // Unit written, starting from the venv interpreter.
        let unit = fs::read_to_string(config.unit_path()).unwrap();
        let exec_line = unit
            .lines()
            .find(|l| l.starts_with("ExecStart="))
            .expect("unit has an ExecStart line");
        let interpreter = exec_line
            .trim_start_matches("ExecStart=")
            .split_whitespace()
            .next()
            .unwrap();
        assert!(config.is_venv_path(&PathBuf::from(interpreter)));

        // Commands ran in the provisioning order.
        let venv_arg = config.venv_path().to_string_lossy().to_string();
        let pip_bin = config.venv_pip().to_string_lossy().to_string();
        let manifest = config.paths.requirements.to_string_lossy().to_string();
        assert_eq!(
            runner.call_log(),
            vec![
                format!("python3 -m venv {}", venv_arg),
                format!("{} install --upgrade pip", pip_bin),
                format!("{} install -r {}", pip_bin, manifest),
                "systemctl daemon-reload".to_string(),
                "systemctl enable billboard.service".to_string(),
                "systemctl start billboard".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn missing_manifest_aborts_before_any_mutation() {
        let tmp = TempDir::new().unwrap();
        let mut config = scratch_config(&tmp);
        fs::remove_file(&config.paths.requirements).unwrap();
        config.paths.requirements = tmp.path().join("src/requirements.txt");

        let runner = Arc::new(RecordingRunner::default());
        let err = Installer::new(config.clone(), runner.clone())
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Preflight(_)));
        assert!(!config.unit_path().exists());
        assert!(!config.paths.install_dir.exists());
        assert!(runner.call_log().is_empty());
    }

    #[tokio::test]
    async fn comment_only_manifest_is_invalid() {
        let tmp = TempDir::new().unwrap();
        let config = scratch_config(&tmp);
        fs::write(&config.paths.requirements, "# pinned later\n\n").unwrap();

        let runner = Arc::new(RecordingRunner::default());
        let err = Installer::new(config, runner)
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::Preflight(_)));
    }

    #[tokio::test]
    async fn pip_failure_aborts_before_the_unit_is_written() {
        let tmp = TempDir::new().unwrap();
        let config = scratch_config(&tmp);
        let runner = Arc::new(FailingRunner::new("install -r"));

        let err = Installer::new(config.clone(), runner)
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::PackageInstall(_)));
        assert!(!config.unit_path().exists());
    }

    #[tokio::test]
    async fn rerun_reaches_the_same_end_state() {
        let tmp = TempDir::new().unwrap();
        let config = scratch_config(&tmp);

        let first = Arc::new(RecordingRunner::default());
        Installer::new(config.clone(), first).run().await.unwrap();
        let unit_after_first = fs::read_to_string(config.unit_path()).unwrap();

        let second = Arc::new(RecordingRunner::default());
        Installer::new(config.clone(), second.clone())
            .run()
            .await
            .unwrap();

        assert_eq!(fs::read_to_string(config.unit_path()).unwrap(), unit_after_first);
        assert!(config.installed_script().exists());
        // Second pass still reloads and restarts the service.
        assert!(second
            .call_log()
            .iter()
            .any(|c| c == "systemctl daemon-reload"));
    }

    #[tokio::test]
    async fn existing_venv_is_reused() {
        let tmp = TempDir::new().unwrap();
        let config = scratch_config(&tmp);

        let venv_bin = config.venv_path().join("bin");
        fs::create_dir_all(&venv_bin).unwrap();
        fs::write(venv_bin.join("python"), "").unwrap();

        let runner = Arc::new(RecordingRunner::default());
        Installer::new(config, runner.clone()).run().await.unwrap();

        assert!(!runner.call_log().iter().any(|c| c.contains("-m venv")));
    }

    #[tokio::test]
    async fn source_copy_overwrites_previous_install() {
        let tmp = TempDir::new().unwrap();
        let config = scratch_config(&tmp);

        let runner = Arc::new(RecordingRunner::default());
        Installer::new(config.clone(), runner.clone())
            .run()
            .await
            .unwrap();

        fs::write(&config.paths.source_script, "print('v2')\n").unwrap();
        Installer::new(config.clone(), runner).run().await.unwrap();

        let installed = fs::read_to_string(config.installed_script()).unwrap();
        assert_eq!(installed, "print('v2')\n");
    }
}
