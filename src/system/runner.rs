//! Subprocess execution seam.
//!
//! All package-manager and systemctl invocations go through [`CommandRunner`]
//! so the provisioning sequence can be exercised in tests without root
//! privileges or a live init system.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tracing::trace;

#[derive(Debug, Clone, Default)]
pub struct CmdOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion and capture its output.
    async fn run(&self, program: &str, args: &[&str]) -> Result<CmdOutput>;

    /// Run a command and treat a non-zero exit as an error.
    async fn run_checked(&self, program: &str, args: &[&str]) -> Result<CmdOutput> {
        let output = self.run(program, args).await?;
        if !output.success {
            let detail = if output.stderr.trim().is_empty() {
                output.stdout.trim().to_string()
            } else {
                output.stderr.trim().to_string()
            };
            return Err(anyhow!("{} {} failed: {}", program, args.join(" "), detail));
        }
        Ok(output)
    }
}

/// Real runner over tokio::process.
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CmdOutput> {
        trace!("Executing: {} {}", program, args.join(" "));

        let output = tokio::process::Command::new(program)
            .args(args)
            .output()
            .await
            .with_context(|| format!("Failed to execute {}", program))?;

        Ok(CmdOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
        })
    }
}

#[cfg(test)]
pub mod testing {
    //! Runner doubles shared by the deploy tests.

    use std::sync::Mutex;

    use super::*;

    /// Records every invocation and reports success.
    #[derive(Default)]
    pub struct RecordingRunner {
        pub calls: Mutex<Vec<String>>,
    }

    impl RecordingRunner {
        pub fn call_log(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn run(&self, program: &str, args: &[&str]) -> Result<CmdOutput> {
            let line = format!("{} {}", program, args.join(" "));
            self.calls.lock().unwrap().push(line);
            Ok(CmdOutput {
                stdout: String::new(),
                stderr: String::new(),
                success: true,
            })
        }
    }

    /// Fails every invocation whose command line contains the given needle,
    /// records the rest as successes.
    pub struct FailingRunner {
        pub fail_on: &'static str,
        pub calls: Mutex<Vec<String>>,
    }

    impl FailingRunner {
        pub fn new(fail_on: &'static str) -> Self {
            Self {
                fail_on,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CommandRunner for FailingRunner {
        async fn run(&self, program: &str, args: &[&str]) -> Result<CmdOutput> {
            let line = format!("{} {}", program, args.join(" "));
            self.calls.lock().unwrap().push(line.clone());
            if line.contains(self.fail_on) {
                return Ok(CmdOutput {
                    stdout: String::new(),
                    stderr: format!("simulated failure: {}", line),
                    success: false,
                });
            }
            Ok(CmdOutput {
                stdout: String::new(),
                stderr: String::new(),
                success: true,
            })
        }
    }

    #[tokio::test]
    async fn run_checked_surfaces_stderr() {
        let runner = FailingRunner::new("pip install");
        let err = runner
            .run_checked("pip", &["install", "-r", "requirements.txt"])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("simulated failure"));
    }
}
