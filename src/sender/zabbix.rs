//! `zabbix_sender` invocation.

use crate::config::{RunConfig, SenderMode};
use crate::error::{ReporterError, Result};
use crate::sender::{
    locate::locate_sender,
    traits::{MetricSink, SendReport},
};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Metric sink that hands the buffer file to `zabbix_sender -i`.
#[derive(Debug, Clone)]
pub struct ZabbixSender {
    exec_override: Option<PathBuf>,
    executable: Option<PathBuf>,
    host: String,
    mode: SenderMode,
}

impl ZabbixSender {
    /// Create a sender. Without an override the executable is looked up in
    /// [`MetricSink::prepare`].
    pub fn new(exec_override: Option<PathBuf>, host: impl Into<String>, mode: SenderMode) -> Self {
        Self {
            exec_override,
            executable: None,
            host: host.into(),
            mode,
        }
    }

    /// Create a sender from a run configuration.
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(
            config.sender_exec.clone(),
            config.host.clone(),
            config.sender_mode.clone(),
        )
    }

    /// The resolved executable, once [`MetricSink::prepare`] has run.
    pub fn executable(&self) -> Option<&Path> {
        self.executable.as_deref()
    }

    /// Arguments (without the program) for sending `buffer`.
    pub fn command_args(&self, buffer: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::with_capacity(8);
        match &self.mode {
            SenderMode::AgentConfig { path } => {
                args.push("-c".into());
                args.push(path.into());
            }
            SenderMode::Explicit { server, port } => {
                args.push("-z".into());
                args.push(server.into());
                args.push("-p".into());
                args.push(port.to_string().into());
            }
        }
        args.push("-s".into());
        args.push(self.host.as_str().into());
        args.push("-i".into());
        args.push(buffer.into());
        args
    }
}

impl MetricSink for ZabbixSender {
    async fn prepare(&mut self) -> Result<()> {
        if self.executable.is_none() {
            let path = locate_sender(self.exec_override.as_deref()).await?;
            self.executable = Some(path);
        }
        Ok(())
    }

    async fn send(&self, buffer: &Path) -> Result<SendReport> {
        let executable = self.executable.as_deref().ok_or_else(|| {
            ReporterError::config_error("sender executable has not been located")
        })?;
        let args = self.command_args(buffer);
        debug!("Executing {} {:?}", executable.display(), args);

        let status = Command::new(executable)
            .args(&args)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| {
                debug!("Failed to launch {}: {}", executable.display(), e);
                ReporterError::Io(e)
            })?;

        if !status.success() {
            debug!("{} exited with {}", executable.display(), status);
            return Err(ReporterError::Transmission {
                code: status.code(),
            });
        }

        info!("Sent {} to {}", buffer.display(), self.host);
        Ok(SendReport { status: 0 })
    }
}
