//! Run configuration.
//!
//! Everything a run needs is resolved once at start-up into a [`RunConfig`]
//! and handed to each component. Nothing in here changes after the pipeline
//! starts.

use crate::error::{ReporterError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use sysinfo::System;

/// How the sending command learns where the monitoring server is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SenderMode {
    /// Server and port come from an agent configuration file (`-c`).
    AgentConfig {
        /// Path to the agent configuration file
        path: PathBuf,
    },
    /// Server and port are passed on the command line (`-z`/`-p`).
    Explicit {
        /// Monitoring server address
        server: String,
        /// Monitoring server trapper port
        port: u16,
    },
}

impl Default for SenderMode {
    fn default() -> Self {
        Self::AgentConfig {
            path: PathBuf::from(crate::DEFAULT_AGENT_CONFIG),
        }
    }
}

impl SenderMode {
    /// Pick the sender mode from optional command-line values.
    ///
    /// An agent configuration file wins over an explicit server when both
    /// are given. With neither, the default agent configuration is used.
    pub fn resolve(agent_config: Option<PathBuf>, server: Option<String>, port: u16) -> Self {
        match (agent_config, server) {
            (Some(path), _) => Self::AgentConfig { path },
            (None, Some(server)) => Self::Explicit { server, port },
            (None, None) => Self::default(),
        }
    }
}

/// Immutable configuration for one reporting run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Host name the reported item belongs to
    pub host: String,
    /// Explicit sending executable; `None` means look it up on `PATH`
    pub sender_exec: Option<PathBuf>,
    /// Kernel log reader executable
    pub dmesg_exec: PathBuf,
    /// Where the sender gets its server address from
    pub sender_mode: SenderMode,
    /// Directory holding the once-per-boot marker file
    pub marker_dir: PathBuf,
    /// Directory holding the temporary buffer file
    pub buffer_dir: PathBuf,
    /// Base name for the marker and buffer files
    pub script_name: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            sender_exec: None,
            dmesg_exec: PathBuf::from(crate::DEFAULT_DMESG_EXEC),
            sender_mode: SenderMode::default(),
            marker_dir: PathBuf::from(crate::DEFAULT_MARKER_DIR),
            buffer_dir: PathBuf::from(crate::DEFAULT_BUFFER_DIR),
            script_name: default_script_name(),
        }
    }
}

impl RunConfig {
    /// Create a configuration for the given host with every other setting at its default.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    /// Set the host name reported with each item.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Use a fixed sending executable instead of looking it up.
    pub fn with_sender_exec(mut self, exec: Option<PathBuf>) -> Self {
        self.sender_exec = exec;
        self
    }

    /// Set the kernel log reader executable.
    pub fn with_dmesg_exec(mut self, exec: impl Into<PathBuf>) -> Self {
        self.dmesg_exec = exec.into();
        self
    }

    /// Set how the sender reaches the monitoring server.
    pub fn with_sender_mode(mut self, mode: SenderMode) -> Self {
        self.sender_mode = mode;
        self
    }

    /// Set the marker file directory.
    pub fn with_marker_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.marker_dir = dir.into();
        self
    }

    /// Set the buffer file directory.
    pub fn with_buffer_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.buffer_dir = dir.into();
        self
    }

    /// Set the base name used for the marker and buffer files.
    pub fn with_script_name(mut self, name: impl Into<String>) -> Self {
        self.script_name = name.into();
        self
    }

    /// Path of the once-per-boot marker file.
    pub fn marker_path(&self) -> PathBuf {
        self.marker_dir.join(format!("{}.ae", self.script_name))
    }

    /// Path of the temporary buffer file.
    pub fn buffer_path(&self) -> PathBuf {
        self.buffer_dir.join(format!("{}.tmp", self.script_name))
    }

    /// Check the configuration before any file or process is touched.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() || self.host.chars().any(char::is_whitespace) {
            return Err(ReporterError::config_error(format!(
                "invalid host name '{}'",
                self.host
            )));
        }
        if let SenderMode::Explicit { server, .. } = &self.sender_mode {
            if server.trim().is_empty() {
                return Err(ReporterError::config_error("server address must not be empty"));
            }
        }
        Ok(())
    }
}

/// Host name of the machine, `localhost` when it cannot be determined.
pub fn default_host() -> String {
    System::host_name()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

/// Base name of the running executable, falling back to the crate name.
pub fn default_script_name() -> String {
    std::env::current_exe()
        .ok()
        .as_deref()
        .and_then(script_name_from_path)
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}

/// File stem of `path`, if it has a usable one.
pub fn script_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_paths() {
        let config = RunConfig::new("host1")
            .with_script_name("check_dmesg")
            .with_marker_dir("/dev/shm")
            .with_buffer_dir("/tmp");

        assert_eq!(config.marker_path(), PathBuf::from("/dev/shm/check_dmesg.ae"));
        assert_eq!(config.buffer_path(), PathBuf::from("/tmp/check_dmesg.tmp"));
    }

    #[test]
    fn test_sender_mode_resolution() {
        let both = SenderMode::resolve(
            Some(PathBuf::from("/etc/agent.conf")),
            Some("zbx".to_string()),
            10051,
        );
        assert_eq!(
            both,
            SenderMode::AgentConfig {
                path: PathBuf::from("/etc/agent.conf")
            }
        );

        let explicit = SenderMode::resolve(None, Some("zbx".to_string()), 10052);
        assert_eq!(
            explicit,
            SenderMode::Explicit {
                server: "zbx".to_string(),
                port: 10052
            }
        );

        assert_eq!(SenderMode::resolve(None, None, 10051), SenderMode::default());
    }

    #[test]
    fn test_validate() {
        assert!(RunConfig::new("host1").validate().is_ok());
        assert!(RunConfig::new("").validate().is_err());
        assert!(RunConfig::new("two words").validate().is_err());

        let no_server = RunConfig::new("host1").with_sender_mode(SenderMode::Explicit {
            server: " ".to_string(),
            port: 10051,
        });
        assert!(no_server.validate().is_err());
    }

    #[test]
    fn test_script_name_from_path() {
        assert_eq!(
            script_name_from_path(Path::new("/usr/local/bin/check_dmesg")),
            Some("check_dmesg".to_string())
        );
        assert_eq!(
            script_name_from_path(Path::new("/opt/check_dmesg.py")),
            Some("check_dmesg".to_string())
        );
        assert_eq!(script_name_from_path(Path::new("/")), None);
    }
}
