//! Locating the sending executable.

use crate::error::{ReporterError, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Exit code used when neither `which` nor the static default is available.
const NOT_FOUND_CODE: i32 = 127;

enum Lookup {
    Found(PathBuf),
    Missing(i32),
}

/// Find the sending executable.
///
/// An explicit override is used untouched. Otherwise `which` is asked for
/// `zabbix_sender`; when `which` says no, the run ends with `which`'s own
/// exit code.
pub async fn locate_sender(exec_override: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = exec_override {
        debug!("Using sender override {}", path.display());
        return Ok(path.to_path_buf());
    }
    locate_program(crate::SENDER_PROGRAM, Path::new(crate::DEFAULT_SENDER_EXEC)).await
}

/// Look `program` up with `which`, falling back to `fallback` only when
/// `which` itself cannot be run.
pub(crate) async fn locate_program(program: &str, fallback: &Path) -> Result<PathBuf> {
    match which(program).await {
        Ok(Lookup::Found(path)) => {
            info!("Found {} at {}", program, path.display());
            Ok(path)
        }
        Ok(Lookup::Missing(code)) => {
            debug!("which {} exited with {}", program, code);
            Err(ReporterError::SenderNotFound { code })
        }
        Err(e) if e.kind() == ErrorKind::NotFound && fallback.exists() => {
            info!(
                "which is unavailable, using default {}",
                fallback.display()
            );
            Ok(fallback.to_path_buf())
        }
        Err(e) => {
            debug!("Failed to run which {}: {}", program, e);
            Err(ReporterError::SenderNotFound {
                code: NOT_FOUND_CODE,
            })
        }
    }
}

async fn which(program: &str) -> std::io::Result<Lookup> {
    let output = Command::new("which")
        .arg(program)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await?;

    if !output.status.success() {
        return Ok(Lookup::Missing(output.status.code().unwrap_or(1)));
    }

    let path = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
    if path.is_empty() {
        Ok(Lookup::Missing(1))
    } else {
        Ok(Lookup::Found(PathBuf::from(path)))
    }
}
