//! External `dmesg` reader and buffer file writer.

use crate::dmesg::{record::LogRecord, traits::LogSource};
use crate::error::{ReporterError, Result};
use futures_util::stream::{self, BoxStream};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter, Split};
use tokio::process::{Child, ChildStdout, Command};
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

/// Arguments selecting decoded levels, readable timestamps and the
/// emerg/alert/crit/err severities only.
pub const DMESG_ARGS: [&str; 4] = ["-x", "-T", "--level", "emerg,alert,crit,err"];

/// Kernel log source backed by an external `dmesg` executable.
#[derive(Debug, Clone)]
pub struct DmesgSource {
    executable: PathBuf,
}

impl DmesgSource {
    /// Create a source running the given executable.
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }
}

struct ReaderState {
    segments: Split<BufReader<ChildStdout>>,
    child: Option<Child>,
    program: String,
    finished: bool,
}

impl LogSource for DmesgSource {
    async fn lines(&mut self) -> Result<BoxStream<'static, Result<String>>> {
        let program = self.executable.display().to_string();
        debug!("Executing {} {}", program, DMESG_ARGS.join(" "));

        let mut child = Command::new(&self.executable)
            .args(DMESG_ARGS)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ReporterError::collection_error(format!("failed to run {}: {}", program, e))
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            ReporterError::collection_error(format!("no output stream from {}", program))
        })?;

        let state = ReaderState {
            segments: BufReader::new(stdout).split(b'\n'),
            child: Some(child),
            program,
            finished: false,
        };

        let stream = stream::unfold(state, |mut state| async move {
            if state.finished {
                return None;
            }
            match state.segments.next_segment().await {
                Ok(Some(bytes)) => {
                    let line = String::from_utf8_lossy(&bytes).into_owned();
                    Some((Ok(line), state))
                }
                Ok(None) => {
                    if let Some(mut child) = state.child.take() {
                        reap(&mut child, &state.program).await;
                    }
                    None
                }
                Err(e) => {
                    state.finished = true;
                    let err = ReporterError::collection_error(format!(
                        "failed reading output of {}: {}",
                        state.program, e
                    ));
                    Some((Err(err), state))
                }
            }
        });

        Ok(Box::pin(stream))
    }
}

/// Wait for the reader to exit. A non-zero exit is not fatal: whatever it
/// printed is still reported. Readers dropped before the end are killed.
async fn reap(child: &mut Child, program: &str) {
    match child.wait().await {
        Ok(status) if status.success() => debug!("{} exited successfully", program),
        Ok(status) => warn!("{} exited with {}", program, status),
        Err(e) => warn!("Failed to wait for {}: {}", program, e),
    }
}

/// Drain `source` into records without touching any file.
pub async fn collect_records<S: LogSource>(source: &mut S, host: &str) -> Result<Vec<LogRecord>> {
    let mut lines = source.lines().await?;
    let mut records = Vec::new();
    while let Some(line) = lines.next().await {
        records.push(LogRecord::from_line(host, &line?));
    }
    Ok(records)
}

/// Drain `source` into the buffer file at `path`, one formatted record per
/// line, and return how many records were written.
///
/// The buffer is truncated before the source is started, so it never holds
/// lines from an earlier run.
pub async fn collect_to_buffer<S: LogSource>(
    source: &mut S,
    host: &str,
    path: &Path,
) -> Result<usize> {
    let file = File::create(path).await?;
    let mut writer = BufWriter::new(file);

    let mut lines = source.lines().await?;
    let mut written = 0usize;
    while let Some(line) = lines.next().await {
        let record = LogRecord::from_line(host, &line?);
        writer.write_all(format!("{}\n", record).as_bytes()).await?;
        written += 1;
    }

    writer.flush().await?;
    info!("Collected {} kernel messages into {}", written, path.display());

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct VecSource(Vec<String>);

    impl LogSource for VecSource {
        async fn lines(&mut self) -> Result<BoxStream<'static, Result<String>>> {
            let lines: Vec<Result<String>> = self.0.drain(..).map(Ok).collect();
            Ok(Box::pin(stream::iter(lines)))
        }
    }

    #[tokio::test]
    async fn test_collect_formats_each_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("buffer.tmp");
        let mut source = VecSource(vec![
            "[ 1.234567] foo err".to_string(),
            "[2.345678] bar err   ".to_string(),
        ]);

        let written = collect_to_buffer(&mut source, "host1", &path).await.unwrap();

        assert_eq!(written, 2);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "host1 sys.kernel.dmesg \"[ 1.234567] foo err\"\n\
             host1 sys.kernel.dmesg \"[2.345678] bar err\"\n"
        );
    }

    #[tokio::test]
    async fn test_collect_empty_source_truncates_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("buffer.tmp");
        std::fs::write(&path, "stale line from an earlier run\n").unwrap();

        let written = collect_to_buffer(&mut VecSource(Vec::new()), "host1", &path)
            .await
            .unwrap();

        assert_eq!(written, 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[tokio::test]
    async fn test_missing_executable_is_collection_error() {
        let mut source = DmesgSource::new("/nonexistent/path/to/dmesg");
        let err = source.lines().await.err().unwrap();
        assert!(matches!(err, ReporterError::Collection(_)));
    }

    #[tokio::test]
    async fn test_collect_records_leaves_files_alone() {
        let mut source = VecSource(vec!["[ 1.234567] foo err \n".to_string()]);
        let records = collect_records(&mut source, "host1").await.unwrap();
        assert_eq!(records, vec![LogRecord::from_line("host1", "[ 1.234567] foo err")]);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_dropped_reader_is_killed() {
        use std::os::unix::fs::PermissionsExt;
        use std::time::Duration;

        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("dmesg.pid");
        let script = dir.path().join("dmesg");
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\necho $$ > '{}'\necho first\nexec sleep 30\n",
                pid_file.display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut source = DmesgSource::new(&script);
        let mut lines = source.lines().await.unwrap();
        assert_eq!(lines.next().await.unwrap().unwrap(), "first");
        drop(lines);

        let pid = std::fs::read_to_string(&pid_file).unwrap().trim().to_string();
        let stat = PathBuf::from("/proc").join(&pid).join("stat");
        let mut gone = false;
        for _ in 0..100 {
            // A killed but unreaped reader shows up as a zombie.
            gone = match std::fs::read_to_string(&stat) {
                Ok(contents) => contents
                    .rsplit(')')
                    .next()
                    .map(|rest| rest.trim_start().starts_with('Z'))
                    .unwrap_or(false),
                Err(_) => true,
            };
            if gone {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(gone, "reader {} still running after its stream was dropped", pid);
    }
}
