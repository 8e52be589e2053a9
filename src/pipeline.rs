//! The once-per-boot reporting run.
//!
//! ```text
//! NotStarted -> AlreadyDone
//! NotStarted -> Collecting -> Sending -> Done
//!               Collecting | Sending  -> Failed
//! ```
//!
//! A failed run leaves no marker behind, so the next invocation starts over.

use crate::dmesg::{collect_to_buffer, DmesgSource, LogSource};
use crate::error::Result;
use crate::guard::BootGuard;
use crate::sender::{MetricSink, ZabbixSender};
use crate::RunConfig;
use std::fmt;
use tracing::{debug, info};

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    AlreadyDone,
    Collecting,
    Sending,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not started",
            Self::AlreadyDone => "already done",
            Self::Collecting => "collecting",
            Self::Sending => "sending",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// How a successful run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The marker was already present; nothing was collected or sent.
    AlreadyDone,
    /// Records were sent and the marker was written.
    Sent {
        /// Number of kernel messages in the buffer
        records: usize,
        /// Exit status of the sender
        status: i32,
    },
}

/// Drives one reporting run over a log source and a metric sink.
pub struct Reporter<S, M> {
    config: RunConfig,
    guard: BootGuard,
    source: S,
    sink: M,
    state: RunState,
}

impl Reporter<DmesgSource, ZabbixSender> {
    /// Reporter using the external `dmesg` and `zabbix_sender` programs.
    pub fn from_config(config: RunConfig) -> Self {
        let source = DmesgSource::new(config.dmesg_exec.clone());
        let sink = ZabbixSender::from_config(&config);
        Self::new(config, source, sink)
    }
}

impl<S: LogSource, M: MetricSink> Reporter<S, M> {
    /// Create a reporter from its parts.
    pub fn new(config: RunConfig, source: S, sink: M) -> Self {
        let guard = BootGuard::from_config(&config);
        Self {
            config,
            guard,
            source,
            sink,
            state: RunState::NotStarted,
        }
    }

    /// Current state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// The boot guard in use.
    pub fn guard(&self) -> &BootGuard {
        &self.guard
    }

    fn transition(&mut self, next: RunState) {
        debug!("Run state: {} -> {}", self.state, next);
        self.state = next;
    }

    /// Run the whole pipeline once.
    pub async fn run(&mut self) -> Result<Outcome> {
        if self.guard.has_run() {
            info!(
                "Marker {} present, skipping",
                self.guard.marker_path().display()
            );
            self.transition(RunState::AlreadyDone);
            return Ok(Outcome::AlreadyDone);
        }

        match self.collect_and_send().await {
            Ok(outcome) => {
                self.transition(RunState::Done);
                Ok(outcome)
            }
            Err(e) => {
                debug!("Run failed: {}", e);
                self.transition(RunState::Failed);
                Err(e)
            }
        }
    }

    async fn collect_and_send(&mut self) -> Result<Outcome> {
        self.config.validate()?;
        self.sink.prepare().await?;

        self.transition(RunState::Collecting);
        let buffer = self.config.buffer_path();
        let records = collect_to_buffer(&mut self.source, &self.config.host, &buffer).await?;

        self.transition(RunState::Sending);
        let report = self.sink.send(&buffer).await?;

        self.guard.mark_done()?;
        Ok(Outcome::Sent {
            records,
            status: report.status,
        })
    }
}
