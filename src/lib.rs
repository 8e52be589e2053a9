//! # check_dmesg - boot-time kernel error reporting
//!
//! Reads kernel messages of severity `err` or worse with `dmesg` and hands
//! them to `zabbix_sender`, at most once per boot.
//!
//! ## Flow
//!
//! - **Boot guard**: a marker file under `/dev/shm` records that this boot
//!   was already reported
//! - **Log collection**: `dmesg -x -T --level emerg,alert,crit,err` output is
//!   rewritten as `<host> sys.kernel.dmesg "<message>"` lines in a buffer file
//! - **Sending**: `zabbix_sender -i <buffer>` delivers the buffer, configured
//!   either by an agent config file or an explicit server and port
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use check_dmesg::{Outcome, Reporter, RunConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut reporter = Reporter::from_config(RunConfig::default());
//!     match reporter.run().await? {
//!         Outcome::AlreadyDone => println!("has already executed."),
//!         Outcome::Sent { status, .. } => println!("{}", status),
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dmesg;
pub mod error;
pub mod guard;
pub mod pipeline;
pub mod sender;

// Re-export public API
pub use config::{RunConfig, SenderMode};
pub use dmesg::{collect_records, collect_to_buffer, DmesgSource, LogRecord, LogSource};
pub use error::{ReporterError, Result};
pub use guard::BootGuard;
pub use pipeline::{Outcome, Reporter, RunState};
pub use sender::{locate_sender, MetricSink, SendReport, ZabbixSender};

/// Item key the kernel messages are stored under
pub const ITEM_KEY: &str = "sys.kernel.dmesg";

/// Default agent configuration file
pub const DEFAULT_AGENT_CONFIG: &str = "/etc/zabbix/zabbix_agentd.conf";

/// Sending program looked up on `PATH`
pub const SENDER_PROGRAM: &str = "zabbix_sender";

/// Sending executable used when `which` is unavailable
pub const DEFAULT_SENDER_EXEC: &str = "/usr/bin/zabbix_sender";

/// Kernel log reader, resolved through `PATH`
pub const DEFAULT_DMESG_EXEC: &str = "dmesg";

/// Default monitoring server trapper port
pub const DEFAULT_SERVER_PORT: u16 = 10051;

/// Directory for the marker file; cleared at every boot
pub const DEFAULT_MARKER_DIR: &str = "/dev/shm";

/// Directory for the buffer file
pub const DEFAULT_BUFFER_DIR: &str = "/tmp";
