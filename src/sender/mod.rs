//! Delivery of collected records to the monitoring server.
//!
//! The actual network protocol belongs to the external `zabbix_sender`
//! program; this module only finds it, builds its command line and checks
//! its exit status.

pub mod locate;
pub mod traits;
pub mod zabbix;

// Re-export commonly used items
pub use locate::locate_sender;
pub use traits::{MetricSink, SendReport};
pub use zabbix::ZabbixSender;
