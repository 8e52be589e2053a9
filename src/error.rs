//! Error handling for the check_dmesg crate.

/// A specialized `Result` type for check_dmesg operations.
pub type Result<T> = std::result::Result<T, ReporterError>;

/// The main error type for a reporting run.
#[derive(Debug, thiserror::Error)]
pub enum ReporterError {
    /// The sending executable could not be located.
    #[error("Zabbix-sender not installed.")]
    SenderNotFound {
        /// Exit code of the lookup command
        code: i32,
    },

    /// The kernel log reader could not be started or streamed.
    #[error("Failed to collect kernel messages: {0}")]
    Collection(String),

    /// The sending command reported failure.
    #[error("zabbix_sender execution has failed with {} exit code", display_code(.code))]
    Transmission {
        /// Exit code of the sender, `None` when it was killed by a signal
        code: Option<i32>,
    },

    /// Marker or buffer file operation failed
    #[error("Boot guard error: {0}")]
    Guard(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "no".to_string(),
    }
}

impl ReporterError {
    /// Create a new collection error
    pub fn collection_error(msg: impl Into<String>) -> Self {
        Self::Collection(msg.into())
    }

    /// Create a new boot guard error
    pub fn guard_error(msg: impl Into<String>) -> Self {
        Self::Guard(msg.into())
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Process exit code for this failure.
    ///
    /// A failed sender lookup exits with the lookup command's own code;
    /// every other failure exits with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::SenderNotFound { code } => *code,
            _ => 1,
        }
    }
}
