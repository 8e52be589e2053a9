//! Buffer line model.

use std::fmt;

/// One kernel message as it is written to the sender's input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Host name the item belongs to
    pub host: String,
    /// Item key the value is stored under
    pub key: String,
    /// Raw kernel message, trailing whitespace removed
    pub message: String,
}

impl LogRecord {
    /// Build a record for the kernel message item key from a raw reader line.
    pub fn from_line(host: impl Into<String>, line: &str) -> Self {
        Self {
            host: host.into(),
            key: crate::ITEM_KEY.to_string(),
            message: line.trim_end().to_string(),
        }
    }
}

/// Renders `<host> <key> "<message>"`. The message is written as-is.
impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} \"{}\"", self.host, self.key, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_format() {
        let record = LogRecord::from_line("host1", "[ 1.234567] foo err");
        assert_eq!(
            record.to_string(),
            "host1 sys.kernel.dmesg \"[ 1.234567] foo err\""
        );
    }

    #[test]
    fn test_trailing_whitespace_stripped() {
        let record = LogRecord::from_line("host1", "kern  :err   : [Mon Oct 19] oops \t\r\n");
        assert_eq!(record.message, "kern  :err   : [Mon Oct 19] oops");
    }

    #[test]
    fn test_leading_whitespace_kept() {
        let record = LogRecord::from_line("host1", "  indented\n");
        assert_eq!(record.to_string(), "host1 sys.kernel.dmesg \"  indented\"");
    }

    #[test]
    fn test_empty_line() {
        let record = LogRecord::from_line("host1", "\n");
        assert_eq!(record.to_string(), "host1 sys.kernel.dmesg \"\"");
    }
}
