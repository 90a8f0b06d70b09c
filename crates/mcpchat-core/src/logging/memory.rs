//! In-memory logger for tests

use parking_lot::Mutex;

use super::traits::Logger;

/// A logger that keeps every line in memory
///
/// Lines are stored as `"LEVEL message"`.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    lines: Mutex<Vec<String>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all captured lines
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Whether any captured line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|l| l.contains(needle))
    }

    fn push(&self, level: &str, message: &str) {
        self.lines.lock().push(format!("{} {}", level, message));
    }
}

impl Logger for MemoryLogger {
    fn debug(&self, message: &str) {
        self.push("DEBUG", message);
    }

    fn info(&self, message: &str) {
        self.push("INFO", message);
    }

    fn warn(&self, message: &str) {
        self.push("WARN", message);
    }

    fn error(&self, message: &str) {
        self.push("ERROR", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_logger_captures_levels() {
        let logger = MemoryLogger::new();
        logger.info("connected");
        crate::log_warn!(logger, "{} tools collide", 2);

        assert_eq!(logger.lines(), vec!["INFO connected", "WARN 2 tools collide"]);
        assert!(logger.contains("collide"));
        assert!(!logger.contains("ERROR"));
    }
}
