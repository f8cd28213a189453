//! Log collection collaborator.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Supplies the opaque log blob attached to call feedback.
///
/// The blob is read at submission time only, never cached on the feedback.
pub trait LogCollector: Send + Sync {
    /// Current in-memory log contents as one opaque blob.
    fn memory_logs(&self) -> String;
}

/// Collector that never has logs.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopLogCollector;

impl LogCollector for NoopLogCollector {
    fn memory_logs(&self) -> String {
        String::new()
    }
}

/// Bounded in-memory log buffer keeping the most recent lines.
#[derive(Debug)]
pub struct MemoryLogCollector {
    capacity: usize,
    lines: Mutex<VecDeque<String>>,
}

impl MemoryLogCollector {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            lines: Mutex::new(VecDeque::new()),
        }
    }

    /// Append a line, evicting the oldest once past capacity.
    pub fn append(&self, line: impl Into<String>) {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        lines.push_back(line.into());
        while lines.len() > self.capacity {
            lines.pop_front();
        }
    }
}

impl Default for MemoryLogCollector {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl LogCollector for MemoryLogCollector {
    fn memory_logs(&self) -> String {
        let lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        lines.iter().cloned().collect::<Vec<_>>().join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_collector_is_empty() {
        assert_eq!(NoopLogCollector.memory_logs(), "");
    }

    #[test]
    fn test_memory_collector_joins_lines() {
        let collector = MemoryLogCollector::default();
        collector.append("first");
        collector.append("second");
        assert_eq!(collector.memory_logs(), "first\nsecond");
    }

    #[test]
    fn test_memory_collector_evicts_oldest() {
        let collector = MemoryLogCollector::new(2);
        collector.append("a");
        collector.append("b");
        collector.append("c");
        assert_eq!(collector.memory_logs(), "b\nc");
    }
}
