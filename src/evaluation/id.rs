//! Per-evaluation identifiers
//!
//! Every oracle invocation gets a token that is unique within the process
//! and across processes on the same host, so concurrent work units never
//! share file names.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(0);

/// Process id plus a process-wide monotonic serial
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EvaluationId {
    pid: u32,
    serial: u64,
}

impl EvaluationId {
    /// Allocate a fresh identifier
    pub fn next() -> Self {
        Self {
            pid: std::process::id(),
            serial: NEXT_SERIAL.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Allocate `count` fresh identifiers
    pub fn allocate(count: usize) -> Vec<Self> {
        (0..count).map(|_| Self::next()).collect()
    }

    /// Owning process id
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Serial within the owning process
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Name of the coordinate file written for this evaluation
    pub fn shape_file_name(&self) -> String {
        format!("shape{self}.txt")
    }

    /// Name of the simulator output directory for this evaluation
    pub fn output_dir_name(&self) -> String {
        format!("experiment{self}")
    }
}

impl fmt::Display for EvaluationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.pid, self.serial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let ids = EvaluationId::allocate(100);
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 100);
        assert!(ids.windows(2).all(|w| w[0].serial() < w[1].serial()));
        assert!(ids.iter().all(|id| id.pid() == std::process::id()));
    }

    #[test]
    fn test_ids_unique_across_threads() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| EvaluationId::allocate(250)))
            .collect();
        let mut all = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(all.insert(id));
            }
        }
        assert_eq!(all.len(), 2000);
    }

    #[test]
    fn test_work_unit_names() {
        let id = EvaluationId { pid: 12, serial: 7 };
        assert_eq!(id.to_string(), "12-7");
        assert_eq!(id.shape_file_name(), "shape12-7.txt");
        assert_eq!(id.output_dir_name(), "experiment12-7");
    }
}
