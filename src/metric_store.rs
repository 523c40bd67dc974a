// =============================================================================
// MetricStore — bounded, thread-safe ring of recent metric points
// =============================================================================
//
// Not a time-series database: queries are linear scans, acceptable because
// `max_size` caps the working set (§4.1). Readers share the guard; writers
// take it exclusively. No operation blocks on I/O while holding the guard.
// =============================================================================

use std::collections::VecDeque;

use parking_lot::RwLock;

use crate::types::Metric;

/// Default bound on the number of metrics retained (§3).
pub const DEFAULT_MAX_SIZE: usize = 10_000;

/// Point-in-time utilization snapshot returned by [`MetricStore::stats`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreStats {
    pub count: usize,
    pub max_size: usize,
}

impl StoreStats {
    /// Utilization as a `"NN.NN%"` string, per §4.1/§6.1.
    pub fn utilization(&self) -> String {
        if self.max_size == 0 {
            return "0.00%".to_string();
        }
        let pct = (self.count as f64 / self.max_size as f64) * 100.0;
        format!("{pct:.2}%")
    }
}

/// Bounded ordered sequence of [`Metric`], newest at the tail.
///
/// `Store` evicts the oldest element (FIFO, single eviction per insert) once
/// `max_size` is reached. `Close` discards the buffer; subsequent operations
/// on a closed store act as if the store were empty — the implementer choice
/// made here favors "degrade gracefully" over "fail fast" (§3 allows either).
pub struct MetricStore {
    buffer: RwLock<VecDeque<Metric>>,
    max_size: usize,
    closed: std::sync::atomic::AtomicBool,
}

impl MetricStore {
    /// Create a store bounded at `max_size` points.
    pub fn new(max_size: usize) -> Self {
        Self {
            buffer: RwLock::new(VecDeque::with_capacity(max_size.min(1024))),
            max_size,
            closed: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Append a metric, evicting the oldest entry first if the store is full.
    /// Never rejects; eviction is silent (§7, `StorageFull`).
    pub fn store(&self, metric: Metric) {
        if self.is_closed() {
            return;
        }
        let mut buf = self.buffer.write();
        if buf.len() >= self.max_size {
            buf.pop_front();
        }
        buf.push_back(metric);
    }

    /// Return, in insertion order, at most `limit` metrics named `name`.
    /// `name == ""` matches all metrics; `limit == 0` means unbounded.
    pub fn get_by_name(&self, name: &str, limit: usize) -> Vec<Metric> {
        let buf = self.buffer.read();
        let mut out = Vec::new();
        for m in buf.iter() {
            if name.is_empty() || m.name == name {
                out.push(m.clone());
                if limit != 0 && out.len() >= limit {
                    break;
                }
            }
        }
        out
    }

    /// Return all metrics whose labels contain `key` mapped to `value`.
    pub fn get_by_label(&self, key: &str, value: &str) -> Vec<Metric> {
        let buf = self.buffer.read();
        buf.iter()
            .filter(|m| m.labels.get(key).map(|v| v.as_str()) == Some(value))
            .cloned()
            .collect()
    }

    /// Retain only metrics with `timestamp >= ts`, preserving order.
    pub fn delete_older_than(&self, ts: i64) {
        let mut buf = self.buffer.write();
        buf.retain(|m| m.timestamp >= ts);
    }

    /// Current count, configured max size, and utilization string (§4.1, §6.1).
    pub fn stats(&self) -> StoreStats {
        let count = self.buffer.read().len();
        StoreStats {
            count,
            max_size: self.max_size,
        }
    }

    /// Discard the buffer. Further `store` calls become no-ops; queries
    /// observe an empty store.
    pub fn close(&self) {
        self.closed.store(true, std::sync::atomic::Ordering::SeqCst);
        self.buffer.write().clear();
    }

    fn is_closed(&self) -> bool {
        self.closed.load(std::sync::atomic::Ordering::SeqCst)
    }
}

// =============================================================================
// Tests
// =============================================================================
