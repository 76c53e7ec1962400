use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Tracks throughput and anomaly counters for one extraction run
#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    // Reader metrics
    bytes_read: Arc<AtomicU64>,
    blocks_emitted: Arc<AtomicU64>,
    forced_cuts: Arc<AtomicU64>,
    decode_substitutions: Arc<AtomicU64>,

    // Worker metrics
    blocks_skipped: Arc<AtomicU64>,

    // Aggregation metrics
    raw_matches: Arc<AtomicU64>,
    unique_numbers: Arc<AtomicU64>,
}

impl PipelineMetrics {
    /// Creates a new PipelineMetrics instance
    pub fn new() -> Self {
        Self {
            bytes_read: Arc::new(AtomicU64::new(0)),
            blocks_emitted: Arc::new(AtomicU64::new(0)),
            forced_cuts: Arc::new(AtomicU64::new(0)),
            decode_substitutions: Arc::new(AtomicU64::new(0)),
            blocks_skipped: Arc::new(AtomicU64::new(0)),
            raw_matches: Arc::new(AtomicU64::new(0)),
            unique_numbers: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records a read from the source
    pub fn record_read(&self, bytes: u64) {
        let total = self.bytes_read.fetch_add(bytes, Ordering::Relaxed) + bytes;
        debug!("Read {} bytes, total: {} bytes", bytes, total);
    }

    /// Records a block handed to the worker pool
    pub fn record_block(&self, forced_cut: bool) {
        self.blocks_emitted.fetch_add(1, Ordering::Relaxed);
        if forced_cut {
            self.forced_cuts.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records a block whose bytes were not valid UTF-8
    pub fn record_decode_substitution(&self) {
        self.decode_substitutions.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a block dropped under the skip policy
    pub fn record_skipped_block(&self) {
        self.blocks_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Records matches found in a block before deduplication
    pub fn record_matches(&self, count: u64) {
        self.raw_matches.fetch_add(count, Ordering::Relaxed);
    }

    /// Records the size of the final result set
    pub fn record_unique(&self, count: u64) {
        self.unique_numbers.store(count, Ordering::Relaxed);
    }

    pub fn blocks_skipped(&self) -> u64 {
        self.blocks_skipped.load(Ordering::Relaxed)
    }

    /// Gets a point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            blocks: self.blocks_emitted.load(Ordering::Relaxed),
            forced_cuts: self.forced_cuts.load(Ordering::Relaxed),
            decode_substitutions: self.decode_substitutions.load(Ordering::Relaxed),
            blocks_skipped: self.blocks_skipped.load(Ordering::Relaxed),
            raw_matches: self.raw_matches.load(Ordering::Relaxed),
            unique_numbers: self.unique_numbers.load(Ordering::Relaxed),
        }
    }

    /// Logs current pipeline statistics
    pub fn log_stats(&self) {
        let stats = self.snapshot();
        info!(
            "Pipeline stats:\n\
             Bytes read: {}\n\
             Blocks (forced cuts): {} ({})\n\
             Blocks with replaced UTF-8: {}\n\
             Blocks skipped: {}\n\
             Matches (unique): {} ({})",
            stats.bytes_read,
            stats.blocks,
            stats.forced_cuts,
            stats.decode_substitutions,
            stats.blocks_skipped,
            stats.raw_matches,
            stats.unique_numbers
        );
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters captured at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub bytes_read: u64,
    pub blocks: u64,
    pub forced_cuts: u64,
    pub decode_substitutions: u64,
    pub blocks_skipped: u64,
    pub raw_matches: u64,
    pub unique_numbers: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_and_block_tracking() {
        let metrics = PipelineMetrics::new();

        metrics.record_read(1000);
        metrics.record_read(500);
        metrics.record_block(false);
        metrics.record_block(true);

        let stats = metrics.snapshot();
        assert_eq!(stats.bytes_read, 1500);
        assert_eq!(stats.blocks, 2);
        assert_eq!(stats.forced_cuts, 1);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = PipelineMetrics::new();
        let worker_view = metrics.clone();

        worker_view.record_skipped_block();
        worker_view.record_matches(12);
        metrics.record_unique(9);

        let stats = metrics.snapshot();
        assert_eq!(stats.blocks_skipped, 1);
        assert_eq!(metrics.blocks_skipped(), 1);
        assert_eq!(stats.raw_matches, 12);
        assert_eq!(stats.unique_numbers, 9);
    }

    #[test]
    fn test_decode_substitutions() {
        let metrics = PipelineMetrics::default();
        metrics.record_decode_substitution();
        metrics.record_decode_substitution();
        assert_eq!(metrics.snapshot().decode_substitutions, 2);
    }
}
