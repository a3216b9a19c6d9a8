//! Statistics for a mirror run

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Byte and timing statistics for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorStatistics {
    /// Total bytes read from the input tree
    pub bytes_read: u64,
    /// Total bytes written to the output tree
    pub bytes_written: u64,
    /// Number of entries discovered
    pub entries_discovered: usize,
    /// Wall-clock processing time in milliseconds
    pub processing_time_ms: u64,
    /// Throughput (bytes read per second)
    pub throughput_bytes_per_sec: f64,
    /// Timestamp of when statistics were collected
    pub collected_at: chrono::DateTime<chrono::Utc>,
}

impl Default for MirrorStatistics {
    fn default() -> Self {
        Self {
            bytes_read: 0,
            bytes_written: 0,
            entries_discovered: 0,
            processing_time_ms: 0,
            throughput_bytes_per_sec: 0.0,
            collected_at: chrono::Utc::now(),
        }
    }
}

impl MirrorStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_read(&mut self, bytes: u64) {
        self.bytes_read += bytes;
    }

    pub fn record_written(&mut self, bytes: u64) {
        self.bytes_written += bytes;
    }

    /// Stamp the elapsed time and derive throughput
    pub fn finish(&mut self, elapsed: Duration) {
        self.processing_time_ms = elapsed.as_millis() as u64;
        self.throughput_bytes_per_sec = if elapsed.as_secs_f64() > 0.0 {
            self.bytes_read as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        self.collected_at = chrono::Utc::now();
    }

    /// Get a formatted summary
    pub fn summary(&self) -> String {
        format!(
            "Read {} bytes, wrote {} bytes in {:.1}s ({:.1}MB/s)",
            self.bytes_read,
            self.bytes_written,
            self.processing_time_ms as f64 / 1000.0,
            self.throughput_bytes_per_sec / (1024.0 * 1024.0)
        )
    }
}
