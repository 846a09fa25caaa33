use crate::queue::FlushReport;
use marquee_core::DeviceMetrics;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use sysinfo::System;
use tracing::debug;

const PROC_STAT: &str = "/proc/stat";

/// Aggregate CPU jiffies from the first line of `/proc/stat`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    /// idle + iowait
    pub idle: u64,
    /// user + nice + system + idle + iowait + irq + softirq + steal
    pub total: u64,
}

impl CpuTimes {
    /// Parse the aggregate `cpu` line. Returns `None` if it is missing or short.
    pub fn parse_proc_stat(contents: &str) -> Option<Self> {
        let line = contents
            .lines()
            .find(|line| line.split_whitespace().next() == Some("cpu"))?;

        let fields: Vec<u64> = line
            .split_whitespace()
            .skip(1)
            .take(8)
            .map(str::parse)
            .collect::<Result<_, _>>()
            .ok()?;

        if fields.len() < 4 {
            return None;
        }

        let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
        let total = fields.iter().sum();
        Some(Self { idle, total })
    }

    /// Busy percentage between `previous` and `self`, clamped to 0-100
    pub fn utilization_since(&self, previous: &CpuTimes) -> f32 {
        let total = self.total.saturating_sub(previous.total);
        if total == 0 {
            return 0.0;
        }
        let idle = self.idle.saturating_sub(previous.idle).min(total);
        let busy = (total - idle) as f64 / total as f64 * 100.0;
        busy.clamp(0.0, 100.0) as f32
    }
}

/// Produces [`DeviceMetrics`] snapshots.
///
/// Unreadable sources report zeroes rather than failing the heartbeat.
pub struct DeviceMetricsProvider {
    system: Mutex<System>,
    last_cpu: Mutex<CpuTimes>,
    online: AtomicBool,
    stat_path: PathBuf,
}

impl DeviceMetricsProvider {
    pub fn new() -> Self {
        Self::with_stat_path(PROC_STAT)
    }

    /// Read CPU counters from a different file (tests, containers)
    pub fn with_stat_path(path: impl AsRef<Path>) -> Self {
        Self {
            system: Mutex::new(System::new()),
            last_cpu: Mutex::new(CpuTimes::default()),
            online: AtomicBool::new(false),
            stat_path: path.as_ref().to_path_buf(),
        }
    }

    /// Record whether the last exchange with the Player API succeeded
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Relaxed);
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }

    /// Derive connectivity from a flush. An empty flush says nothing new.
    pub fn record_flush(&self, report: &FlushReport) {
        if report.attempted == 0 {
            return;
        }
        self.set_online(report.delivered > 0);
    }

    /// Sample CPU since the previous snapshot (since boot for the first) and memory now
    pub async fn snapshot(&self) -> DeviceMetrics {
        let cpu_usage = match tokio::fs::read_to_string(&self.stat_path).await {
            Ok(contents) => match CpuTimes::parse_proc_stat(&contents) {
                Some(now) => {
                    let mut last = self.last_cpu.lock().unwrap_or_else(PoisonError::into_inner);
                    let usage = now.utilization_since(&last);
                    *last = now;
                    usage
                }
                None => {
                    debug!(path = %self.stat_path.display(), "Unrecognized CPU stat format");
                    0.0
                }
            },
            Err(e) => {
                debug!(path = %self.stat_path.display(), error = %e, "CPU stats unavailable");
                0.0
            }
        };

        let (free_memory_bytes, total_memory_bytes) = {
            let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
            system.refresh_memory();
            (system.available_memory(), system.total_memory())
        };

        DeviceMetrics {
            cpu_usage,
            free_memory_bytes,
            total_memory_bytes,
            online: self.is_online(),
        }
    }
}

impl Default for DeviceMetricsProvider {
    fn default() -> Self {
        Self::new()
    }
}
