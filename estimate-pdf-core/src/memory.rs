//! Memory pressure sampling between rendering chunks.
//!
//! The monitor never fails a generation run: when the process's memory use
//! cannot be read it behaves as if there were no pressure and simply
//! yields to the scheduler.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Reads the current memory use of the process.
pub trait MemorySampler: Send + Sync {
    /// Bytes in use, or `None` when the platform offers no cheap way to ask.
    fn used_bytes(&self) -> Option<u64>;

    fn name(&self) -> &'static str;
}

/// Sampler for platforms without introspection.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSampler;

impl MemorySampler for NoopSampler {
    fn used_bytes(&self) -> Option<u64> {
        None
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

/// Resident set size from `/proc/self/statm`.
#[cfg(target_os = "linux")]
#[derive(Debug, Clone, Copy)]
pub struct ProcStatmSampler {
    page_size: u64,
}

#[cfg(target_os = "linux")]
impl ProcStatmSampler {
    pub fn new() -> Self {
        // SAFETY: sysconf has no preconditions and only reads system config.
        let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        Self {
            page_size: if page_size > 0 { page_size as u64 } else { 4096 },
        }
    }
}

#[cfg(target_os = "linux")]
impl Default for ProcStatmSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "linux")]
impl MemorySampler for ProcStatmSampler {
    fn used_bytes(&self) -> Option<u64> {
        let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
        let resident: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
        Some(resident * self.page_size)
    }

    fn name(&self) -> &'static str {
        "proc-statm"
    }
}

/// The best sampler available on this platform.
pub fn default_sampler() -> Arc<dyn MemorySampler> {
    #[cfg(target_os = "linux")]
    {
        Arc::new(ProcStatmSampler::new())
    }
    #[cfg(not(target_os = "linux"))]
    {
        Arc::new(NoopSampler)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    pub checks: u64,
    pub pauses: u64,
    pub peak_bytes: u64,
}

pub struct MemoryMonitor {
    threshold_bytes: u64,
    pause: Duration,
    sampler: Arc<dyn MemorySampler>,
    stats: MemoryStats,
}

impl MemoryMonitor {
    pub fn new(threshold_mb: u64, pause: Duration, sampler: Arc<dyn MemorySampler>) -> Self {
        Self {
            threshold_bytes: threshold_mb.saturating_mul(1024 * 1024),
            pause,
            sampler,
            stats: MemoryStats::default(),
        }
    }

    pub fn threshold_bytes(&self) -> u64 {
        self.threshold_bytes
    }

    pub fn sampler_name(&self) -> &'static str {
        self.sampler.name()
    }

    pub fn stats(&self) -> MemoryStats {
        self.stats
    }

    /// Samples memory use. Above the threshold this sleeps for the
    /// configured pause; otherwise it yields once to the runtime.
    ///
    /// Returns `true` when pressure was observed.
    pub async fn check_and_yield(&mut self) -> bool {
        self.stats.checks += 1;
        let used = self.sampler.used_bytes();
        if let Some(bytes) = used {
            self.stats.peak_bytes = self.stats.peak_bytes.max(bytes);
        }

        match used {
            Some(bytes) if bytes > self.threshold_bytes => {
                self.stats.pauses += 1;
                debug!(
                    used_mb = bytes / (1024 * 1024),
                    threshold_mb = self.threshold_bytes / (1024 * 1024),
                    pause_ms = self.pause.as_millis() as u64,
                    "memory above threshold, pausing"
                );
                tokio::time::sleep(self.pause).await;
                true
            }
            _ => {
                tokio::task::yield_now().await;
                false
            }
        }
    }
}

/// Cooperative pause between units of work. A zero duration still yields.
pub async fn pause(duration: Duration) {
    if duration.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSampler(u64);

    impl MemorySampler for FixedSampler {
        fn used_bytes(&self) -> Option<u64> {
            Some(self.0)
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_below_threshold_only_yields() {
        let mut monitor =
            MemoryMonitor::new(100, Duration::from_millis(50), Arc::new(FixedSampler(1024)));
        assert!(!monitor.check_and_yield().await);
        let stats = monitor.stats();
        assert_eq!(stats.checks, 1);
        assert_eq!(stats.pauses, 0);
        assert_eq!(stats.peak_bytes, 1024);
    }

    #[tokio::test(start_paused = true)]
    async fn test_above_threshold_pauses() {
        let mut monitor = MemoryMonitor::new(
            1,
            Duration::from_millis(50),
            Arc::new(FixedSampler(8 * 1024 * 1024)),
        );
        let started = tokio::time::Instant::now();
        assert!(monitor.check_and_yield().await);
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert_eq!(monitor.stats().pauses, 1);
    }

    #[tokio::test]
    async fn test_noop_sampler_never_pauses() {
        let mut monitor = MemoryMonitor::new(0, Duration::from_secs(60), Arc::new(NoopSampler));
        assert!(!monitor.check_and_yield().await);
        assert_eq!(monitor.sampler_name(), "noop");
        assert_eq!(monitor.stats().peak_bytes, 0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_proc_statm_reads_something() {
        let sampler = ProcStatmSampler::new();
        assert!(sampler.used_bytes().unwrap_or(0) > 0);
    }

    #[test]
    fn test_threshold_conversion() {
        let monitor = MemoryMonitor::new(100, Duration::ZERO, Arc::new(NoopSampler));
        assert_eq!(monitor.threshold_bytes(), 100 * 1024 * 1024);
    }
}
