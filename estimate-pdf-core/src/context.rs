use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::layout::Canvas;
use crate::memory::{self, MemoryMonitor};
use crate::progress::ProgressReporter;
use std::time::Duration;

/// Everything a renderer touches while it runs: the canvas it draws on,
/// the memory monitor it consults between chunks, the progress reporter it
/// advances and the token that may stop it.
pub(crate) struct RenderContext {
    pub canvas: Canvas,
    pub monitor: MemoryMonitor,
    pub progress: ProgressReporter,
    pub cancellation: CancellationToken,
    pub chunk_pause: Duration,
}

impl RenderContext {
    /// Memory check and scheduler yield, bracketed by cancellation checks.
    /// Returns whether memory pressure was observed.
    pub async fn yield_point(&mut self) -> Result<bool> {
        self.cancellation.check()?;
        let pressure = self.monitor.check_and_yield().await;
        self.cancellation.check()?;
        Ok(pressure)
    }

    /// Short cooperative pause between units of work.
    pub async fn pause(&self) -> Result<()> {
        memory::pause(self.chunk_pause).await;
        self.cancellation.check()
    }
}
