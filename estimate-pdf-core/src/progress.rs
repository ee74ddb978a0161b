//! Step-based progress reporting for a generation run.

use std::sync::Arc;
use std::time::{Duration, Instant};

/// Snapshot handed to the progress callback after every step.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// Machine-readable step kind: `header`, `section`, `table`, `image`
    /// or `finalize`.
    pub step_name: String,
    /// Human-readable description of the step just completed.
    pub message: String,
    /// `round(completed / total * 100)`, never above 100.
    pub percentage: u8,
    pub completed: usize,
    pub total: usize,
    pub elapsed: Duration,
}

impl ProgressUpdate {
    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }
}

/// Receives progress updates. Invoked synchronously, in order.
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, update: &ProgressUpdate);
}

impl<F> ProgressCallback for F
where
    F: Fn(&ProgressUpdate) + Send + Sync,
{
    fn on_progress(&self, update: &ProgressUpdate) {
        self(update)
    }
}

/// Counts completed steps against an expected total.
///
/// The total is either planned up front from the whole document or, when
/// the caller drives the generator method by method, grown by each
/// operation just before it starts (`reserve`). Either way the total is
/// known before the step it covers is reported.
pub struct ProgressReporter {
    total: usize,
    completed: usize,
    planned: bool,
    callback: Option<Arc<dyn ProgressCallback>>,
    started: Instant,
}

impl ProgressReporter {
    pub fn new(callback: Option<Arc<dyn ProgressCallback>>) -> Self {
        Self {
            total: 0,
            completed: 0,
            planned: false,
            callback,
            started: Instant::now(),
        }
    }

    /// Fixes the total for the whole run. Later `reserve` calls are ignored.
    pub fn plan(&mut self, total: usize) {
        self.total = total.max(self.completed);
        self.planned = true;
    }

    /// Adds `units` to the total unless the run was planned.
    pub fn reserve(&mut self, units: usize) {
        if !self.planned {
            self.total += units;
        }
    }

    pub fn is_planned(&self) -> bool {
        self.planned
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn percentage(&self) -> u8 {
        percentage(self.completed, self.total)
    }

    /// Marks one step complete and notifies the callback.
    pub fn report_step(&mut self, step_name: &str, message: impl Into<String>) -> ProgressUpdate {
        self.completed += 1;
        // An underestimated plan must not push the percentage past 100.
        if self.completed > self.total {
            self.total = self.completed;
        }

        let update = ProgressUpdate {
            step_name: step_name.to_string(),
            message: message.into(),
            percentage: self.percentage(),
            completed: self.completed,
            total: self.total,
            elapsed: self.started.elapsed(),
        };

        if let Some(callback) = &self.callback {
            callback.on_progress(&update);
        }
        update
    }
}

fn percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let ratio = completed as f64 / total as f64 * 100.0;
    ratio.round().clamp(0.0, 100.0) as u8
}

/// Single-line terminal rendering of a [`ProgressUpdate`].
pub struct ProgressBar {
    width: usize,
    show_message: bool,
}

impl Default for ProgressBar {
    fn default() -> Self {
        Self {
            width: 30,
            show_message: true,
        }
    }
}

impl ProgressBar {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            ..Default::default()
        }
    }

    pub fn without_message(mut self) -> Self {
        self.show_message = false;
        self
    }

    pub fn render(&self, update: &ProgressUpdate) -> String {
        let filled = update.percentage as usize * self.width / 100;
        let empty = self.width.saturating_sub(filled);

        let mut parts = vec![
            format!(
                "[{}{}] {:>3}%",
                "=".repeat(filled),
                " ".repeat(empty),
                update.percentage
            ),
            format!("{}/{}", update.completed, update.total),
        ];
        if self.show_message && !update.message.is_empty() {
            parts.push(update.message.clone());
        }
        parts.join(" | ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recording() -> (Arc<Mutex<Vec<ProgressUpdate>>>, Arc<dyn ProgressCallback>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: Arc<dyn ProgressCallback> = Arc::new(move |update: &ProgressUpdate| {
            sink.lock().unwrap().push(update.clone());
        });
        (seen, callback)
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage(0, 3), 0);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(3, 3), 100);
        assert_eq!(percentage(0, 0), 100);
    }

    #[test]
    fn test_planned_run_reports_each_step() {
        let (seen, callback) = recording();
        let mut reporter = ProgressReporter::new(Some(callback));
        reporter.plan(4);
        reporter.reserve(10);
        assert_eq!(reporter.total(), 4);

        reporter.report_step("header", "Header added");
        reporter.report_step("table", "Rows 1-100 of 250");
        reporter.report_step("table", "Rows 101-200 of 250");
        let last = reporter.report_step("finalize", "Done");

        assert_eq!(last.percentage, 100);
        assert!(last.is_complete());
        let seen = seen.lock().unwrap();
        let percentages: Vec<u8> = seen.iter().map(|u| u.percentage).collect();
        assert_eq!(percentages, vec![25, 50, 75, 100]);
        assert_eq!(seen[1].message, "Rows 1-100 of 250");
    }

    #[test]
    fn test_unplanned_run_grows_total() {
        let mut reporter = ProgressReporter::new(None);
        reporter.reserve(1);
        assert_eq!(reporter.report_step("header", "").percentage, 100);
        reporter.reserve(3);
        let update = reporter.report_step("table", "");
        assert_eq!((update.completed, update.total), (2, 4));
        assert_eq!(update.percentage, 50);
    }

    #[test]
    fn test_overrun_never_exceeds_hundred() {
        let mut reporter = ProgressReporter::new(None);
        reporter.plan(1);
        reporter.report_step("a", "");
        let update = reporter.report_step("b", "");
        assert_eq!(update.percentage, 100);
        assert_eq!(update.total, 2);
    }

    #[test]
    fn test_progress_bar_render() {
        let update = ProgressUpdate {
            step_name: "table".to_string(),
            message: "Rows 1-100 of 250".to_string(),
            percentage: 50,
            completed: 2,
            total: 4,
            elapsed: Duration::from_millis(10),
        };
        let line = ProgressBar::new(10).render(&update);
        assert_eq!(line, "[=====     ]  50% | 2/4 | Rows 1-100 of 250");

        let bare = ProgressBar::new(4).without_message().render(&update);
        assert_eq!(bare, "[==  ]  50% | 2/4");
    }
}
