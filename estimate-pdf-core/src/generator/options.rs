use crate::cancel::CancellationToken;
use crate::error::{PdfError, Result};
use crate::footer::validate_date_format;
use crate::layout::{Orientation, PageFormat, PageGeometry, Unit};
use crate::memory::MemorySampler;
use crate::page::Margins;
use crate::progress::{ProgressCallback, ProgressUpdate};
use chrono::NaiveDate;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Info-dictionary fields for the generated PDF.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
}

impl DocumentInfo {
    /// Fields set in `other` win.
    pub fn merged_with(&self, other: &DocumentInfo) -> DocumentInfo {
        DocumentInfo {
            title: other.title.clone().or_else(|| self.title.clone()),
            author: other.author.clone().or_else(|| self.author.clone()),
            subject: other.subject.clone().or_else(|| self.subject.clone()),
            keywords: other.keywords.clone().or_else(|| self.keywords.clone()),
        }
    }
}

/// Settings for one generation run.
#[derive(Clone)]
pub struct GeneratorOptions {
    pub orientation: Orientation,
    /// Unit of `margin`.
    pub unit: Unit,
    pub format: PageFormat,
    pub margin: f64,
    /// Memory use above which the monitor pauses, in MB.
    pub memory_threshold_mb: u64,
    /// Default rows per table chunk.
    pub chunk_size: usize,
    pub on_progress: Option<Arc<dyn ProgressCallback>>,
    /// Flate-compress content streams.
    pub compress: bool,
    pub footer_label: String,
    pub date_format: String,
    /// Date printed in footers. `None` uses today's local date.
    pub generation_date: Option<NaiveDate>,
    /// `None` picks the platform default.
    pub memory_sampler: Option<Arc<dyn MemorySampler>>,
    /// Sleep applied when memory is above the threshold.
    pub memory_pause: Duration,
    /// Pause between table chunks and image batches.
    pub chunk_pause: Duration,
    pub cancellation: Option<CancellationToken>,
    pub adaptive_chunking: bool,
    pub metadata: DocumentInfo,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            orientation: Orientation::Portrait,
            unit: Unit::Mm,
            format: PageFormat::A4,
            margin: 15.0,
            memory_threshold_mb: 100,
            chunk_size: 100,
            on_progress: None,
            compress: true,
            footer_label: "Page".to_string(),
            date_format: "%d/%m/%Y".to_string(),
            generation_date: None,
            memory_sampler: None,
            memory_pause: Duration::from_millis(50),
            chunk_pause: Duration::from_millis(10),
            cancellation: None,
            adaptive_chunking: false,
            metadata: DocumentInfo::default(),
        }
    }
}

impl fmt::Debug for GeneratorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorOptions")
            .field("orientation", &self.orientation)
            .field("unit", &self.unit)
            .field("format", &self.format)
            .field("margin", &self.margin)
            .field("memory_threshold_mb", &self.memory_threshold_mb)
            .field("chunk_size", &self.chunk_size)
            .field("on_progress", &self.on_progress.is_some())
            .field("compress", &self.compress)
            .field("footer_label", &self.footer_label)
            .field("date_format", &self.date_format)
            .field("generation_date", &self.generation_date)
            .field(
                "memory_sampler",
                &self.memory_sampler.as_ref().map(|s| s.name()),
            )
            .field("memory_pause", &self.memory_pause)
            .field("chunk_pause", &self.chunk_pause)
            .field("adaptive_chunking", &self.adaptive_chunking)
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl GeneratorOptions {
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_format(mut self, format: PageFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_memory_threshold_mb(mut self, megabytes: u64) -> Self {
        self.memory_threshold_mb = megabytes;
        self
    }

    pub fn with_chunk_size(mut self, rows: usize) -> Self {
        self.chunk_size = rows;
        self
    }

    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ProgressUpdate) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn with_footer_label(mut self, label: impl Into<String>) -> Self {
        self.footer_label = label.into();
        self
    }

    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    pub fn with_generation_date(mut self, date: NaiveDate) -> Self {
        self.generation_date = Some(date);
        self
    }

    pub fn with_memory_sampler(mut self, sampler: Arc<dyn MemorySampler>) -> Self {
        self.memory_sampler = Some(sampler);
        self
    }

    pub fn with_memory_pause(mut self, pause: Duration) -> Self {
        self.memory_pause = pause;
        self
    }

    pub fn with_chunk_pause(mut self, pause: Duration) -> Self {
        self.chunk_pause = pause;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn with_adaptive_chunking(mut self, enabled: bool) -> Self {
        self.adaptive_chunking = enabled;
        self
    }

    pub fn with_metadata(mut self, metadata: DocumentInfo) -> Self {
        self.metadata = metadata;
        self
    }

    /// Page size and margins in points.
    pub fn geometry(&self) -> PageGeometry {
        PageGeometry::new(
            self.format,
            self.orientation,
            Margins::uniform(self.unit.to_points(self.margin)),
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(PdfError::InvalidConfiguration(
                "chunk size must be at least 1".to_string(),
            ));
        }
        if self.memory_threshold_mb == 0 {
            return Err(PdfError::InvalidConfiguration(
                "memory threshold must be greater than zero".to_string(),
            ));
        }
        if !self.margin.is_finite() || self.margin < 0.0 {
            return Err(PdfError::InvalidConfiguration(
                "margin must not be negative".to_string(),
            ));
        }
        let geometry = self.geometry();
        let margin = geometry.margins.left;
        if margin * 2.0 >= geometry.width.min(geometry.height) {
            return Err(PdfError::InvalidConfiguration(format!(
                "margin of {margin:.1}pt leaves no room on a {:.0}x{:.0}pt page",
                geometry.width, geometry.height
            )));
        }
        geometry.validate()?;
        validate_date_format(&self.date_format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = GeneratorOptions::default();
        assert_eq!(options.chunk_size, 100);
        assert_eq!(options.memory_threshold_mb, 100);
        assert_eq!(options.memory_pause, Duration::from_millis(50));
        assert_eq!(options.footer_label, "Page");
        assert_eq!(options.date_format, "%d/%m/%Y");
        assert!(!options.adaptive_chunking);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_geometry_converts_margin() {
        let options = GeneratorOptions::default()
            .with_unit(Unit::In)
            .with_margin(1.0)
            .with_format(PageFormat::Letter)
            .with_orientation(Orientation::Landscape);
        let geometry = options.geometry();
        assert_eq!((geometry.width, geometry.height), (792.0, 612.0));
        assert_eq!(geometry.margins.top, 72.0);
    }

    #[test]
    fn test_validation_failures() {
        let cases = [
            GeneratorOptions::default().with_chunk_size(0),
            GeneratorOptions::default().with_memory_threshold_mb(0),
            GeneratorOptions::default().with_margin(-5.0),
            GeneratorOptions::default().with_margin(150.0),
            GeneratorOptions::default().with_date_format("%Q"),
        ];
        for options in cases {
            assert!(
                matches!(options.validate(), Err(PdfError::InvalidConfiguration(_))),
                "{options:?}"
            );
        }
    }

    #[test]
    fn test_metadata_merge() {
        let base = DocumentInfo {
            title: Some("Base".to_string()),
            author: Some("Office".to_string()),
            ..Default::default()
        };
        let overlay = DocumentInfo {
            title: Some("Estimate #12".to_string()),
            ..Default::default()
        };
        let merged = base.merged_with(&overlay);
        assert_eq!(merged.title.as_deref(), Some("Estimate #12"));
        assert_eq!(merged.author.as_deref(), Some("Office"));
    }

    #[test]
    fn test_debug_hides_callback() {
        let options = GeneratorOptions::default().with_progress(|_| {});
        let debug = format!("{options:?}");
        assert!(debug.contains("on_progress: true"));
    }
}
