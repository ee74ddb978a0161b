//! # estimate-pdf
//!
//! Progressive PDF generation for landscaping estimates and invoices.
//!
//! Documents are assembled step by step so that long line-item tables and
//! large photo sets do not stall the caller:
//!
//! - **Chunked tables**: rows are drawn in fixed-size chunks with the header
//!   on the first chunk only, yielding to the runtime in between
//! - **Image grids**: each photo is decoded and placed on its own; a broken
//!   photo leaves a gap and a warning instead of failing the document
//! - **Memory awareness**: resident memory is sampled between chunks and the
//!   generator backs off above a threshold
//! - **Progress**: every header, section, chunk, image and the final
//!   serialization is reported to an optional callback
//! - **Footers**: generation date and `Page N / total` on every page
//! - **Native PDF writer**: standard Type1 fonts, JPEG and raw image
//!   XObjects, optional Flate compression
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use estimate_pdf::{DocumentSpec, GeneratorOptions, TableOptions, render_document};
//!
//! # async fn run() -> estimate_pdf::Result<()> {
//! let rows = vec![
//!     vec!["Hardwood mulch".to_string(), "6".to_string(), "$210.00".to_string()],
//!     vec!["Edging, steel".to_string(), "40".to_string(), "$380.00".to_string()],
//! ];
//! let spec = DocumentSpec::new()
//!     .with_header("Estimate #1042", Some("Green Acres Landscaping".to_string()))
//!     .section("Client", "Jane Doe\n12 Elm Street")
//!     .table(
//!         vec!["Item".to_string(), "Qty".to_string(), "Total".to_string()],
//!         rows,
//!         TableOptions::default(),
//!     );
//!
//! let bytes = render_document(&spec, GeneratorOptions::default()).await?;
//! std::fs::write("estimate.pdf", bytes)?;
//! # Ok(())
//! # }
//! ```

pub mod cancel;
mod context;
pub mod document;
pub mod error;
pub mod footer;
pub mod generator;
pub mod graphics;
pub mod images;
pub mod layout;
pub mod memory;
pub mod objects;
pub mod page;
pub mod progress;
pub mod table;
pub mod text;
pub mod writer;

pub use cancel::CancellationToken;
pub use document::{Document, DocumentMetadata};
pub use error::{PdfError, Result};
pub use footer::{Footer, FooterOptions};
pub use generator::{
    render_document, Block, BuildReport, DocumentInfo, DocumentSpec, DocumentState,
    GeneratorOptions, HeaderSpec, ImageSetSpec, ProgressiveDocument, SectionBody, SectionSpec,
};
pub use graphics::{Color, GraphicsContext, Image, ImageColorSpace, ImageFormat};
pub use images::{ImageGridOptions, ImageGridReport, ImageRef, ImageSlot, SkippedImage};
pub use layout::{Orientation, PageFormat, PageGeometry, Unit};
pub use memory::{default_sampler, MemorySampler, MemoryStats, NoopSampler};
#[cfg(target_os = "linux")]
pub use memory::ProcStatmSampler;
pub use page::{Margins, Page};
pub use progress::{ProgressBar, ProgressCallback, ProgressUpdate};
pub use table::{ChunkReport, TableOptions, TableReport, TableSpec};
pub use text::{measure_text, CacheStats, Font, LayoutCache, TextAlign};

/// Current version of estimate-pdf
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_empty_document() {
        let doc = Document::new();
        assert_eq!(doc.pages.len(), 0);
    }

    #[test]
    fn test_version_info() {
        assert!(!VERSION.is_empty());
    }
}
