//! JSON manifest describing an estimate or invoice.
//!
//! ```json
//! {
//!   "header": { "title": "Estimate #1042", "subtitle": "Green Acres" },
//!   "metadata": { "author": "Green Acres Landscaping" },
//!   "options": { "format": "letter", "margin": 12, "chunk_size": 50 },
//!   "blocks": [
//!     { "type": "section", "title": "Client", "content": "Jane Doe" },
//!     { "type": "table", "headers": ["Item", "Qty"], "rows": [["Mulch", "4"]] },
//!     { "type": "page_break" },
//!     { "type": "images", "images": [{ "path": "photos/front.jpg", "caption": "Front" }] }
//!   ]
//! }
//! ```

use anyhow::{Context, Result};
use chrono::NaiveDate;
use estimate_pdf::{
    DocumentInfo, DocumentSpec, GeneratorOptions, ImageGridOptions, ImageRef, Orientation,
    PageFormat, TableOptions, Unit,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Manifest {
    pub header: Option<ManifestHeader>,
    pub metadata: ManifestMetadata,
    pub options: ManifestOptions,
    pub blocks: Vec<ManifestBlock>,
}

#[derive(Debug, Deserialize)]
pub struct ManifestHeader {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ManifestMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManifestOptions {
    pub format: Option<String>,
    pub orientation: Option<String>,
    pub unit: Option<String>,
    pub margin: Option<f64>,
    pub chunk_size: Option<usize>,
    pub memory_threshold_mb: Option<u64>,
    pub footer_label: Option<String>,
    pub date_format: Option<String>,
    pub generation_date: Option<NaiveDate>,
    pub compress: Option<bool>,
    pub adaptive_chunking: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ManifestBlock {
    Section {
        title: String,
        #[serde(default)]
        content: Option<String>,
        #[serde(default)]
        lines: Vec<String>,
    },
    Table {
        #[serde(default)]
        headers: Vec<String>,
        #[serde(default)]
        rows: Vec<Vec<String>>,
        #[serde(default)]
        chunk_size: Option<usize>,
        #[serde(default)]
        column_widths: Option<Vec<f64>>,
        #[serde(default)]
        max_wrap_lines: Option<usize>,
    },
    Images {
        images: Vec<ManifestImage>,
        #[serde(default)]
        images_per_row: Option<usize>,
        #[serde(default)]
        image_width: Option<f64>,
        #[serde(default)]
        image_height: Option<f64>,
        #[serde(default)]
        spacing: Option<f64>,
        #[serde(default)]
        pause_every: Option<usize>,
    },
    PageBreak,
}

#[derive(Debug, Deserialize)]
pub struct ManifestImage {
    /// Relative paths resolve against the manifest's directory.
    pub path: PathBuf,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid manifest {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Layers the manifest's options over `options`.
    pub fn apply_options(&self, mut options: GeneratorOptions) -> Result<GeneratorOptions> {
        let settings = &self.options;
        if let Some(format) = &settings.format {
            options.format = format.parse::<PageFormat>()?;
        }
        if let Some(orientation) = &settings.orientation {
            options.orientation = orientation.parse::<Orientation>()?;
        }
        if let Some(unit) = &settings.unit {
            options.unit = unit.parse::<Unit>()?;
        }
        if let Some(margin) = settings.margin {
            options.margin = margin;
        }
        if let Some(chunk_size) = settings.chunk_size {
            options.chunk_size = chunk_size;
        }
        if let Some(threshold) = settings.memory_threshold_mb {
            options.memory_threshold_mb = threshold;
        }
        if let Some(label) = &settings.footer_label {
            options.footer_label = label.clone();
        }
        if let Some(format) = &settings.date_format {
            options.date_format = format.clone();
        }
        if let Some(date) = settings.generation_date {
            options.generation_date = Some(date);
        }
        if let Some(compress) = settings.compress {
            options.compress = compress;
        }
        if let Some(adaptive) = settings.adaptive_chunking {
            options.adaptive_chunking = adaptive;
        }
        Ok(options)
    }

    /// Builds the document description, reading image files relative to
    /// `base_dir`. An unreadable image is kept as an empty payload so the
    /// generator skips it and leaves its slot blank.
    pub fn to_spec(&self, base_dir: &Path) -> DocumentSpec {
        let mut spec = DocumentSpec::new().with_metadata(DocumentInfo {
            title: self.metadata.title.clone(),
            author: self.metadata.author.clone(),
            subject: self.metadata.subject.clone(),
            keywords: self.metadata.keywords.clone(),
        });
        if let Some(header) = &self.header {
            spec = spec.with_header(header.title.clone(), header.subtitle.clone());
        }

        for block in &self.blocks {
            spec = match block {
                ManifestBlock::Section {
                    title,
                    content,
                    lines,
                } => match content {
                    Some(content) => spec.section(title.clone(), content.clone()),
                    None => spec.section_lines(title.clone(), lines.clone()),
                },
                ManifestBlock::Table {
                    headers,
                    rows,
                    chunk_size,
                    column_widths,
                    max_wrap_lines,
                } => {
                    let defaults = TableOptions::default();
                    let options = TableOptions {
                        chunk_size: *chunk_size,
                        column_widths: column_widths.clone(),
                        max_wrap_lines: max_wrap_lines.unwrap_or(defaults.max_wrap_lines),
                        ..defaults
                    };
                    spec.table(headers.clone(), rows.clone(), options)
                }
                ManifestBlock::Images {
                    images,
                    images_per_row,
                    image_width,
                    image_height,
                    spacing,
                    pause_every,
                } => {
                    let defaults = ImageGridOptions::default();
                    let options = ImageGridOptions {
                        images_per_row: images_per_row.unwrap_or(defaults.images_per_row),
                        image_width: image_width.or(defaults.image_width),
                        image_height: image_height.unwrap_or(defaults.image_height),
                        spacing: spacing.unwrap_or(defaults.spacing),
                        pause_every: pause_every.unwrap_or(defaults.pause_every),
                        ..defaults
                    };
                    let refs = images
                        .iter()
                        .map(|image| load_image(base_dir, image))
                        .collect();
                    spec.images(refs, options)
                }
                ManifestBlock::PageBreak => spec.page_break(),
            };
        }
        spec
    }
}

fn load_image(base_dir: &Path, image: &ManifestImage) -> ImageRef {
    let path = if image.path.is_absolute() {
        image.path.clone()
    } else {
        base_dir.join(&image.path)
    };
    let data = match std::fs::read(&path) {
        Ok(data) => data,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "could not read image");
            Vec::new()
        }
    };
    ImageRef {
        data,
        width: image.width,
        height: image.height,
        caption: image.caption.clone(),
    }
}
