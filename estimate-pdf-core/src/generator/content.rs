use super::options::DocumentInfo;
use crate::error::Result;
use crate::images::{ImageGridOptions, ImageRef};
use crate::table::{TableOptions, TableSpec};

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderSpec {
    pub title: String,
    pub subtitle: Option<String>,
}

impl HeaderSpec {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }
}

/// Body of a section: free text wrapped as paragraphs, or lines that are
/// each wrapped on their own.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionBody {
    Text(String),
    Lines(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionSpec {
    pub title: String,
    pub body: SectionBody,
}

#[derive(Debug, Clone, Default)]
pub struct ImageSetSpec {
    pub images: Vec<ImageRef>,
    pub options: ImageGridOptions,
}

#[derive(Debug, Clone)]
pub enum Block {
    Section(SectionSpec),
    Table(TableSpec),
    Images(ImageSetSpec),
    PageBreak,
}

/// Everything that goes into one estimate or invoice, in drawing order.
#[derive(Debug, Clone, Default)]
pub struct DocumentSpec {
    pub header: Option<HeaderSpec>,
    pub blocks: Vec<Block>,
    pub metadata: DocumentInfo,
}

impl DocumentSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, title: impl Into<String>, subtitle: Option<String>) -> Self {
        self.header = Some(HeaderSpec {
            title: title.into(),
            subtitle,
        });
        self
    }

    pub fn with_metadata(mut self, metadata: DocumentInfo) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn section(mut self, title: impl Into<String>, content: impl Into<String>) -> Self {
        self.blocks.push(Block::Section(SectionSpec {
            title: title.into(),
            body: SectionBody::Text(content.into()),
        }));
        self
    }

    pub fn section_lines(mut self, title: impl Into<String>, lines: Vec<String>) -> Self {
        self.blocks.push(Block::Section(SectionSpec {
            title: title.into(),
            body: SectionBody::Lines(lines),
        }));
        self
    }

    pub fn table(
        mut self,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
        options: TableOptions,
    ) -> Self {
        self.blocks
            .push(Block::Table(TableSpec::new(headers, rows).with_options(options)));
        self
    }

    pub fn images(mut self, images: Vec<ImageRef>, options: ImageGridOptions) -> Self {
        self.blocks
            .push(Block::Images(ImageSetSpec { images, options }));
        self
    }

    pub fn page_break(mut self) -> Self {
        self.blocks.push(Block::PageBreak);
        self
    }

    /// Progress steps a run of this document reports: one for the header,
    /// each section, each table chunk and each image, plus finalization.
    /// Page breaks report nothing.
    pub fn planned_steps(&self, default_chunk_size: usize) -> usize {
        let header = usize::from(self.header.is_some());
        let blocks: usize = self
            .blocks
            .iter()
            .map(|block| match block {
                Block::Section(_) => 1,
                Block::Table(table) => table.planned_chunks(default_chunk_size),
                Block::Images(set) => set.images.len(),
                Block::PageBreak => 0,
            })
            .sum();
        header + blocks + 1
    }

    /// Checks every table and image grid before anything is drawn.
    pub fn validate(&self) -> Result<()> {
        for block in &self.blocks {
            match block {
                Block::Table(table) => {
                    table.validate()?;
                }
                Block::Images(set) => set.options.validate()?,
                Block::Section(_) | Block::PageBreak => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PdfError;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_planned_steps() {
        let rows: Vec<Vec<String>> = (0..250).map(|i| row(&[&format!("Item {i}"), "1"])).collect();
        let spec = DocumentSpec::new()
            .with_header("Estimate", None)
            .section("Client", "Jane Doe")
            .table(row(&["Item", "Qty"]), rows, TableOptions::default())
            .page_break()
            .images(vec![ImageRef::default(); 4], ImageGridOptions::default());

        // header + section + 3 chunks + 4 images + finalize
        assert_eq!(spec.planned_steps(100), 10);
        assert_eq!(spec.planned_steps(250), 8);
    }

    #[test]
    fn test_empty_document_plans_finalize_only() {
        assert_eq!(DocumentSpec::new().planned_steps(100), 1);
    }

    #[test]
    fn test_validate_catches_ragged_table() {
        let spec = DocumentSpec::new().table(
            row(&["Item", "Qty"]),
            vec![row(&["Mulch", "3"]), row(&["Edging"])],
            TableOptions::default(),
        );
        assert!(matches!(
            spec.validate(),
            Err(PdfError::InvalidTable {
                row: 1,
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn test_validate_catches_bad_grid() {
        let spec = DocumentSpec::new().images(
            vec![],
            ImageGridOptions::default().with_images_per_row(0),
        );
        assert!(spec.validate().is_err());
    }
}
