use crate::error::Result;
use crate::page::Page;
use crate::text::Font;
use crate::writer::PdfWriter;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// An in-memory PDF document: ordered pages plus info-dictionary metadata.
pub struct Document {
    pub(crate) pages: Vec<Page>,
    pub(crate) metadata: DocumentMetadata,
    pub(crate) compress: bool,
}

#[derive(Debug, Clone)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub modification_date: Option<DateTime<Utc>>,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            title: None,
            author: None,
            subject: None,
            keywords: None,
            creator: Some("estimate-pdf".to_string()),
            producer: Some(format!("estimate-pdf v{}", crate::VERSION)),
            creation_date: Some(now),
            modification_date: Some(now),
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            pages: Vec::new(),
            metadata: DocumentMetadata::default(),
            compress: cfg!(feature = "compression"),
        }
    }

    pub fn add_page(&mut self, page: Page) {
        self.pages.push(page);
    }

    pub fn page_mut(&mut self, index: usize) -> Option<&mut Page> {
        self.pages.get_mut(index)
    }

    pub fn pages_mut(&mut self) -> impl Iterator<Item = &mut Page> {
        self.pages.iter_mut()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.metadata.title = Some(title.into());
    }

    pub fn set_author(&mut self, author: impl Into<String>) {
        self.metadata.author = Some(author.into());
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) {
        self.metadata.subject = Some(subject.into());
    }

    pub fn set_keywords(&mut self, keywords: impl Into<String>) {
        self.metadata.keywords = Some(keywords.into());
    }

    pub fn set_creation_date(&mut self, date: DateTime<Utc>) {
        self.metadata.creation_date = Some(date);
        self.metadata.modification_date = Some(date);
    }

    /// Enables Flate compression of page content streams. Ignored when the
    /// crate is built without the `compression` feature.
    pub fn set_compress(&mut self, compress: bool) {
        self.compress = compress && cfg!(feature = "compression");
    }

    pub fn compress(&self) -> bool {
        self.compress
    }

    /// Every font painted on any page, in a stable order.
    pub fn fonts_in_use(&self) -> BTreeSet<Font> {
        self.pages
            .iter()
            .flat_map(|page| page.fonts_in_use().iter().copied())
            .collect()
    }

    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let mut writer = PdfWriter::new(path)?;
        writer.write_document(self)
    }

    pub fn write(&self, buffer: &mut Vec<u8>) -> Result<()> {
        let mut writer = PdfWriter::new_with_writer(buffer);
        writer.write_document(self)
    }
}
