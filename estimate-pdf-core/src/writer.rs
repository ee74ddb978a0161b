use crate::document::Document;
use crate::error::Result;
use crate::objects::{Dictionary, Object, ObjectId, Stream};
use crate::page::Page;
use crate::text::{literal_string, Font};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Serializes a [`Document`] as a classic (non-incremental) PDF 1.7 file.
///
/// Object numbers are handed out sequentially: catalog, page tree, shared
/// font dictionaries, then each page with its content stream and images,
/// and finally the info dictionary.
pub struct PdfWriter<W: Write> {
    writer: W,
    xref_positions: HashMap<ObjectId, u64>,
    current_position: u64,
    next_id: u32,
}

impl<W: Write> PdfWriter<W> {
    pub fn new_with_writer(writer: W) -> Self {
        Self {
            writer,
            xref_positions: HashMap::new(),
            current_position: 0,
            next_id: 1,
        }
    }

    pub fn write_document(&mut self, document: &Document) -> Result<()> {
        self.write_header()?;

        let catalog_id = self.allocate();
        let pages_id = self.allocate();

        let mut catalog = Dictionary::typed("Catalog");
        catalog.set("Pages", pages_id);
        self.write_object(catalog_id, &Object::Dictionary(catalog))?;

        let fonts = self.write_fonts(document)?;

        let mut kids = Vec::with_capacity(document.pages.len());
        for page in &document.pages {
            let page_id = self.write_page(page, pages_id, &fonts, document.compress)?;
            kids.push(Object::Reference(page_id));
        }

        let mut pages = Dictionary::typed("Pages");
        pages.set("Count", document.pages.len());
        pages.set("Kids", kids);
        self.write_object(pages_id, &Object::Dictionary(pages))?;

        let info_id = self.write_info(document)?;

        let xref_position = self.current_position;
        self.write_xref()?;
        self.write_trailer(catalog_id, info_id, xref_position)?;
        self.writer.flush()?;
        Ok(())
    }

    fn allocate(&mut self) -> ObjectId {
        let id = ObjectId::new(self.next_id, 0);
        self.next_id += 1;
        id
    }

    fn write_header(&mut self) -> Result<()> {
        self.write_bytes(b"%PDF-1.7\n")?;
        self.write_bytes(&[b'%', 0xE2, 0xE3, 0xCF, 0xD3, b'\n'])
    }

    fn write_fonts(&mut self, document: &Document) -> Result<BTreeMap<Font, ObjectId>> {
        let mut fonts = BTreeMap::new();
        for font in document.fonts_in_use() {
            let id = self.allocate();
            let mut dict = Dictionary::typed("Font");
            dict.set("Subtype", Object::name("Type1"));
            dict.set("BaseFont", Object::name(font.pdf_name()));
            if !font.is_symbolic() {
                dict.set("Encoding", Object::name("WinAnsiEncoding"));
            }
            self.write_object(id, &Object::Dictionary(dict))?;
            fonts.insert(font, id);
        }
        Ok(fonts)
    }

    fn write_page(
        &mut self,
        page: &Page,
        parent_id: ObjectId,
        fonts: &BTreeMap<Font, ObjectId>,
        compress: bool,
    ) -> Result<ObjectId> {
        let page_id = self.allocate();
        let content_id = self.allocate();

        let mut resources = Dictionary::new();
        let font_dict: Dictionary = page
            .fonts_in_use()
            .iter()
            .filter_map(|font| {
                fonts
                    .get(font)
                    .map(|id| (font.pdf_name().to_string(), Object::Reference(*id)))
            })
            .collect();
        if !font_dict.is_empty() {
            resources.set("Font", font_dict);
        }

        if !page.images().is_empty() {
            let mut xobjects = Dictionary::new();
            for (name, image) in page.images() {
                let image_id = self.allocate();
                let stream = image.to_stream(compress)?;
                self.write_object(image_id, &Object::Stream(stream))?;
                xobjects.set(name.clone(), image_id);
            }
            resources.set("XObject", xobjects);
        }

        let mut page_dict = Dictionary::typed("Page");
        page_dict.set("Parent", parent_id);
        page_dict.set(
            "MediaBox",
            vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(page.width()),
                Object::Real(page.height()),
            ],
        );
        page_dict.set("Resources", resources);
        page_dict.set("Contents", content_id);
        self.write_object(page_id, &Object::Dictionary(page_dict))?;

        #[allow(unused_mut)]
        let mut content = Stream::new(page.generate_content());
        #[cfg(feature = "compression")]
        if compress {
            content.compress_flate()?;
        }
        self.write_object(content_id, &Object::Stream(content))?;

        Ok(page_id)
    }

    fn write_info(&mut self, document: &Document) -> Result<ObjectId> {
        let info_id = self.allocate();
        let metadata = &document.metadata;
        let mut info = Dictionary::new();

        let text_fields = [
            ("Title", &metadata.title),
            ("Author", &metadata.author),
            ("Subject", &metadata.subject),
            ("Keywords", &metadata.keywords),
            ("Creator", &metadata.creator),
            ("Producer", &metadata.producer),
        ];
        for (key, value) in text_fields {
            if let Some(value) = value {
                info.set(key, value.as_str());
            }
        }
        if let Some(date) = metadata.creation_date {
            info.set("CreationDate", format_pdf_date(date));
        }
        if let Some(date) = metadata.modification_date {
            info.set("ModDate", format_pdf_date(date));
        }

        self.write_object(info_id, &Object::Dictionary(info))?;
        Ok(info_id)
    }

    fn write_object(&mut self, id: ObjectId, object: &Object) -> Result<()> {
        self.xref_positions.insert(id, self.current_position);
        let header = format!("{} {} obj\n", id.number(), id.generation());
        self.write_bytes(header.as_bytes())?;
        self.write_object_value(object)?;
        self.write_bytes(b"\nendobj\n")
    }

    fn write_object_value(&mut self, object: &Object) -> Result<()> {
        match object {
            Object::Null => self.write_bytes(b"null"),
            Object::Boolean(b) => self.write_bytes(if *b { b"true" } else { b"false" }),
            Object::Integer(i) => self.write_bytes(i.to_string().as_bytes()),
            Object::Real(f) => self.write_bytes(format_real(*f).as_bytes()),
            Object::String(s) => self.write_bytes(literal_string(s).as_bytes()),
            Object::Name(n) => {
                self.write_bytes(b"/")?;
                self.write_bytes(n.as_bytes())
            }
            Object::Array(items) => {
                self.write_bytes(b"[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.write_bytes(b" ")?;
                    }
                    self.write_object_value(item)?;
                }
                self.write_bytes(b"]")
            }
            Object::Dictionary(dict) => self.write_dictionary(dict),
            Object::Stream(stream) => {
                self.write_dictionary(stream.dictionary())?;
                self.write_bytes(b"\nstream\n")?;
                self.write_bytes(stream.data())?;
                self.write_bytes(b"\nendstream")
            }
            Object::Reference(id) => self.write_bytes(id.to_string().as_bytes()),
        }
    }

    fn write_dictionary(&mut self, dict: &Dictionary) -> Result<()> {
        self.write_bytes(b"<<")?;
        for (key, value) in dict.iter() {
            self.write_bytes(b"\n/")?;
            self.write_bytes(key.as_bytes())?;
            self.write_bytes(b" ")?;
            self.write_object_value(value)?;
        }
        self.write_bytes(b"\n>>")
    }

    fn write_xref(&mut self) -> Result<()> {
        let size = self.next_id;
        self.write_bytes(format!("xref\n0 {size}\n").as_bytes())?;
        self.write_bytes(b"0000000000 65535 f \n")?;
        for number in 1..size {
            let entry = match self.xref_positions.get(&ObjectId::new(number, 0)) {
                Some(position) => format!("{position:010} 00000 n \n"),
                None => "0000000000 00000 f \n".to_string(),
            };
            self.write_bytes(entry.as_bytes())?;
        }
        Ok(())
    }

    fn write_trailer(
        &mut self,
        catalog_id: ObjectId,
        info_id: ObjectId,
        xref_position: u64,
    ) -> Result<()> {
        let mut trailer = Dictionary::new();
        trailer.set("Size", self.next_id);
        trailer.set("Root", catalog_id);
        trailer.set("Info", info_id);

        self.write_bytes(b"trailer\n")?;
        self.write_dictionary(&trailer)?;
        self.write_bytes(format!("\nstartxref\n{xref_position}\n%%EOF\n").as_bytes())
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.current_position += data.len() as u64;
        Ok(())
    }
}

impl PdfWriter<BufWriter<std::fs::File>> {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new_with_writer(BufWriter::new(file)))
    }
}

fn format_real(value: f64) -> String {
    let formatted = format!("{value:.4}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "" | "-" | "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

/// `D:YYYYMMDDHHmmSS+00'00`
pub(crate) fn format_pdf_date(date: DateTime<Utc>) -> String {
    format!("{}+00'00", date.format("D:%Y%m%d%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn render(document: &Document) -> Vec<u8> {
        let mut buffer = Vec::new();
        document.write(&mut buffer).unwrap();
        buffer
    }

    fn plain_document() -> Document {
        let mut doc = Document::new();
        doc.set_compress(false);
        doc
    }

    #[test]
    fn test_format_real() {
        assert_eq!(format_real(595.0), "595");
        assert_eq!(format_real(841.8898), "841.8898");
        assert_eq!(format_real(0.5), "0.5");
        assert_eq!(format_real(-0.0), "0");
    }

    #[test]
    fn test_format_pdf_date() {
        let date = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        assert_eq!(format_pdf_date(date), "D:20240309140500+00'00");
    }

    #[test]
    fn test_header_and_trailer() {
        let mut doc = plain_document();
        doc.add_page(Page::a4());
        let bytes = render(&doc);

        assert!(bytes.starts_with(b"%PDF-1.7\n%"));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Type /Catalog"));
        assert!(text.contains("/Count 1"));
        assert!(text.contains("trailer\n<<"));
        assert!(text.ends_with("%%EOF\n"));
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack
            .windows(needle.len())
            .rposition(|window| window == needle)
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let mut doc = plain_document();
        let mut page = Page::a4();
        page.text().write("Lawn care");
        doc.add_page(page);
        let bytes = render(&doc);

        let startxref = find(&bytes, b"startxref\n").unwrap();
        let tail = std::str::from_utf8(&bytes[startxref + 10..]).unwrap();
        let offset: usize = tail.lines().next().unwrap().parse().unwrap();
        assert!(bytes[offset..].starts_with(b"xref\n0 "));

        let table = std::str::from_utf8(&bytes[offset..startxref]).unwrap();
        // object 1 follows the free-list head
        let first_entry = table.lines().nth(3).unwrap();
        let position: usize = first_entry[..10].parse().unwrap();
        assert!(bytes[position..].starts_with(b"1 0 obj"));
    }

    #[test]
    fn test_fonts_written_once_with_encoding() {
        let mut doc = plain_document();
        for _ in 0..3 {
            let mut page = Page::a4();
            page.text().set_font(Font::Helvetica, 10.0).write("x");
            doc.add_page(page);
        }
        let text = String::from_utf8_lossy(&render(&doc)).to_string();
        assert_eq!(text.matches("/BaseFont /Helvetica\n").count(), 1);
        assert!(text.contains("/Encoding /WinAnsiEncoding"));
        assert_eq!(text.matches("/Type /Page\n").count(), 3);
    }

    #[test]
    fn test_uncompressed_content_is_readable() {
        let mut doc = plain_document();
        let mut page = Page::a4();
        page.text().at(10.0, 20.0).write("Mulch (bark)");
        doc.add_page(page);
        let text = String::from_utf8_lossy(&render(&doc)).to_string();
        assert!(text.contains("(Mulch \\(bark\\)) Tj"));
    }

    #[cfg(feature = "compression")]
    #[test]
    fn test_compressed_content_uses_flate() {
        use std::io::Read;

        let mut doc = Document::new();
        doc.set_compress(true);
        let mut page = Page::a4();
        page.text().write("compressed");
        doc.add_page(page);
        let bytes = render(&doc);
        let text = String::from_utf8_lossy(&bytes).to_string();
        let filter = text.find("/Filter /FlateDecode").unwrap();

        let find = |needle: &[u8], from: usize| {
            bytes[from..]
                .windows(needle.len())
                .position(|w| w == needle)
                .map(|i| i + from)
                .unwrap()
        };
        let start = find(b"\nstream\n", filter) + b"\nstream\n".len();
        let end = find(b"\nendstream", start);

        let mut decoded = String::new();
        flate2::read::ZlibDecoder::new(&bytes[start..end])
            .read_to_string(&mut decoded)
            .unwrap();
        assert!(decoded.contains("(compressed) Tj"));
    }

    #[test]
    fn test_info_dictionary() {
        let mut doc = plain_document();
        doc.set_title("Quote (Smith)");
        doc.set_author("Greenline");
        doc.set_creation_date(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
        doc.add_page(Page::a4());
        let text = String::from_utf8_lossy(&render(&doc)).to_string();
        assert!(text.contains("/Title (Quote \\(Smith\\))"));
        assert!(text.contains("/Author (Greenline)"));
        assert!(text.contains("/CreationDate (D:20240102030405+00'00)"));
    }

    #[test]
    fn test_images_become_xobjects() {
        let jpeg = [
            0xFF, 0xD8, 0xFF, 0xC0, 0x00, 0x11, 0x08, 0x00, 0x10, 0x00, 0x10, 0x03,
        ];
        let mut doc = plain_document();
        let mut page = Page::a4();
        let name = page.add_image(crate::graphics::Image::from_bytes(&jpeg).unwrap());
        page.draw_image(&name, 0.0, 0.0, 16.0, 16.0).unwrap();
        doc.add_page(page);

        let text = String::from_utf8_lossy(&render(&doc)).to_string();
        assert!(text.contains("/Subtype /Image"));
        assert!(text.contains("/XObject <<\n/Im1 "));
        assert!(text.contains("/Im1 Do"));
    }
}
