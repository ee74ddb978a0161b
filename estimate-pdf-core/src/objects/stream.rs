#[cfg(feature = "compression")]
use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, Object};

/// A stream object: dictionary plus raw (possibly filtered) bytes.
///
/// `/Length` is kept in sync with the data on every mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    dictionary: Dictionary,
    data: Vec<u8>,
}

impl Stream {
    pub fn new(data: Vec<u8>) -> Self {
        Self::with_dictionary(Dictionary::new(), data)
    }

    pub fn with_dictionary(mut dictionary: Dictionary, data: Vec<u8>) -> Self {
        dictionary.set("Length", data.len());
        Self { dictionary, data }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_filtered(&self) -> bool {
        self.dictionary.contains_key("Filter")
    }

    /// Deflates the payload and records `/Filter /FlateDecode`.
    ///
    /// Streams that already carry a filter (for example JPEG data under
    /// `DCTDecode`) are left untouched.
    #[cfg(feature = "compression")]
    pub fn compress_flate(&mut self) -> Result<()> {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use std::io::Write;

        if self.is_filtered() {
            return Ok(());
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&self.data)
            .map_err(|e| PdfError::CompressionError(e.to_string()))?;
        self.data = encoder
            .finish()
            .map_err(|e| PdfError::CompressionError(e.to_string()))?;

        self.dictionary.set("Length", self.data.len());
        self.dictionary.set("Filter", Object::name("FlateDecode"));
        Ok(())
    }
}
