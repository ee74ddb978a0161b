//! Image XObjects.
//!
//! JPEG data is embedded as-is under `DCTDecode`. With the
//! `external-images` feature, any other format the `image` crate can read
//! (PNG in practice) is decoded to 8-bit RGB and embedded raw, Flate
//! compressed when compression is enabled.

use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, Object, Stream};

#[derive(Debug, Clone)]
pub struct Image {
    data: Vec<u8>,
    format: ImageFormat,
    width: u32,
    height: u32,
    color_space: ColorSpace,
    bits_per_component: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    /// Uncompressed samples, row by row.
    Raw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    DeviceGray,
    DeviceRGB,
    DeviceCMYK,
}

impl ColorSpace {
    fn pdf_name(&self) -> &'static str {
        match self {
            ColorSpace::DeviceGray => "DeviceGray",
            ColorSpace::DeviceRGB => "DeviceRGB",
            ColorSpace::DeviceCMYK => "DeviceCMYK",
        }
    }
}

impl Image {
    /// Sniffs the payload and builds an image from it.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(PdfError::InvalidImage("empty image data".to_string()));
        }
        if data.starts_with(&[0xFF, 0xD8]) {
            return Self::from_jpeg_data(data.to_vec());
        }
        Self::decode_other(data)
    }

    pub fn from_jpeg_data(data: Vec<u8>) -> Result<Self> {
        let (width, height, color_space, bits_per_component) = parse_jpeg_header(&data)?;
        Ok(Image {
            data,
            format: ImageFormat::Jpeg,
            width,
            height,
            color_space,
            bits_per_component,
        })
    }

    #[cfg(feature = "external-images")]
    fn decode_other(data: &[u8]) -> Result<Self> {
        let decoded =
            ::image::load_from_memory(data).map_err(|e| PdfError::InvalidImage(e.to_string()))?;
        let rgb = decoded.to_rgb8();
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(PdfError::InvalidImage("image has no pixels".to_string()));
        }
        Ok(Image {
            data: rgb.into_raw(),
            format: ImageFormat::Raw,
            width,
            height,
            color_space: ColorSpace::DeviceRGB,
            bits_per_component: 8,
        })
    }

    #[cfg(not(feature = "external-images"))]
    fn decode_other(_data: &[u8]) -> Result<Self> {
        Err(PdfError::InvalidImage(
            "unsupported image format (only JPEG without the external-images feature)"
                .to_string(),
        ))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Height over width, used to derive a missing display dimension.
    pub fn aspect_ratio(&self) -> f64 {
        self.height as f64 / self.width as f64
    }

    /// Builds the image XObject stream.
    pub fn to_stream(&self, compress: bool) -> Result<Stream> {
        let mut dict = Dictionary::typed("XObject");
        dict.set("Subtype", Object::name("Image"));
        dict.set("Width", self.width);
        dict.set("Height", self.height);
        dict.set("ColorSpace", Object::name(self.color_space.pdf_name()));
        dict.set("BitsPerComponent", self.bits_per_component as i64);
        if self.format == ImageFormat::Jpeg {
            dict.set("Filter", Object::name("DCTDecode"));
        }

        #[allow(unused_mut)]
        let mut stream = Stream::with_dictionary(dict, self.data.clone());

        #[cfg(feature = "compression")]
        if compress {
            stream.compress_flate()?;
        }
        #[cfg(not(feature = "compression"))]
        let _ = compress;

        Ok(stream)
    }
}

fn read_u16(data: &[u8], pos: usize) -> Option<u16> {
    Some(((*data.get(pos)? as u16) << 8) | *data.get(pos + 1)? as u16)
}

fn parse_jpeg_header(data: &[u8]) -> Result<(u32, u32, ColorSpace, u8)> {
    let truncated = || PdfError::InvalidImage("truncated JPEG data".to_string());

    if data.len() < 4 || data[0] != 0xFF || data[1] != 0xD8 {
        return Err(PdfError::InvalidImage("not a JPEG file".to_string()));
    }

    let mut pos = 2;
    loop {
        if pos + 1 >= data.len() {
            return Err(truncated());
        }
        if data[pos] != 0xFF {
            return Err(PdfError::InvalidImage("invalid JPEG marker".to_string()));
        }
        let marker = data[pos + 1];
        pos += 2;

        match marker {
            0xFF => pos -= 1, // fill byte
            0xD8 | 0xD0..=0xD7 | 0x01 => {}
            0xD9 => {
                return Err(PdfError::InvalidImage(
                    "JPEG ended before a frame header".to_string(),
                ))
            }
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                // length(2) precision(1) height(2) width(2) components(1)
                let precision = *data.get(pos + 2).ok_or_else(truncated)?;
                let height = read_u16(data, pos + 3).ok_or_else(truncated)? as u32;
                let width = read_u16(data, pos + 5).ok_or_else(truncated)? as u32;
                let components = *data.get(pos + 7).ok_or_else(truncated)?;

                if width == 0 || height == 0 {
                    return Err(PdfError::InvalidImage(
                        "JPEG frame has zero dimensions".to_string(),
                    ));
                }
                let color_space = match components {
                    1 => ColorSpace::DeviceGray,
                    3 => ColorSpace::DeviceRGB,
                    4 => ColorSpace::DeviceCMYK,
                    n => {
                        return Err(PdfError::InvalidImage(format!(
                            "unsupported JPEG component count: {n}"
                        )))
                    }
                };
                return Ok((width, height, color_space, precision));
            }
            _ => {
                let length = read_u16(data, pos).ok_or_else(truncated)? as usize;
                if length < 2 {
                    return Err(PdfError::InvalidImage("invalid JPEG segment".to_string()));
                }
                pos += length;
            }
        }
    }
}
