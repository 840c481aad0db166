use std::io;
use std::path::Path;

use image::{ImageFormat, ImageReader};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

impl ImageInfo {
    /// File extension used for the embedded media part.
    pub fn media_extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("bin")
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("unrecognised image format")]
    UnknownFormat,
    #[error("decode error: {0}")]
    Decode(#[from] image::ImageError),
}

/// Reads native pixel dimensions without decoding the whole image.
pub trait ImageProbe: Send + Sync {
    fn probe(&self, path: &Path) -> Result<ImageInfo, ProbeError>;
}

/// Probe backed by the `image` crate; the format is sniffed from content,
/// not trusted from the file extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct DecoderProbe;

impl ImageProbe for DecoderProbe {
    fn probe(&self, path: &Path) -> Result<ImageInfo, ProbeError> {
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let format = reader.format().ok_or(ProbeError::UnknownFormat)?;
        let (width, height) = reader.into_dimensions()?;
        Ok(ImageInfo {
            width,
            height,
            format,
        })
    }
}
