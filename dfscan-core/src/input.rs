//! Decoded image input
//!
//! The loader is the boundary between a file on disk and the analyzers: it
//! enforces the extension whitelist and size ceiling, decodes pixels, derives
//! luminance, and pulls EXIF fields out of the raw bytes. Everything
//! downstream works on a shared, read-only [`DecodedImage`].

use crate::config::AnalysisSettings;
use crate::error::ImageLoadError;
use image::{GrayImage, Luma, RgbImage};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::debug;

/// EXIF fields of the primary image, by tag name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExifMetadata {
    fields: BTreeMap<String, String>,
    error: Option<String>,
}

impl ExifMetadata {
    /// Metadata from an explicit field map
    pub fn from_fields<K, V, I>(fields: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            error: None,
        }
    }

    /// Metadata whose EXIF block was present but unreadable
    pub fn unreadable(error: impl Into<String>) -> Self {
        Self {
            fields: BTreeMap::new(),
            error: Some(error.into()),
        }
    }

    /// Read EXIF from an encoded image; absent EXIF yields empty metadata
    pub fn read_from_bytes(bytes: &[u8]) -> Self {
        let mut cursor = Cursor::new(bytes);
        match exif::Reader::new().read_from_container(&mut cursor) {
            Ok(parsed) => {
                let fields = parsed
                    .fields()
                    .filter(|f| f.ifd_num == exif::In::PRIMARY)
                    .map(|f| {
                        let value = f.display_value().to_string();
                        (f.tag.to_string(), value.trim_matches('"').to_string())
                    })
                    .collect();
                Self {
                    fields,
                    error: None,
                }
            }
            Err(exif::Error::NotFound(_)) => Self::default(),
            Err(e) => Self::unreadable(e.to_string()),
        }
    }

    pub fn get(&self, tag: &str) -> Option<&str> {
        self.fields.get(tag).map(String::as_str)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.fields.contains_key(tag)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Read error, when the EXIF block was corrupt
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// A decoded RGB image with its luminance plane and metadata
#[derive(Debug, Clone)]
pub struct DecodedImage {
    source: Option<PathBuf>,
    rgb: RgbImage,
    luma: GrayImage,
    exif: ExifMetadata,
}

impl DecodedImage {
    /// Wrap in-memory pixels (no metadata)
    pub fn from_rgb(rgb: RgbImage) -> Self {
        Self::with_metadata(rgb, ExifMetadata::default())
    }

    /// Wrap in-memory pixels with explicit metadata
    pub fn with_metadata(rgb: RgbImage, exif: ExifMetadata) -> Self {
        let luma = luminance(&rgb);
        Self {
            source: None,
            rgb,
            luma,
            exif,
        }
    }

    /// Decode an encoded PNG/JPEG buffer
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ImageLoadError> {
        let rgb = image::load_from_memory(bytes)?.to_rgb8();
        let exif = ExifMetadata::read_from_bytes(bytes);
        Ok(Self::with_metadata(rgb, exif))
    }

    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    /// 8-bit luminance (ITU-R BT.601 weights)
    pub fn luma(&self) -> &GrayImage {
        &self.luma
    }

    pub fn exif(&self) -> &ExifMetadata {
        &self.exif
    }

    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    pub fn height(&self) -> u32 {
        self.rgb.height()
    }

    pub fn pixel_count(&self) -> usize {
        self.rgb.width() as usize * self.rgb.height() as usize
    }
}

fn luminance(rgb: &RgbImage) -> GrayImage {
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let y = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
        Luma([y.round().clamp(0.0, 255.0) as u8])
    })
}

/// Loads image files under the configured limits
#[derive(Debug, Clone)]
pub struct ImageLoader {
    max_bytes: u64,
    allowed_extensions: Vec<String>,
}

impl ImageLoader {
    pub fn new(settings: &AnalysisSettings) -> Self {
        Self {
            max_bytes: settings.max_image_bytes,
            allowed_extensions: settings
                .allowed_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    /// Check the file extension against the whitelist
    pub fn check_extension(&self, path: &Path) -> Result<(), ImageLoadError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        if self.allowed_extensions.iter().any(|allowed| *allowed == extension) {
            Ok(())
        } else {
            Err(ImageLoadError::UnsupportedExtension {
                extension,
                allowed: self.allowed_extensions.join(", "),
            })
        }
    }

    /// Read, validate, and decode an image file
    pub fn load(&self, path: &Path) -> Result<DecodedImage, ImageLoadError> {
        self.check_extension(path)?;

        let io_err = |source| ImageLoadError::Io {
            path: path.to_path_buf(),
            source,
        };
        let size = std::fs::metadata(path).map_err(io_err)?.len();
        if size > self.max_bytes {
            return Err(ImageLoadError::TooLarge {
                size,
                max: self.max_bytes,
            });
        }

        let bytes = std::fs::read(path).map_err(io_err)?;
        let image = DecodedImage::from_bytes(&bytes)?.with_source(path);

        debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            exif_fields = image.exif().len(),
            "Image decoded"
        );

        Ok(image)
    }
}
