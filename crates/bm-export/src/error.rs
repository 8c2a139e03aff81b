//! Error types for booklet export.

use bm_core::PageId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("booklet export needs exactly {required} pages, the project has {actual}")]
    PageCount { required: usize, actual: usize },

    #[error("page `{0}` is not part of the project")]
    UnknownPage(PageId),

    #[error("failed to load image `{src}`: {reason}")]
    ImageLoad { src: String, reason: String },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("cannot rasterize a {width}x{height} page")]
    Raster { width: u32, height: u32 },

    #[error("invalid font: {0}")]
    Font(String),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("an export is already running")]
    Busy,
}

impl ExportError {
    pub(crate) fn image_load(src: &str, reason: impl ToString) -> Self {
        // data: URLs can be megabytes long.
        let src = if src.chars().count() > 64 {
            format!("{}…", src.chars().take(64).collect::<String>())
        } else {
            src.to_string()
        };
        ExportError::ImageLoad {
            src,
            reason: reason.to_string(),
        }
    }
}
