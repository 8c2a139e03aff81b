//! Error types for the editor

use bm_core::{PageId, WidgetId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("a document must keep at least one page")]
    LastPage,

    #[error("unknown page {0}")]
    UnknownPage(PageId),

    #[error("unknown widget {0}")]
    UnknownWidget(WidgetId),

    #[error("no widget is selected")]
    NoSelection,

    #[error("unsupported image type{}", .0.as_deref().map(|m| format!(" `{m}`")).unwrap_or_default())]
    UnsupportedImageType(Option<String>),

    #[error("image is {size} bytes; the limit is {limit} bytes")]
    ImageTooLarge { size: usize, limit: usize },

    #[error("invalid value for `{key}`: {reason}")]
    InvalidProp { key: String, reason: String },

    #[error(transparent)]
    Core(#[from] bm_core::CoreError),
}
