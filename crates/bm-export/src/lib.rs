pub mod config;
pub mod error;
mod paint;
pub mod pdf;
pub mod pipeline;
#[cfg(feature = "runtime")]
pub mod preview;
pub mod raster;
pub mod roles;
pub mod sheet;

pub use config::ExportConfig;
pub use error::ExportError;
pub use pdf::{PDF_FILE_NAME, compose_booklet};
pub use pipeline::{BookletExporter, BookletPreview};
#[cfg(feature = "runtime")]
pub use preview::{PreviewScheduler, PreviewUpdate};
#[cfg(feature = "runtime")]
pub use raster::FileLoader;
pub use raster::{DataUrlLoader, ImageLoader, PageRasterizer, RenderedPage, SoftwareRasterizer};
pub use roles::{BOOKLET_PAGES, BookletRole, RoleAssignment, RoleMap};
pub use sheet::{SHEETS, Sheet, SheetPreview};
