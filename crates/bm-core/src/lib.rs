pub mod error;
pub mod geometry;
pub mod id;
pub mod model;
pub mod parse;
pub mod project;

pub use error::CoreError;
pub use geometry::{bounding_box, clamp_into, margin_boundary};
pub use id::{PageId, WidgetId};
pub use model::*;
pub use parse::{parse_color, parse_dash};
pub use project::ProjectDocument;

// Re-export kurbo's rectangle so downstream crates don't need a direct dependency
pub use kurbo::Rect;
