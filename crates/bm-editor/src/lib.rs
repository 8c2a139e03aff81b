pub mod canvas;
pub mod config;
pub mod document;
pub mod error;
pub mod history;
pub mod inspector;
pub mod session;
pub mod shortcuts;
pub mod sync;
pub mod upload;
pub mod view;

pub use canvas::{CanvasBackend, CanvasEvent, CanvasObject, HeadlessCanvas, ObjectRole};
pub use config::EditorConfig;
pub use document::{Document, StylePatch, WidgetPatch, ZOrder};
pub use error::EditorError;
pub use history::{HistoryStore, Snapshot};
pub use session::EditorSession;
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use sync::CanvasSync;
pub use upload::validate_image;
pub use view::ViewState;
