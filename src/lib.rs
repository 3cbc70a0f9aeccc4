#![warn(clippy::all, rust_2018_idioms)]

pub mod command;
pub mod compositor;
pub mod config;
pub mod error;
pub mod event;
pub mod export;
pub mod filter;
pub mod layer;
pub mod raster;
pub mod session;
pub mod state;
pub mod stroke;
pub mod texture_manager;
pub mod tool;
pub mod worker;

pub use command::{HistoryEntry, HistoryStack};
pub use compositor::Viewport;
pub use config::EditorConfig;
pub use error::{ConfigError, EditorError, EditorResult};
pub use event::{EventBus, EventHandler, SessionEvent};
pub use filter::FilterState;
pub use layer::AnnotationLayer;
pub use raster::{Raster, SourceImage};
pub use session::EditorSession;
pub use state::EditorState;
pub use stroke::{MutableStroke, Stroke};
pub use texture_manager::TextureManager;
pub use tool::{DrawingTool, Tool, ToolSettings};
