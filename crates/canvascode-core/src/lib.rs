//! CanvasCode Core Library
//!
//! Platform-agnostic scene graph and direct-manipulation engine for the
//! CanvasCode infinite-canvas editor.

pub mod ai;
pub mod camera;
pub mod clipboard;
pub mod engine;
pub mod handles;
pub mod history;
pub mod hit;
pub mod input;
pub mod object;
pub mod scene;
pub mod shortcuts;
pub mod snap;

pub use ai::{AnalysisError, AnalysisMode, AnalysisProvider, AnalysisResult, BoxFuture, ChatProvider};
pub use camera::{MAX_SCALE, MIN_SCALE, SCALE_STEP, Viewport};
pub use clipboard::{ClipboardError, PASTE_OFFSET, PROTOCOL_PREFIX, PastePayload, PastedImage};
pub use engine::Editor;
pub use handles::Handle;
pub use history::{HISTORY_CAP, History, Snapshot};
pub use hit::Selection;
pub use object::{CanvasObject, ImageState, ObjectDraft, ObjectId, ObjectKind};
pub use scene::SceneStore;
pub use snap::{SNAP_THRESHOLD, SnapGuides, SnapResult, snap_center};
