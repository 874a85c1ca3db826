pub mod config;
pub mod editor;
pub mod error;
pub mod history;
pub mod placement;
pub mod selection;
pub mod shortcuts;

pub use config::{BlockDefaults, EditorConfig};
pub use editor::{ChangeKind, Editor, ExportSnapshot, SubscriberId};
pub use error::{ConfigError, EditorError, EditorResult};
pub use history::{History, Snapshot};
pub use placement::PlacementIntent;
pub use selection::{Clipboard, Selection};
pub use shortcuts::{Restack, ShortcutAction, ShortcutMap};
