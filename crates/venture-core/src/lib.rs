pub mod config;
pub mod error;
pub mod mode;
pub mod project;
pub mod ui_state;

// Re-export common error type
pub use error::{CoreError, Result};
pub use mode::{adaptive_mode, detect_mode, UiMode};
pub use project::{Phase, ProjectSnapshot};
pub use ui_state::{Panel, UiPreferences};
