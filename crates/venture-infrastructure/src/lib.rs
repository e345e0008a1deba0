pub mod paths;
pub mod storage;
pub mod ui_state_service;

pub use crate::storage::AtomicTomlFile;
pub use crate::ui_state_service::UiStateService;
