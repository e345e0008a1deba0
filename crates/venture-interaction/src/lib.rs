pub mod client;
pub mod identity;
pub mod session_manager;

pub use crate::client::{ApiBody, ApiError, ResilientClient, DEFAULT_REQUEST_TIMEOUT};
pub use crate::identity::{
    IdentityBackend, IdentityError, InertIdentityBackend, Session, SessionChange, UserIdentity,
};
pub use crate::session_manager::{AuthSnapshot, SessionManager, TokenProvider};
