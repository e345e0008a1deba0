pub mod route_guard;
pub mod runtime;

pub use crate::route_guard::{decide, RouteDecision, RouteGuard};
pub use crate::runtime::ClientRuntime;
