//! Control-plane HTTP facade.
//!
//! The thin surface a UI or CLI drives: discovery, pairing, status,
//! resource grants, sandbox launch. All state lives in the components
//! behind [`AppState`]; handlers only translate between HTTP and the core.

mod error;
mod handlers;
mod routes;
mod state;

pub use error::{ApiError, ErrorResponse};
pub use routes::create_router;
pub use state::AppState;
