mod error;
mod handlers;
mod routes;
mod types;

pub use error::ApiError;
pub use routes::{app_router, AppState};
pub use types::*;
