//! HTTP surface for sepsis severity and early-warning scoring

pub mod config;
pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::{Cli, ServerConfig};
pub use error::ApiError;
pub use extract::ApiJson;
pub use routes::create_router;
pub use state::AppState;
