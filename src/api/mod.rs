pub mod cors;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use state::AppState;
