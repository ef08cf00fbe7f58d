pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod mail;
pub mod middleware;
pub mod router;
pub mod store;
pub mod uploads;
pub mod validation;

pub use error::{FieldError, FolioError};
pub use router::AppState;
