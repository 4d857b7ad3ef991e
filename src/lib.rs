mod config;
mod error;
mod password;
mod repository;
mod routes;
mod service;
mod token;
mod types;
pub mod validation;

pub use self::config::*;
pub use error::*;
pub use password::*;
pub use repository::*;
pub use routes::*;
pub use service::*;
pub use token::*;
pub use types::*;
