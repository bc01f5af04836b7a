mod auth_service;
mod permission_service;
mod token_service;

pub use auth_service::*;
pub use permission_service::*;
pub use token_service::*;
