pub mod models;
pub mod registry;
pub mod token;

pub use registry::{Error, Registry, Result, Session};
pub use token::TokenStore;
