mod activity;
mod auth;
mod control;
mod device;
mod error;
mod home;
mod room;

pub use activity::*;
pub use auth::*;
pub use control::*;
pub use device::*;
pub use error::*;
pub use home::*;
pub use room::*;

pub type Id = i32;
