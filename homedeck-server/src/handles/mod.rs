mod auth_handle;
mod device_handle;
mod docs_handle;
mod home_handle;
mod log_handle;
mod room_handle;

pub use auth_handle::*;
pub use device_handle::*;
pub use docs_handle::*;
pub use home_handle::*;
pub use log_handle::*;
pub use room_handle::*;
