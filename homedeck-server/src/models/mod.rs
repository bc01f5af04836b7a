mod activity_log;
mod device;
mod home;
mod room;
mod user;

pub use activity_log::{ActivityLogEntry, ActivityLogTable};
pub use device::{Device, DeviceTable};
pub use home::{Home, HomeTable};
pub use room::{Room, RoomTable};
pub use user::{User, UserTable};

pub trait Table {
    /// The name of the table
    fn name(&self) -> &'static str;

    /// The SQL statement to create the table
    fn create(&self) -> String;

    /// The SQL statement to dispose the table
    fn dispose(&self) -> String;

    /// The dependencies of the table
    fn dependencies(&self) -> Vec<&'static str>;
}
