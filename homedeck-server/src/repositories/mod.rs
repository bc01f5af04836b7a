mod activity_log;
mod device;
mod home;
mod room;
mod user;

pub use activity_log::ActivityLogRepository;
pub use device::DeviceRepository;
pub use home::HomeRepository;
pub use room::RoomRepository;
pub use user::UserRepository;
