pub mod compose;
pub mod dashboard;
pub mod poller;
pub mod remote;
pub mod settings;

pub use compose::{compose, ComposeError, HybridRegistry, Services};
pub use dashboard::{Dashboard, Notice};
pub use poller::{Poller, Snapshot};
pub use remote::RemoteRegistry;
pub use settings::{ClientSettings, RegistryMode};
