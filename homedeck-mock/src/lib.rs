pub mod registry;
pub mod settings;
pub mod simulate;
mod store;

pub use registry::SimulatedRegistry;
pub use settings::{Seed, SeedError, SimulationOptions};
