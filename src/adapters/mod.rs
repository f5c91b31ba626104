// Adapters layer: concrete implementations of the domain ports for the local machine.

pub mod fs;
pub mod process;

pub use fs::LocalWorkspace;
pub use process::SystemExecutor;
