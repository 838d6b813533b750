pub mod backend;
pub mod features;

pub use backend::{ClarionBackend, Workspace};
