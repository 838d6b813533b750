mod handlers;
mod state;
mod workspace;
pub mod dependency_graph;

pub use dependency_graph::DependencyGraph;
pub use state::ClarionBackend;
pub use workspace::{OpenDocument, Workspace};
