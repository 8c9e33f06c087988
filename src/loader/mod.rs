pub mod adjacency;
pub mod maven;
pub mod traits;

pub use adjacency::AdjacencyLoader;
pub use maven::{ManifestDependency, MavenLoader, MavenProject};
pub use traits::GraphLoader;
