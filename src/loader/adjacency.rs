use std::path::Path;

use crate::error::Result;
use crate::graph::DependencyGraph;
use crate::loader::traits::GraphLoader;

/// Plain-text adjacency lists, one package per line:
///
/// ```text
/// # comment
/// A: B, C
/// B: C
/// C:
/// ```
pub struct AdjacencyLoader;

impl AdjacencyLoader {
    pub fn parse(content: &str) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((package, deps)) = line.split_once(':') else {
                tracing::warn!(line = idx + 1, content = line, "skipping line without ':'");
                continue;
            };
            let package = package.trim();
            if package.is_empty() {
                tracing::warn!(line = idx + 1, "skipping line without a package name");
                continue;
            }
            graph.add_package(package);
            for dep in deps.split(',').map(str::trim).filter(|dep| !dep.is_empty()) {
                graph.add_edge(package, dep);
            }
        }
        graph
    }
}

impl GraphLoader for AdjacencyLoader {
    fn id(&self) -> &'static str {
        "adjacency"
    }

    fn file_patterns(&self) -> &'static [&'static str] {
        &["*.txt", "*.graph"]
    }

    fn load(&self, path: &Path, content: &str) -> Result<DependencyGraph> {
        let graph = Self::parse(content);
        tracing::info!(
            path = %path.display(),
            packages = graph.package_count(),
            edges = graph.edge_count(),
            "loaded adjacency graph"
        );
        Ok(graph)
    }
}
