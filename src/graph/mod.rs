use std::collections::BTreeMap;

use crate::core::PackageId;

pub mod builder;
pub mod order;
pub mod traverse;
pub mod viz;

/// Directed "depends-on" relation: `from` depends on `to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub from: PackageId,
    pub to: PackageId,
}

impl Edge {
    pub fn new(from: impl Into<PackageId>, to: impl Into<PackageId>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Adjacency store: package -> dependencies in insertion order.
///
/// Built once by a loader and only read afterwards. A package that is only
/// ever referenced as a dependency has no key and behaves as a leaf.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    pub edges: BTreeMap<PackageId, Vec<PackageId>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `to` to the dependency list of `from`, creating the key if
    /// needed. Duplicate edges are kept.
    pub fn add_edge(&mut self, from: impl Into<PackageId>, to: impl Into<PackageId>) {
        self.edges.entry(from.into()).or_default().push(to.into());
    }

    /// Registers `package` as a key without adding any dependency.
    pub fn add_package(&mut self, package: impl Into<PackageId>) {
        self.edges.entry(package.into()).or_default();
    }

    /// Dependencies of `package`; empty for packages that are not keys.
    pub fn neighbors(&self, package: &str) -> &[PackageId] {
        self.edges.get(package).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, package: &str) -> bool {
        self.edges.contains_key(package)
    }

    pub fn packages(&self) -> impl Iterator<Item = &PackageId> {
        self.edges.keys()
    }

    pub fn package_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

impl Extend<Edge> for DependencyGraph {
    fn extend<I: IntoIterator<Item = Edge>>(&mut self, iter: I) {
        for edge in iter {
            self.add_edge(edge.from, edge.to);
        }
    }
}

impl FromIterator<Edge> for DependencyGraph {
    fn from_iter<I: IntoIterator<Item = Edge>>(iter: I) -> Self {
        let mut graph = Self::new();
        graph.extend(iter);
        graph
    }
}

#[cfg(test)]
pub(crate) fn graph_from(adjacency: &[(&str, &[&str])]) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for (package, deps) in adjacency {
        graph.add_package(*package);
        for dep in *deps {
            graph.add_edge(*package, *dep);
        }
    }
    graph
}

#[cfg(test)]
mod tests {
    use crate::core::PackageId;
    use crate::graph::{DependencyGraph, Edge};

    #[test]
    fn add_edge_preserves_insertion_order_and_duplicates() {
        let mut graph = DependencyGraph::new();
        graph.add_edge("app", "lib");
        graph.add_edge("app", "core");
        graph.add_edge("app", "lib");

        let deps: Vec<&str> = graph.neighbors("app").iter().map(PackageId::as_str).collect();
        assert_eq!(deps, vec!["lib", "core", "lib"]);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn dependency_only_packages_are_implicit_leaves() {
        let graph: DependencyGraph = vec![Edge::new("app", "core")].into_iter().collect();

        assert!(graph.contains("app"));
        assert!(!graph.contains("core"));
        assert!(graph.neighbors("core").is_empty());
        assert!(graph.neighbors("missing").is_empty());
        assert_eq!(graph.package_count(), 1);
    }

    #[test]
    fn add_package_registers_key_without_edges() {
        let mut graph = DependencyGraph::new();
        assert!(graph.is_empty());
        graph.add_package("standalone");
        graph.add_package("standalone");

        assert!(graph.contains("standalone"));
        assert!(!graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.package_count(), 1);
    }
}
