use std::collections::{HashSet, VecDeque};

use serde::Serialize;

use crate::core::PackageId;
use crate::graph::DependencyGraph;

#[derive(Debug, Clone, Default)]
pub struct TraversalLimits {
    /// `None` walks without a depth bound.
    pub max_depth: Option<usize>,
    /// Packages whose name contains this substring are skipped along with
    /// everything only reachable through them. Empty disables filtering.
    pub filter: String,
}

impl TraversalLimits {
    pub fn new(max_depth: Option<usize>, filter: impl Into<String>) -> Self {
        Self {
            max_depth,
            filter: filter.into(),
        }
    }

    fn excludes(&self, package: &PackageId) -> bool {
        !self.filter.is_empty() && package.as_str().contains(self.filter.as_str())
    }

    fn expands(&self, depth: usize) -> bool {
        self.max_depth.map_or(true, |max| depth < max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Visit {
    pub package: PackageId,
    pub depth: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Traversal {
    /// Packages in discovery order, each at the depth it was first dequeued.
    pub visits: Vec<Visit>,
    /// Number of dequeues discarded by the filter, repeats included.
    pub skipped: usize,
}

struct BfsContext<'a> {
    graph: &'a DependencyGraph,
    limits: &'a TraversalLimits,
    queue: VecDeque<(PackageId, usize)>,
    visited: HashSet<PackageId>,
    out: Traversal,
}

impl<'a> BfsContext<'a> {
    fn new(graph: &'a DependencyGraph, limits: &'a TraversalLimits) -> Self {
        Self {
            graph,
            limits,
            queue: VecDeque::new(),
            visited: HashSet::new(),
            out: Traversal::default(),
        }
    }

    fn run(mut self, start: &PackageId) -> Traversal {
        self.queue.push_back((start.clone(), 0));
        while let Some((package, depth)) = self.queue.pop_front() {
            if self.visited.contains(&package) {
                continue;
            }
            // Filtered packages stay unvisited, so another path may dequeue
            // and discard them again.
            if self.limits.excludes(&package) {
                self.out.skipped += 1;
                continue;
            }
            self.visited.insert(package.clone());
            if self.limits.expands(depth) {
                for dep in self.graph.neighbors(package.as_str()) {
                    self.queue.push_back((dep.clone(), depth + 1));
                }
            }
            self.out.visits.push(Visit { package, depth });
        }
        self.out
    }
}

/// Breadth-first walk from `start` bounded by `limits`.
///
/// A package reached at exactly `max_depth` is reported but not expanded.
pub fn traverse(graph: &DependencyGraph, start: &PackageId, limits: &TraversalLimits) -> Traversal {
    let traversal = BfsContext::new(graph, limits).run(start);
    tracing::debug!(
        start = %start,
        visited = traversal.visits.len(),
        skipped = traversal.skipped,
        "breadth-first traversal finished"
    );
    traversal
}
