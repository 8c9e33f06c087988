use std::collections::HashMap;

use thiserror::Error;

use crate::core::PackageId;
use crate::graph::DependencyGraph;

/// Dependency cycle reached from the resolution start.
///
/// `completed` holds the packages whose whole subtree finished before the
/// cycle closed. It is not a valid load order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("dependency cycle detected at {package}")]
pub struct Cycle {
    pub package: PackageId,
    pub completed: Vec<PackageId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

struct Frame<'a> {
    package: &'a PackageId,
    deps: &'a [PackageId],
    next: usize,
}

/// Load order of everything reachable from `start`, dependencies first.
///
/// Depth-first post-order over an explicit stack. The first back edge onto
/// the active path aborts the whole resolution; packages still on that path
/// never reach the output. Cycles not reachable from `start` are not seen.
pub fn resolve(graph: &DependencyGraph, start: &PackageId) -> Result<Vec<PackageId>, Cycle> {
    let mut marks: HashMap<&PackageId, Mark> = HashMap::new();
    let mut completed: Vec<PackageId> = Vec::new();
    let mut stack: Vec<Frame<'_>> = Vec::new();

    marks.insert(start, Mark::InProgress);
    stack.push(Frame {
        package: start,
        deps: graph.neighbors(start.as_str()),
        next: 0,
    });

    while let Some(frame) = stack.last_mut() {
        let deps = frame.deps;
        let Some(dep) = deps.get(frame.next) else {
            let package = frame.package;
            stack.pop();
            marks.insert(package, Mark::Done);
            completed.push(package.clone());
            continue;
        };
        frame.next += 1;

        match marks.get(dep) {
            Some(Mark::InProgress) => {
                tracing::debug!(package = %dep, completed = completed.len(), "cycle closes");
                return Err(Cycle {
                    package: dep.clone(),
                    completed,
                });
            }
            Some(Mark::Done) => {}
            None => {
                marks.insert(dep, Mark::InProgress);
                stack.push(Frame {
                    package: dep,
                    deps: graph.neighbors(dep.as_str()),
                    next: 0,
                });
            }
        }
    }

    Ok(completed)
}
