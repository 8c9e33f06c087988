use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::core::PackageId;
use crate::graph::{DependencyGraph, Edge};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DiagramFormat {
    #[default]
    Mermaid,
    Dot,
}

impl DiagramFormat {
    pub fn extension(self) -> &'static str {
        match self {
            DiagramFormat::Mermaid => "mmd",
            DiagramFormat::Dot => "dot",
        }
    }

    pub fn default_renderer(self) -> &'static str {
        match self {
            DiagramFormat::Mermaid => "mmdc",
            DiagramFormat::Dot => "dot",
        }
    }
}

impl FromStr for DiagramFormat {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_ascii_lowercase().as_str() {
            "mermaid" | "mmd" => Ok(DiagramFormat::Mermaid),
            "dot" | "graphviz" => Ok(DiagramFormat::Dot),
            other => Err(format!("unknown diagram format '{other}'")),
        }
    }
}

impl fmt::Display for DiagramFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagramFormat::Mermaid => f.write_str("mermaid"),
            DiagramFormat::Dot => f.write_str("dot"),
        }
    }
}

/// Edges reachable from `root` in depth-first discovery order.
///
/// Every edge of a package is emitted on that package's first visit, before
/// descending into the dependency, so back edges and shared dependencies
/// still appear once each while the walk itself never revisits a package.
pub fn diagram_edges(graph: &DependencyGraph, root: &PackageId) -> Vec<Edge> {
    let mut edges = Vec::new();
    let mut visited: HashSet<&PackageId> = HashSet::new();
    let mut stack: Vec<(&PackageId, &[PackageId])> = Vec::new();

    visited.insert(root);
    stack.push((root, graph.neighbors(root.as_str())));

    while let Some(top) = stack.last_mut() {
        let (package, remaining) = *top;
        let Some((dep, rest)) = remaining.split_first() else {
            stack.pop();
            continue;
        };
        top.1 = rest;
        edges.push(Edge {
            from: package.clone(),
            to: dep.clone(),
        });
        if visited.insert(dep) {
            stack.push((dep, graph.neighbors(dep.as_str())));
        }
    }

    edges
}

/// Diagram text for the subgraph reachable from `root`.
pub fn render(graph: &DependencyGraph, root: &PackageId, format: DiagramFormat) -> String {
    let edges = diagram_edges(graph, root);
    tracing::debug!(root = %root, edges = edges.len(), %format, "rendering diagram");
    match format {
        DiagramFormat::Mermaid => render_mermaid(&edges),
        DiagramFormat::Dot => render_dot(&edges),
    }
}

pub fn render_mermaid(edges: &[Edge]) -> String {
    let mut ids = MermaidIds::default();
    let mut lines = vec!["graph TD".to_string()];
    for edge in edges {
        let from = ids.node(&edge.from);
        let to = ids.node(&edge.to);
        lines.push(format!("    {from} --> {to}"));
    }
    lines.join("\n")
}

pub fn render_dot(edges: &[Edge]) -> String {
    let mut out = String::from("digraph depviz {\n");
    for edge in edges {
        out.push_str(&format!(
            "  \"{}\" -> \"{}\";\n",
            escape_dot_label(edge.from.as_str()),
            escape_dot_label(edge.to.as_str())
        ));
    }
    out.push_str("}\n");
    out
}

/// Mermaid node references. Plain identifiers are used verbatim; anything
/// else gets a sanitized id, unique across the diagram, plus a quoted label
/// on its first appearance.
#[derive(Default)]
struct MermaidIds {
    assigned: HashMap<PackageId, String>,
    taken: HashSet<String>,
}

impl MermaidIds {
    fn node(&mut self, package: &PackageId) -> String {
        if let Some(id) = self.assigned.get(package) {
            return id.clone();
        }
        let name = package.as_str();
        let plain = is_plain_identifier(name);
        let base = if plain {
            name.to_string()
        } else {
            sanitize(name)
        };
        let mut id = base.clone();
        let mut suffix = 1;
        while self.taken.contains(&id) {
            id = format!("{base}_{suffix}");
            suffix += 1;
        }
        self.taken.insert(id.clone());
        self.assigned.insert(package.clone(), id.clone());
        if plain && id == name {
            id
        } else {
            format!("{id}[\"{}\"]", escape_mermaid_label(name))
        }
    }
}

/// Flowchart keywords that cannot stand as a bare node id.
const MERMAID_KEYWORDS: [&str; 11] = [
    "call",
    "class",
    "classDef",
    "click",
    "default",
    "direction",
    "end",
    "graph",
    "linkStyle",
    "style",
    "subgraph",
];

fn is_plain_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        && !MERMAID_KEYWORDS.contains(&name)
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "node".to_string()
    } else if MERMAID_KEYWORDS.contains(&cleaned.as_str()) {
        format!("{cleaned}_node")
    } else {
        cleaned
    }
}

fn escape_mermaid_label(label: &str) -> String {
    label.replace('"', "#quot;")
}

fn escape_dot_label(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
