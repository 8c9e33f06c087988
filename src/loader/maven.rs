use std::fmt;
use std::path::{Path, PathBuf};

use glob::{glob_with, MatchOptions, Pattern};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;

use crate::core::PackageId;
use crate::error::{DepvizError, Result};
use crate::graph::DependencyGraph;
use crate::loader::traits::GraphLoader;

pub const UNSPECIFIED_VERSION: &str = "<no-version>";
pub const DEFAULT_SCOPE: &str = "compile";

/// One direct `<dependency>` of a Maven project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub scope: String,
}

impl ManifestDependency {
    pub fn coordinate(&self) -> PackageId {
        PackageId::new(format!("{}:{}", self.group_id, self.artifact_id))
    }
}

impl fmt::Display for ManifestDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} : {} : {} [{}]",
            self.group_id, self.artifact_id, self.version, self.scope
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MavenProject {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub dependencies: Vec<ManifestDependency>,
}

#[derive(Default)]
struct DependencyFields {
    group_id: Option<String>,
    artifact_id: Option<String>,
    version: Option<String>,
    scope: Option<String>,
}

impl DependencyFields {
    fn finish(self) -> ManifestDependency {
        ManifestDependency {
            group_id: self.group_id.unwrap_or_default(),
            artifact_id: self.artifact_id.unwrap_or_default(),
            version: self
                .version
                .unwrap_or_else(|| UNSPECIFIED_VERSION.to_string()),
            scope: self.scope.unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
        }
    }
}

/// Reads direct dependencies from a `pom.xml`. Edges go from `root` to each
/// `groupId:artifactId`; nothing transitive is resolved.
pub struct MavenLoader {
    pub root: PackageId,
}

impl MavenLoader {
    pub fn new(root: impl Into<PackageId>) -> Self {
        Self { root: root.into() }
    }

    /// Parses the project coordinate and `project/dependencies/dependency`
    /// entries. Dependencies under `dependencyManagement`, profiles or
    /// plugins are not direct dependencies and are ignored.
    pub fn parse_project(path: &Path, content: &str) -> Result<MavenProject> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);

        let mut project = MavenProject::default();
        let mut parent_group: Option<String> = None;
        let mut current: Option<DependencyFields> = None;
        let mut stack: Vec<String> = Vec::new();

        loop {
            let event = reader.read_event().map_err(|err| DepvizError::Manifest {
                path: path.to_path_buf(),
                message: format!("{err} at byte {}", reader.buffer_position()),
            })?;
            match event {
                Event::Start(start) => {
                    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                    stack.push(name);
                    if is_path(&stack, &["project", "dependencies", "dependency"]) {
                        current = Some(DependencyFields::default());
                    }
                }
                Event::End(_) => {
                    if is_path(&stack, &["project", "dependencies", "dependency"]) {
                        if let Some(fields) = current.take() {
                            project.dependencies.push(fields.finish());
                        }
                    }
                    stack.pop();
                }
                Event::Text(text) => {
                    let value = text.unescape().map_err(|err| DepvizError::Manifest {
                        path: path.to_path_buf(),
                        message: err.to_string(),
                    })?;
                    assign_text(
                        &stack,
                        value.trim(),
                        &mut project,
                        &mut parent_group,
                        &mut current,
                    );
                }
                Event::CData(data) => {
                    let value = String::from_utf8_lossy(&data).into_owned();
                    assign_text(
                        &stack,
                        value.trim(),
                        &mut project,
                        &mut parent_group,
                        &mut current,
                    );
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(DepvizError::Manifest {
                path: path.to_path_buf(),
                message: format!("unclosed element <{}>", stack.join("/")),
            });
        }
        if project.group_id.is_none() {
            project.group_id = parent_group;
        }
        Ok(project)
    }
}

fn is_path(stack: &[String], expected: &[&str]) -> bool {
    stack.len() == expected.len() && stack.iter().zip(expected).all(|(a, b)| a == b)
}

fn assign_text(
    stack: &[String],
    value: &str,
    project: &mut MavenProject,
    parent_group: &mut Option<String>,
    current: &mut Option<DependencyFields>,
) {
    if value.is_empty() {
        return;
    }
    let value = Some(value.to_string());
    let path: Vec<&str> = stack.iter().map(String::as_str).collect();
    match path.as_slice() {
        ["project", "groupId"] => project.group_id = value,
        ["project", "artifactId"] => project.artifact_id = value,
        ["project", "version"] => project.version = value,
        ["project", "parent", "groupId"] => *parent_group = value,
        ["project", "dependencies", "dependency", field] => {
            if let Some(fields) = current.as_mut() {
                match *field {
                    "groupId" => fields.group_id = value,
                    "artifactId" => fields.artifact_id = value,
                    "version" => fields.version = value,
                    "scope" => fields.scope = value,
                    _ => {}
                }
            }
        }
        _ => {}
    }
}

/// Shallowest file under `root` matching one of `loader`'s file patterns,
/// skipping build output in `target/`.
pub fn find_manifest(loader: &dyn GraphLoader, root: &Path) -> Result<Option<PathBuf>> {
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };
    let prefix = Pattern::escape(&root.to_string_lossy());

    let mut candidates = Vec::new();
    for file_pattern in loader.file_patterns() {
        let pattern = format!("{prefix}/**/{file_pattern}");
        let entries = glob_with(&pattern, options)
            .map_err(|err| DepvizError::Other(anyhow::Error::new(err)))?;
        for entry in entries {
            match entry {
                Ok(path) => candidates.push(path),
                Err(err) => tracing::warn!(
                    loader = loader.id(),
                    error = %err,
                    "skipping unreadable path while searching for a manifest"
                ),
            }
        }
    }

    candidates.retain(|path| {
        path.is_file()
            && !path
                .strip_prefix(root)
                .unwrap_or(path)
                .components()
                .any(|component| component.as_os_str() == "target")
    });
    candidates.sort_by(|a, b| {
        a.components()
            .count()
            .cmp(&b.components().count())
            .then_with(|| a.cmp(b))
    });
    Ok(candidates.into_iter().next())
}

impl GraphLoader for MavenLoader {
    fn id(&self) -> &'static str {
        "maven"
    }

    fn file_patterns(&self) -> &'static [&'static str] {
        &["pom.xml"]
    }

    fn load(&self, path: &Path, content: &str) -> Result<DependencyGraph> {
        let project = Self::parse_project(path, content)?;
        let mut graph = DependencyGraph::new();
        graph.add_package(self.root.clone());
        for dep in &project.dependencies {
            graph.add_edge(self.root.clone(), dep.coordinate());
        }
        tracing::info!(
            path = %path.display(),
            root = %self.root,
            dependencies = project.dependencies.len(),
            "loaded maven manifest"
        );
        Ok(graph)
    }
}
