use std::path::{Path, PathBuf};

use crate::config::{RepoMode, Settings};
use crate::error::{DepvizError, Result};
use crate::graph::DependencyGraph;
use crate::loader::maven::find_manifest;
use crate::loader::{AdjacencyLoader, GraphLoader, MavenLoader};

/// Where the graph came from, for reporting.
#[derive(Debug, Clone)]
pub struct GraphSource {
    pub loader: &'static str,
    pub path: PathBuf,
}

pub fn build_graph(settings: &Settings) -> Result<(DependencyGraph, GraphSource)> {
    match settings.test_repo_mode {
        RepoMode::File => {
            let path = settings.graph_file().ok_or_else(|| {
                DepvizError::Other(anyhow::anyhow!("no graph file configured for file mode"))
            })?;
            load_with(&AdjacencyLoader, &path)
        }
        RepoMode::Off => {
            let path = manifest_path(settings)?;
            load_with(&MavenLoader::new(settings.package_name.as_str()), &path)
        }
        RepoMode::Mock => {
            let mut graph = DependencyGraph::new();
            graph.add_package(settings.package_name.as_str());
            tracing::info!(root = %settings.package_name, "mock mode, no graph source loaded");
            Ok((
                graph,
                GraphSource {
                    loader: "mock",
                    path: PathBuf::new(),
                },
            ))
        }
    }
}

/// Locates the Maven manifest inside the configured local repository.
pub fn manifest_path(settings: &Settings) -> Result<PathBuf> {
    let repo = settings.repo.as_deref().ok_or_else(|| {
        DepvizError::Other(anyhow::anyhow!("no repository configured for manifest mode"))
    })?;
    let root = local_repo_dir(repo)?;
    let loader = MavenLoader::new(settings.package_name.as_str());
    find_manifest(&loader, root)?.ok_or_else(|| {
        DepvizError::Other(anyhow::anyhow!(
            "no pom.xml found under {}",
            root.display()
        ))
    })
}

fn local_repo_dir(repo: &str) -> Result<&Path> {
    let lowered = repo.to_ascii_lowercase();
    if ["http://", "https://", "git://", "ssh://"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return Err(DepvizError::Other(anyhow::anyhow!(
            "remote repository {repo} is not fetched; clone it and point 'repo' at the checkout"
        )));
    }
    Ok(Path::new(repo))
}

fn load_with(loader: &dyn GraphLoader, path: &Path) -> Result<(DependencyGraph, GraphSource)> {
    let content = std::fs::read_to_string(path)?;
    let graph = loader.load(path, &content)?;
    Ok((
        graph,
        GraphSource {
            loader: loader.id(),
            path: path.to_path_buf(),
        },
    ))
}
