use std::path::Path;

use crate::error::Result;
use crate::graph::DependencyGraph;

pub trait GraphLoader {
    fn id(&self) -> &'static str;
    fn file_patterns(&self) -> &'static [&'static str];
    fn load(&self, path: &Path, content: &str) -> Result<DependencyGraph>;
}
