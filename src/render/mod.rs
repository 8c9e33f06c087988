use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::Result;
use crate::graph::viz::DiagramFormat;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered(PathBuf),
    /// The renderer executable could not be started.
    Missing(String),
    Failed(String),
}

/// Text artifact and image paths for one diagram root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramTarget {
    pub text: PathBuf,
    pub image: PathBuf,
}

impl DiagramTarget {
    /// `suffix` distinguishes roots when several diagrams share one
    /// `output_image`: `graph.png` becomes `graph_<suffix>.png`.
    pub fn for_image(output_image: &Path, format: DiagramFormat, suffix: Option<&str>) -> Self {
        let stem = output_image
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "graph".to_string());
        let stem = match suffix {
            Some(suffix) => format!("{stem}_{}", file_safe(suffix)),
            None => stem,
        };
        let image_name = match output_image.extension() {
            Some(ext) => format!("{stem}.{}", ext.to_string_lossy()),
            None => stem.clone(),
        };
        let parent = output_image.parent().unwrap_or_else(|| Path::new(""));
        Self {
            text: parent.join(format!("{stem}.{}", format.extension())),
            image: parent.join(image_name),
        }
    }
}

pub fn write_diagram(text: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut contents = text.to_string();
    if !contents.ends_with('\n') {
        contents.push('\n');
    }
    fs::write(path, contents)?;
    tracing::info!(path = %path.display(), "wrote diagram text");
    Ok(())
}

/// Runs the external renderer on `input`. A renderer that cannot be started
/// or exits non-zero is reported in the outcome, not as an error: the
/// diagram text is already written at this point.
pub fn invoke_renderer(
    command: &str,
    input: &Path,
    output: &Path,
    format: DiagramFormat,
) -> RenderOutcome {
    let mut parts = command.split_whitespace();
    let Some(program) = parts.next() else {
        return RenderOutcome::Missing(command.to_string());
    };

    let mut cmd = Command::new(program);
    cmd.args(parts);
    match format {
        DiagramFormat::Mermaid => {
            cmd.arg("-i").arg(input).arg("-o").arg(output);
        }
        DiagramFormat::Dot => {
            let kind = output
                .extension()
                .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
                .unwrap_or_else(|| "png".to_string());
            cmd.arg(format!("-T{kind}")).arg(input).arg("-o").arg(output);
        }
    }

    tracing::debug!(?cmd, "invoking renderer");
    match cmd.output() {
        Ok(result) if result.status.success() => RenderOutcome::Rendered(output.to_path_buf()),
        Ok(result) => {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            let status = result
                .status
                .code()
                .map_or_else(|| "signal".to_string(), |code| code.to_string());
            RenderOutcome::Failed(if stderr.is_empty() {
                format!("{program} exited with status {status}")
            } else {
                format!("{program} exited with status {status}: {stderr}")
            })
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {
            RenderOutcome::Missing(program.to_string())
        }
        Err(err) => RenderOutcome::Failed(format!("failed to run {program}: {err}")),
    }
}

fn file_safe(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
                ch
            } else {
                '_'
            }
        })
        .collect()
}
