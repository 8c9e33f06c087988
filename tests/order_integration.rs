use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{json, Value};

struct TestProject {
    root: PathBuf,
}

impl TestProject {
    fn new(package: &str, graph: &str) -> Self {
        let root = unique_temp_dir("order");
        fs::create_dir_all(&root).expect("create project dir");
        fs::write(root.join("graph.txt"), graph).expect("write graph file");
        fs::write(
            root.join("depviz.toml"),
            format!(
                "package_name = \"{package}\"\ntest_repo_mode = \"file\"\ntest_graph_file = \"{}\"\noutput_image = \"graph.png\"\n",
                root.join("graph.txt").display()
            ),
        )
        .expect("write config");
        Self { root }
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(depviz_bin())
            .current_dir(&self.root)
            .env_remove("DEPVIZ_CONFIG")
            .env_remove("RUST_LOG")
            .args(args)
            .output()
            .expect("run depviz")
    }

    fn order_json(&self) -> (Value, String) {
        let output = self.run(&["order", "--json"]);
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        assert!(
            output.status.success(),
            "order command failed\nstdout:\n{stdout}\nstderr:\n{stderr}"
        );
        (
            serde_json::from_slice(&output.stdout).expect("parse order json"),
            stderr,
        )
    }
}

impl Drop for TestProject {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

fn depviz_bin() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_depviz") {
        return PathBuf::from(path);
    }

    let current_exe = std::env::current_exe().expect("resolve current test binary path");
    let target_dir = current_exe
        .parent()
        .and_then(|path| path.parent())
        .expect("derive cargo target dir from test binary path");
    let bin_name = if cfg!(windows) { "depviz.exe" } else { "depviz" };
    let fallback = target_dir.join(bin_name);

    if fallback.is_file() {
        fallback
    } else {
        panic!(
            "CARGO_BIN_EXE_depviz is not set and fallback binary not found at {}",
            fallback.display()
        );
    }
}

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_nanos();
    let pid = std::process::id();
    std::env::temp_dir().join(format!("depviz-{prefix}-{pid}-{nanos}"))
}

#[test]
fn order_is_dependency_first_from_discovered_config() {
    let project = TestProject::new("A", "A: B, C\nB: C\nC:\n");
    let (report, _) = project.order_json();
    assert_eq!(report, json!({"order": ["C", "B", "A"], "cycle": null}));
}

#[test]
fn order_ignores_packages_unreachable_from_start() {
    let project = TestProject::new("app", "app: lib\nlib: core\nother: app\nx: y\ny: x\n");
    let (report, _) = project.order_json();
    assert_eq!(report, json!({"order": ["core", "lib", "app"], "cycle": null}));
}

#[test]
fn order_cycle_is_a_warning_with_partial_result() {
    let project = TestProject::new("A", "A: B\nB: A\n");
    let (report, stderr) = project.order_json();
    assert_eq!(report, json!({"order": [], "cycle": "A"}));
    assert!(stderr.contains("cycle"), "stderr:\n{stderr}");
}

#[test]
fn order_cycle_keeps_completed_subtrees() {
    let project = TestProject::new("A", "A: D, B\nB: C\nC: B\n");
    let (report, _) = project.order_json();
    assert_eq!(report, json!({"order": ["D"], "cycle": "B"}));
}
