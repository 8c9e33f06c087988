use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

struct TestDir {
    root: PathBuf,
}

impl TestDir {
    fn new(prefix: &str) -> Self {
        let root = unique_temp_dir(prefix);
        fs::create_dir_all(&root).expect("create test dir");
        Self { root }
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(&path, contents).expect("write test file");
        path
    }

    fn run(&self, config: &Path, args: &[&str]) -> Output {
        Command::new(depviz_bin())
            .current_dir(&self.root)
            .env_remove("DEPVIZ_CONFIG")
            .env_remove("DEPVIZ_RENDERER")
            .env_remove("RUST_LOG")
            .arg("--no-color")
            .arg("--config")
            .arg(config)
            .args(args)
            .output()
            .expect("run depviz")
    }
}

impl Drop for TestDir {
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
fn config_prints_key_value_pairs() {
    let dir = TestDir::new("config-print");
    let graph = dir.write("graph.txt", "A: B\n");
    let config = dir.write(
        "depviz.yaml",
        &format!(
            "package_name: A\ntest_repo_mode: file\ntest_graph_file: {}\noutput_image: graph.svg\nmax_depth: 3\n",
            graph.display()
        ),
    );

    let output = dir.run(&config, &["config"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    assert!(stdout.contains("- package_name: A\n"), "stdout:\n{stdout}");
    assert!(stdout.contains("- test_repo_mode: file\n"), "stdout:\n{stdout}");
    assert!(stdout.contains("- max_depth: 3\n"), "stdout:\n{stdout}");
    assert!(
        stdout.contains("- filter_substring: <empty string>\n"),
        "stdout:\n{stdout}"
    );
}

#[test]
fn invalid_config_reports_all_errors_with_config_exit_code() {
    let dir = TestDir::new("config-invalid");
    let config = dir.write(
        "depviz.json",
        r#"{"package_name": " ", "test_repo_mode": "remote", "output_image": "graph.bmp", "max_depth": -2}"#,
    );

    let output = dir.run(&config, &["traverse"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    for expected in ["package_name", "test_repo_mode", ".bmp", "max_depth"] {
        assert!(stderr.contains(expected), "missing {expected} in:\n{stderr}");
    }
}

#[test]
fn missing_config_file_is_a_config_error() {
    let dir = TestDir::new("config-missing");
    let output = dir.run(&dir.root.join("nope.json"), &["config"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("config file not found"));
}

#[test]
fn deps_lists_direct_maven_dependencies() {
    let dir = TestDir::new("config-maven");
    dir.write(
        "repo/pom.xml",
        r#"<project>
  <groupId>com.example</groupId>
  <artifactId>service</artifactId>
  <dependencies>
    <dependency>
      <groupId>org.slf4j</groupId>
      <artifactId>slf4j-api</artifactId>
      <version>2.0.9</version>
    </dependency>
    <dependency>
      <groupId>junit</groupId>
      <artifactId>junit</artifactId>
      <scope>test</scope>
    </dependency>
  </dependencies>
</project>
"#,
    );
    let config = dir.write(
        "depviz.json",
        &serde_json::json!({
            "package_name": "service",
            "repo": dir.root.join("repo").to_string_lossy(),
            "test_repo_mode": "off",
            "output_image": "graph.png",
        })
        .to_string(),
    );

    let output = dir.run(&config, &["deps"]);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    assert!(output.status.success(), "stdout:\n{stdout}");
    assert!(stdout.contains("- org.slf4j : slf4j-api : 2.0.9 [compile]\n"));
    assert!(stdout.contains("- junit : junit : <no-version> [test]\n"));

    let traverse = dir.run(&config, &["traverse", "--json"]);
    assert!(traverse.status.success());
    let visits: Value = serde_json::from_slice(&traverse.stdout).expect("parse traverse json");
    let packages: Vec<&str> = visits
        .as_array()
        .expect("visit list")
        .iter()
        .filter_map(|visit| visit["package"].as_str())
        .collect();
    assert_eq!(packages, vec!["service", "org.slf4j:slf4j-api", "junit:junit"]);
}

#[test]
fn config_env_var_points_at_mock_mode_config() {
    let dir = TestDir::new("config-env");
    let config = dir.write(
        "conf/settings.json",
        r#"{"package_name": "A", "test_repo_mode": "mock", "output_image": "graph.png"}"#,
    );

    let output = Command::new(depviz_bin())
        .current_dir(&dir.root)
        .env("DEPVIZ_CONFIG", &config)
        .env_remove("RUST_LOG")
        .args(["order", "--json"])
        .output()
        .expect("run depviz");
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    assert!(output.status.success(), "stderr:\n{stderr}");
    let report: Value = serde_json::from_slice(&output.stdout).expect("parse order json");
    assert_eq!(report, serde_json::json!({"order": ["A"], "cycle": null}));
}
