//! Integration tests for rescache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    /// Command isolated from the user's config file
    fn rescache(temp: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("rescache");
        cmd.env("RESCACHE_CONFIG", temp.path().join("config.toml"))
            .env_remove("RUST_LOG");
        cmd
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        rescache(&temp)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Dependency-keyed store cache"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        rescache(&temp)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("rescache"));
    }

    #[test]
    fn graph_lists_upstream_before_dependents() {
        let temp = TempDir::new().unwrap();
        let output = rescache(&temp)
            .args(["graph", "--format", "plain"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let stdout = String::from_utf8(output.stdout).unwrap();
        let order: Vec<&str> = stdout.lines().collect();
        assert_eq!(order.len(), 9);

        let pos = |ns: &str| order.iter().position(|n| *n == ns).unwrap();
        assert!(pos("crossProjectTokenStore") < pos("documentPreviewStore"));
        assert!(pos("documentPreviewStore") < pos("documentStore"));
        assert!(pos("connectionStatusStore") < pos("presenceStore"));
    }

    #[test]
    fn resolve_document_store() {
        let temp = TempDir::new().unwrap();
        rescache(&temp)
            .args(["resolve", "--format", "plain", "documentStore"])
            .assert()
            .success()
            .stdout(predicate::str::contains("historyStore miss"))
            .stdout(predicate::str::contains("documentStore miss"));
    }

    #[test]
    fn resolve_swap_client_json() {
        let temp = TempDir::new().unwrap();
        let output = rescache(&temp)
            .args([
                "resolve",
                "--swap-client",
                "--format",
                "json",
                "historyStore",
                "settingsStore",
            ])
            .output()
            .unwrap();
        assert!(output.status.success());

        let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(report["workspace"], "default");
        assert_eq!(report["passes"].as_array().unwrap().len(), 2);
        assert_eq!(report["stats"]["supersessions"], 1);

        let second = report["passes"][1]["resolutions"].as_array().unwrap();
        let lookup = |ns: &str| {
            second
                .iter()
                .find(|r| r["namespace"] == ns)
                .map(|r| r["lookup"].clone())
                .unwrap()
        };
        assert_eq!(lookup("historyStore"), "miss");
        assert_eq!(lookup("settingsStore"), "hit");
    }

    #[test]
    fn resolve_unknown_workspace_fails() {
        let temp = TempDir::new().unwrap();
        rescache(&temp)
            .args(["resolve", "--workspace", "nope"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Workspace not found"));
    }

    #[test]
    fn resolve_unknown_store_fails() {
        let temp = TempDir::new().unwrap();
        rescache(&temp)
            .args(["resolve", "bogusStore"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown store"));
    }

    #[test]
    fn misconfigured_client_reports_construction_failure() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("config.toml"),
            "[[workspaces]]\nname = \"broken\"\nproject_id = \"\"\n",
        )
        .unwrap();

        rescache(&temp)
            .args(["resolve", "projectStore"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to construct projectStore"));
    }

    #[test]
    fn workspaces_lists_default() {
        let temp = TempDir::new().unwrap();
        rescache(&temp)
            .args(["workspaces", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("default"));
    }

    #[test]
    fn config_path_honours_env() {
        let temp = TempDir::new().unwrap();
        rescache(&temp)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        rescache(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[general]"))
            .stdout(predicate::str::contains("eviction = \"context\""));
    }

    #[test]
    fn config_set_persists() {
        let temp = TempDir::new().unwrap();
        rescache(&temp)
            .args(["config", "set", "cache.eviction", "unreferenced"])
            .assert()
            .success();

        rescache(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("eviction = \"unreferenced\""));
    }

    #[test]
    fn config_set_unknown_key_fails() {
        let temp = TempDir::new().unwrap();
        rescache(&temp)
            .args(["config", "set", "cache.size", "10"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn completions_bash() {
        let temp = TempDir::new().unwrap();
        rescache(&temp)
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("rescache"));
    }
}
