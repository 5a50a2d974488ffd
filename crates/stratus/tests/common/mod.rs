use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let project = Self { root };
        project.write_config("");
        project
    }

    pub fn write_config(&self, content: &str) {
        fs::write(self.config_path(), content).unwrap();
    }

    #[allow(dead_code)]
    pub fn write_state(&self, content: &str) {
        let dir = self.path().join(".stratus");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("state.json"), content).unwrap();
    }

    #[allow(dead_code)]
    pub fn write_lock(&self, content: &str) {
        let dir = self.path().join(".stratus");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("lock.json"), content).unwrap();
    }

    #[allow(dead_code)]
    pub fn read_state(&self) -> Option<serde_json::Value> {
        let content = fs::read_to_string(self.path().join(".stratus/state.json")).ok()?;
        Some(serde_json::from_str(&content).unwrap())
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    fn config_path(&self) -> PathBuf {
        self.path().join("stratus.yaml")
    }

    /// `stratus` running inside the project with a clean environment
    #[allow(deprecated)] // TODO: switch to cargo_bin_cmd! once assert_cmd is bumped
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("stratus").unwrap();
        cmd.current_dir(self.path())
            .env("STRATUS_CONFIG", self.config_path())
            .env("NO_COLOR", "1")
            .env_remove("OS_AUTH_TOKEN")
            .env_remove("OS_REGION_NAME")
            .env_remove("OS_DEBUG")
            .env_remove("RUST_LOG");
        cmd
    }
}
