//! Shared helpers for pokeagent binary tests
#![allow(dead_code)]

use assert_cmd::Command;
use serde_json::Value;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

/// Isolated home directory with its own `.pokeagent`
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub data_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = tempdir()?;
        let data_dir = temp_dir.path().join(".pokeagent");
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self { temp_dir, data_dir })
    }

    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }

    pub fn index_file(&self) -> PathBuf {
        self.temp_dir.path().join("pokemon.json")
    }

    /// Command with HOME pointing at the temp dir and no API keys leaking in
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_pokeagent"));
        cmd.env("HOME", self.temp_dir.path());
        cmd.env_remove("OPENAI_API_KEY");
        cmd.env_remove("OPENROUTER_API_KEY");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    pub fn write_config(&self, config: &Value) -> anyhow::Result<()> {
        std::fs::write(self.config_file(), serde_json::to_string_pretty(config)?)?;
        Ok(())
    }

    /// Index whose entries point at `base`
    pub fn write_index(&self, base: &str, names: &[&str]) -> anyhow::Result<PathBuf> {
        let entries: Vec<Value> = names
            .iter()
            .map(|name| serde_json::json!({"name": name, "url": format!("{}/pokemon/{}", base, name)}))
            .collect();
        let path = self.index_file();
        std::fs::write(&path, serde_json::to_string(&entries)?)?;
        Ok(path)
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new().expect("Failed to create test environment")
    }
}
