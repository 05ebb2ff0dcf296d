//! Common testing utilities for Secret Tree integration tests.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

/// Test context that manages a temporary secrets tree.
pub struct TestContext {
    /// Path to temporary directory
    pub temp_path: PathBuf,
    /// The temporary directory (kept to prevent early deletion)
    _temp_dir: TempDir,
}

impl TestContext {
    /// Create a new test context with a temporary directory.
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = TempDir::new()?;
        let temp_path = temp_dir.path().to_path_buf();

        Ok(Self {
            temp_path,
            _temp_dir: temp_dir,
        })
    }

    /// Create a test file with content, creating parent directories.
    pub fn create_file(&self, name: &str, content: &str) -> anyhow::Result<PathBuf> {
        let file_path = self.temp_path.join(name);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(&file_path)?;
        file.write_all(content.as_bytes())?;
        Ok(file_path)
    }

    /// Create `<root>/<service>/<instance>/<name>` with content.
    pub fn create_credential(
        &self,
        service: &str,
        instance: &str,
        name: &str,
        content: &str,
    ) -> anyhow::Result<PathBuf> {
        self.create_file(&format!("{}/{}/{}", service, instance, name), content)
    }

    /// Create an empty directory.
    #[allow(dead_code)]
    pub fn create_dir(&self, name: &str) -> anyhow::Result<PathBuf> {
        let dir_path = self.temp_path.join(name);
        fs::create_dir_all(&dir_path)?;
        Ok(dir_path)
    }

    /// Populate the two-service layout used across tests:
    /// `db/inst1/{username,password}` and `cache/inst2/{token}`.
    #[allow(dead_code)]
    pub fn create_example_tree(&self) -> anyhow::Result<()> {
        self.create_credential("db", "inst1", "username", "u")?;
        self.create_credential("db", "inst1", "password", "p")?;
        self.create_credential("cache", "inst2", "token", "t")?;
        Ok(())
    }

    /// Get the path to a file in the temp directory.
    #[allow(dead_code)]
    pub fn path(&self, name: &str) -> PathBuf {
        self.temp_path.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_context_create_credential() {
        let ctx = TestContext::new().unwrap();
        let file_path = ctx.create_credential("db", "inst1", "username", "admin").unwrap();

        assert!(file_path.ends_with("db/inst1/username"));
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "admin");
    }
}
