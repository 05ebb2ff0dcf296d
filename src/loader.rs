//! Loader for mounted service credentials.
//!
//! Secrets are expected in a fixed three-level layout:
//!
//! ```text
//! <root>/<service>/<instance>/<credential-file>
//! ```
//!
//! Each instance directory becomes an [`InstanceRecord`] whose `label` is the
//! service name and whose `name` is the instance name. Credential files are
//! read as opaque text and never parsed.
//!
//! # Failure Semantics
//!
//! - **Directory failures** (root, service or instance cannot be listed) abort
//!   the whole load with a [`TreeError`]. No partial result is returned.
//! - **File failures** (one credential cannot be read) are logged as warnings
//!   and the value becomes an empty string.
//!
//! Entries are classified after following symlinks, so the `..data` links of
//! projected secret volumes resolve to what they point at.
//!
//! # Example
//!
//! ```no_run
//! use secret_tree::loader::SecretTreeLoader;
//!
//! # fn main() -> Result<(), secret_tree::error::TreeError> {
//! let loader = SecretTreeLoader::default();
//! if let Some(instances) = loader.load_default()? {
//!     for (name, record) in &instances {
//!         println!("{} ({}): {} credential(s)", name, record.label, record.credentials.len());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, TreeError};
use crate::types::{Collision, Credentials, InstanceMap, InstanceRecord, ServiceMap};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Conventional mount point for injected service secrets.
pub const DEFAULT_SECRETS_PATH: &str = "/etc/secrets/sapcp/";

/// Walks a service/instance/credential tree rooted at a fixed path.
#[derive(Debug, Clone)]
pub struct SecretTreeLoader {
    root: PathBuf,
    sorted: bool,
}

impl Default for SecretTreeLoader {
    fn default() -> Self {
        Self::new(DEFAULT_SECRETS_PATH)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Dir,
    File,
    Other,
}

#[derive(Debug)]
struct Entry {
    name: String,
    path: PathBuf,
    kind: EntryKind,
}

impl SecretTreeLoader {
    /// Create a loader for the given root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            sorted: false,
        }
    }

    /// Process directory entries in name order instead of filesystem order.
    ///
    /// This makes the winner of an instance-name collision deterministic.
    pub fn sorted(mut self, sorted: bool) -> Self {
        self.sorted = sorted;
        self
    }

    /// The configured root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Load the configured root, treating a missing root as "nothing mounted".
    ///
    /// # Returns
    ///
    /// - `Ok(None)` - The root does not exist
    /// - `Ok(Some(map))` - Flattened instance map
    ///
    /// # Errors
    ///
    /// Any structural error from [`SecretTreeLoader::load_from_path`].
    pub fn load_default(&self) -> Result<Option<InstanceMap>> {
        info!(root = %self.root.display(), "Loading mounted service secrets");

        if !self.is_mounted() {
            return Ok(None);
        }
        self.load_from_path(&self.root).map(Some)
    }

    /// Service-scoped counterpart of [`SecretTreeLoader::load_default`].
    pub fn load_default_scoped(&self) -> Result<Option<ServiceMap>> {
        info!(root = %self.root.display(), "Loading mounted service secrets");

        if !self.is_mounted() {
            return Ok(None);
        }
        self.load_scoped(&self.root).map(Some)
    }

    /// Only "not found" counts as unmounted; other stat failures surface
    /// from the strict load.
    fn is_mounted(&self) -> bool {
        match fs::metadata(&self.root) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(root = %self.root.display(), "Secrets root not mounted");
                false
            }
            _ => true,
        }
    }

    /// Load every instance under `root` into one map keyed by instance name.
    ///
    /// `root` is used instead of the configured root, which only applies to
    /// [`SecretTreeLoader::load_default`]. Instances from all services share a single namespace. When two
    /// services contain the same instance name the one processed later
    /// replaces the earlier one, and a warning is logged.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `root` does not exist or cannot be accessed
    /// - `root` is not a directory
    /// - Any root, service or instance directory cannot be listed
    pub fn load_from_path(&self, root: impl AsRef<Path>) -> Result<InstanceMap> {
        let mut result = InstanceMap::new();

        for (service_name, service_path) in self.service_dirs(root.as_ref())? {
            let instances = self.load_service_instances(&service_name, &service_path)?;

            for (instance_name, record) in instances {
                if let Some(previous) = result.insert(instance_name.clone(), record) {
                    warn!(
                        instance = %instance_name,
                        replaced = %previous.label,
                        service = %service_name,
                        "Instance name collision across services, keeping the later one"
                    );
                }
            }
        }

        Ok(result)
    }

    /// Load every instance under `root`, keeping instances grouped by service.
    ///
    /// Same traversal, root handling and errors as
    /// [`SecretTreeLoader::load_from_path`], but same-named instances in different services are all kept.
    pub fn load_scoped(&self, root: impl AsRef<Path>) -> Result<ServiceMap> {
        let mut result = ServiceMap::new();

        for (service_name, service_path) in self.service_dirs(root.as_ref())? {
            let instances = self.load_service_instances(&service_name, &service_path)?;
            result.insert(service_name, instances);
        }

        Ok(result)
    }

    /// Load all instance directories of one service.
    pub fn load_service_instances(
        &self,
        service_name: &str,
        service_path: &Path,
    ) -> Result<InstanceMap> {
        debug!(service = service_name, "Reading service instances");

        let mut result = InstanceMap::new();

        for entry in self.list_entries(service_path)? {
            if entry.kind != EntryKind::Dir {
                continue;
            }

            let record = self.load_instance(service_name, &entry.name, &entry.path)?;
            if result.insert(entry.name.clone(), record).is_some() {
                warn!(
                    service = service_name,
                    instance = %entry.name,
                    "Duplicate instance name after UTF-8 conversion, keeping the later one"
                );
            }
        }

        Ok(result)
    }

    /// Build the record for a single instance directory.
    pub fn load_instance(
        &self,
        service_name: &str,
        instance_name: &str,
        instance_path: &Path,
    ) -> Result<InstanceRecord> {
        debug!(service = service_name, instance = instance_name, "Reading instance");

        let credentials = self.load_credential_files(instance_path)?;

        Ok(InstanceRecord::new(service_name, instance_name, credentials))
    }

    /// Read every regular file directly under `dir_path`.
    ///
    /// Subdirectories are skipped. A file that cannot be read is logged and
    /// stored as an empty string.
    pub fn load_credential_files(&self, dir_path: &Path) -> Result<Credentials> {
        let mut result = Credentials::new();

        for entry in self.list_entries(dir_path)? {
            if entry.kind != EntryKind::File {
                continue;
            }

            let content = read_credential(&entry.path);
            if result.insert(entry.name.clone(), content).is_some() {
                warn!(
                    dir = %dir_path.display(),
                    credential = %entry.name,
                    "Duplicate credential name after UTF-8 conversion, keeping the later one"
                );
            }
        }

        Ok(result)
    }

    /// Validate `root` and return its service directories.
    fn service_dirs(&self, root: &Path) -> Result<Vec<(String, PathBuf)>> {
        let metadata = fs::metadata(root).map_err(|err| TreeError::stat(root, err))?;
        if !metadata.is_dir() {
            return Err(TreeError::NotADirectory {
                path: root.to_path_buf(),
            });
        }

        Ok(self
            .list_entries(root)?
            .into_iter()
            .filter(|entry| entry.kind == EntryKind::Dir)
            .map(|entry| (entry.name, entry.path))
            .collect())
    }

    fn list_entries(&self, dir: &Path) -> Result<Vec<Entry>> {
        let read_dir = fs::read_dir(dir).map_err(|err| TreeError::read_dir(dir, err))?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|err| TreeError::read_dir(dir, err))?;
            let path = entry.path();

            // fs::metadata follows symlinks; dangling links are skipped
            let kind = match fs::metadata(&path) {
                Ok(meta) if meta.is_dir() => EntryKind::Dir,
                Ok(meta) if meta.is_file() => EntryKind::File,
                Ok(_) => EntryKind::Other,
                Err(err) => {
                    debug!(path = %path.display(), error = %err, "Skipping entry");
                    continue;
                }
            };

            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    let name = raw.to_string_lossy().into_owned();
                    warn!(path = %path.display(), name = %name, "Entry name is not valid UTF-8");
                    name
                }
            };

            entries.push(Entry { name, path, kind });
        }

        if self.sorted {
            entries.sort_by(|a, b| a.name.cmp(&b.name));
        }

        Ok(entries)
    }
}

/// Read a credential file as text, degrading to an empty string on failure.
fn read_credential(path: &Path) -> String {
    match fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Error reading credential file");
            String::new()
        }
    }
}

/// Find instance names that appear under more than one service.
///
/// Results are sorted by instance name.
pub fn collisions(services: &ServiceMap) -> Vec<Collision> {
    let mut owners: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

    for (service, instances) in services {
        for instance in instances.keys() {
            owners
                .entry(instance.as_str())
                .or_default()
                .insert(service.as_str());
        }
    }

    owners
        .into_iter()
        .filter(|(_, services)| services.len() > 1)
        .map(|(instance, services)| Collision {
            instance: instance.to_string(),
            services: services.into_iter().map(str::to_string).collect(),
        })
        .collect()
}
