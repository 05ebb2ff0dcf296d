// Secret Tree - Record Types
//
// Shapes produced by the loader. Everything is rebuilt on each load.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Credential file name to raw file content.
pub type Credentials = HashMap<String, String>;

/// Instance name to record, flattened across every service.
pub type InstanceMap = HashMap<String, InstanceRecord>;

/// Service name to its instances.
pub type ServiceMap = HashMap<String, InstanceMap>;

/// One provisioned credential bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRecord {
    /// Files found directly under the instance directory
    pub credentials: Credentials,

    /// Instance directory name
    pub name: String,

    /// Name of the service directory holding this instance
    pub label: String,
}

impl InstanceRecord {
    pub fn new(
        label: impl Into<String>,
        name: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        Self {
            credentials,
            name: name.into(),
            label: label.into(),
        }
    }

    /// Get a credential value by file name.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.credentials.get(key).map(String::as_str)
    }
}

/// An instance name present under more than one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collision {
    pub instance: String,
    /// Services containing the instance, sorted by name
    pub services: Vec<String>,
}
