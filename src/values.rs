//! Deployment values file loading, validation, and defaulting.
//!
//! A values file is a YAML mapping describing one workload:
//!
//! ```yaml
//! name: api
//! image: img:1
//! port: 8080
//! scaling:
//!   trigger_type: cpu
//!   trigger_metadata:
//!     type: Utilization
//!     value: "50"
//! ```
//!
//! `name` and `image` are required; everything else is defaulted. If a
//! `scaling` section is present, `trigger_type` and `trigger_metadata` are
//! required within it. User-supplied values always win over defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Merged deployment configuration: user values with defaults applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeploymentValues {
    pub name: String,
    pub image: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_port")]
    pub port: i32,
    #[serde(default = "default_replicas")]
    pub replicas: i32,
    #[serde(default = "default_cpu_request")]
    pub cpu_request: String,
    #[serde(default = "default_mem_request")]
    pub mem_request: String,
    #[serde(default = "default_cpu_limit")]
    pub cpu_limit: String,
    #[serde(default = "default_mem_limit")]
    pub mem_limit: String,
    #[serde(default)]
    pub scaling: Option<ScalingValues>,
}

/// KEDA scaling configuration from the `scaling` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScalingValues {
    pub trigger_type: String,
    /// Trigger metadata passed through to the ScaledObject verbatim.
    pub trigger_metadata: serde_yaml::Mapping,
    #[serde(default = "default_min_replicas")]
    pub min_replicas: i32,
    #[serde(default = "default_max_replicas")]
    pub max_replicas: i32,
}

fn default_namespace() -> String {
    "default".to_string()
}
fn default_port() -> i32 {
    80
}
fn default_replicas() -> i32 {
    1
}
fn default_cpu_request() -> String {
    "100m".to_string()
}
fn default_mem_request() -> String {
    "128Mi".to_string()
}
fn default_cpu_limit() -> String {
    "250m".to_string()
}
fn default_mem_limit() -> String {
    "256Mi".to_string()
}
fn default_min_replicas() -> i32 {
    1
}
fn default_max_replicas() -> i32 {
    10
}

impl DeploymentValues {
    /// Name of the ScaledObject derived from the workload name.
    pub fn scaled_object_name(&self) -> String {
        format!("{}-so", self.name)
    }
}

/// Load a values file, validate required fields, and apply defaults.
pub fn load_values(path: impl AsRef<Path>) -> Result<DeploymentValues> {
    let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        Error::validation(format!(
            "could not read values file {}: {}",
            path.as_ref().display(),
            e
        ))
    })?;
    parse_values(&content)
}

/// Validate a values document and produce the merged configuration.
pub fn parse_values(content: &str) -> Result<DeploymentValues> {
    let doc: serde_yaml::Value = serde_yaml::from_str(content)?;

    if !doc.is_mapping() {
        return Err(Error::validation("values file must contain a mapping"));
    }

    for field in ["name", "image"] {
        if doc.get(field).is_none() {
            return Err(Error::validation(format!(
                "missing required field in values file: '{}'",
                field
            )));
        }
    }

    if let Some(scaling) = doc.get("scaling") {
        if !scaling.is_mapping() {
            return Err(Error::validation("the 'scaling' key must contain a mapping"));
        }
        for field in ["trigger_type", "trigger_metadata"] {
            if scaling.get(field).is_none() {
                return Err(Error::validation(format!(
                    "missing required field in 'scaling' section: '{}'",
                    field
                )));
            }
        }
    }

    // Shape is valid; deserialization fills in the defaults.
    Ok(serde_yaml::from_value(doc)?)
}
