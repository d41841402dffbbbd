//! Container and image records.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Timestamp;

/// One row of `docker ps -a`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ContainerSummary {
    pub container_id: String,
    pub image: String,
    pub command: String,
    /// Relative creation time as printed by docker (e.g. "4 days ago")
    pub created: String,
    pub status: String,
    pub ports: String,
    pub names: String,
}

/// One row of `docker images`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ImageSummary {
    pub repository: String,
    pub tag: String,
    pub image_id: String,
    /// Relative creation time as printed by docker (e.g. "2 days ago")
    pub created: String,
    pub size: String,
    pub digest: String,
}

/// Projection of `docker container inspect <container>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContainerDetail {
    pub id: String,
    /// Container name without docker's leading slash
    pub name: String,
    pub image: String,
    pub command: Vec<String>,
    pub created: Option<Timestamp>,
    pub status: String,
    pub platform: String,
    pub network_mode: String,
    pub restart_policy: String,
    pub labels: BTreeMap<String, String>,
    pub mounts: Vec<Mount>,
    pub network_settings: NetworkSettings,
    pub state: ContainerState,
    pub host_config: HostConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Mount {
    #[serde(rename = "type")]
    pub mount_type: String,
    pub source: String,
    pub destination: String,
    pub mode: String,
    pub rw: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NetworkSettings {
    pub ip_address: String,
    pub gateway: String,
    pub mac_address: String,
    pub network_name: String,
    pub endpoint_id: String,
    pub network_id: String,
    /// CIDR suffix such as `/16`, empty when unknown
    pub subnet_prefix: String,
    pub port_mappings: Vec<PortMapping>,
}

/// A published port as reported by `docker inspect`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PortMapping {
    pub container_port: String,
    pub host_ip: String,
    pub host_port: String,
    pub protocol: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContainerState {
    pub status: String,
    pub running: bool,
    pub paused: bool,
    pub restarting: bool,
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
    pub exit_code: i64,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HostConfig {
    pub auto_remove: bool,
    pub privileged: bool,
    pub publish_all_ports: bool,
    pub restart_policy: String,
    pub dns: Vec<String>,
    pub cap_add: Vec<String>,
    pub cap_drop: Vec<String>,
}

/// Projection of `docker image inspect <image>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ImageDetail {
    pub id: String,
    pub repo_tags: Vec<String>,
    pub repo_digests: Vec<String>,
    pub created: Option<Timestamp>,
    #[schemars(schema_with = "crate::api::schema::uint")]
    pub size: u64,
    #[schemars(schema_with = "crate::api::schema::uint")]
    pub virtual_size: u64,
    #[schemars(schema_with = "crate::api::schema::uint")]
    pub shared_size: u64,
    pub architecture: String,
    pub os: String,
    pub author: String,
    pub container: String,
    pub docker_version: String,
    pub labels: BTreeMap<String, String>,
    pub env: Vec<String>,
    pub cmd: Vec<String>,
    pub entrypoint: Vec<String>,
    pub working_dir: String,
    pub volumes: Vec<String>,
    pub exposed_ports: Vec<String>,
    pub layers: Vec<String>,
    pub history: Vec<ImageHistory>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ImageHistory {
    pub created: Option<Timestamp>,
    pub created_by: String,
    pub empty_layer: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
}

/// Result of `docker rmi`.
///
/// Docker refusals that are recognized (for example an image still used by a
/// running container) are reported in `errors` instead of failing the call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ImageDeleteResponse {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deleted: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub untagged: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Request to start a new container.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ContainerRunRequest {
    pub image: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ports: Vec<RunPortMapping>,
    #[serde(default)]
    pub volumes: Vec<VolumeMapping>,
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    /// Run detached (`-d`); defaults to true when omitted
    #[serde(default)]
    pub detached: Option<bool>,
    /// Restart policy: no, always, on-failure or unless-stopped
    #[serde(default)]
    pub restart: Option<String>,
    #[serde(default)]
    pub network: Option<String>,
    /// Command overriding the image default, one element per argument
    #[serde(default)]
    pub command: Vec<String>,
}

impl ContainerRunRequest {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Default::default()
        }
    }

    /// Whether the container runs detached (the default).
    pub fn is_detached(&self) -> bool {
        self.detached.unwrap_or(true)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RunPortMapping {
    #[serde(default)]
    pub host_port: String,
    pub container_port: String,
    /// tcp (default) or udp
    #[serde(default)]
    pub protocol: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct VolumeMapping {
    pub host_path: String,
    pub container_path: String,
    #[serde(default)]
    pub read_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ContainerRunResponse {
    pub container_id: String,
    pub name: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}
