//! Decoding of `docker inspect` and `docker image inspect` JSON.
//!
//! The output is decoded as an array and the first element is mapped
//! through raw structs whose fields all use lenient deserializers: a field
//! that is missing or has an unexpected type yields its zero value instead
//! of failing the whole document.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use crate::remote::types::{
    ContainerDetail, ContainerState, HostConfig, ImageDetail, ImageHistory, Mount,
    NetworkSettings, PortMapping, Timestamp,
};

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("invalid inspect output: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("inspect returned no results")]
    Empty,
}

/// Decode any value, mapping a type mismatch to `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Decode an array, keeping only the elements of the expected type.
fn lenient_items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Decode an object of strings, dropping non-string values.
fn lenient_string_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(entries) => entries
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::String(value) => Some((key, value)),
                _ => None,
            })
            .collect(),
        _ => BTreeMap::new(),
    })
}

/// Decode the keys of an object used as a set (`Volumes`, `ExposedPorts`).
fn lenient_keys<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(entries) => entries.into_iter().map(|(key, _)| key).collect(),
        _ => Vec::new(),
    })
}

/// Decode a non-negative size, accepting floats as docker sometimes emits them.
fn lenient_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or_default(),
        _ => 0,
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawContainer {
    #[serde(default, deserialize_with = "lenient")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    created: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    platform: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    config: Option<RawContainerConfig>,
    #[serde(default, deserialize_with = "lenient")]
    state: Option<RawState>,
    #[serde(default, deserialize_with = "lenient")]
    host_config: Option<RawHostConfig>,
    #[serde(default, deserialize_with = "lenient")]
    network_settings: Option<RawNetworkSettings>,
    #[serde(default, deserialize_with = "lenient_items")]
    mounts: Vec<RawMount>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawContainerConfig {
    #[serde(default, deserialize_with = "lenient")]
    image: Option<String>,
    #[serde(default, deserialize_with = "lenient_items")]
    cmd: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string_map")]
    labels: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawState {
    #[serde(default, deserialize_with = "lenient")]
    status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    running: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    paused: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    restarting: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    started_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    finished_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    exit_code: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawHostConfig {
    #[serde(default, deserialize_with = "lenient")]
    auto_remove: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    privileged: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    publish_all_ports: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    network_mode: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    restart_policy: Option<RawRestartPolicy>,
    #[serde(default, deserialize_with = "lenient_items")]
    dns: Vec<String>,
    #[serde(default, deserialize_with = "lenient_items")]
    cap_add: Vec<String>,
    #[serde(default, deserialize_with = "lenient_items")]
    cap_drop: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawRestartPolicy {
    #[serde(default, deserialize_with = "lenient")]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawNetworkSettings {
    #[serde(rename = "IPAddress", default, deserialize_with = "lenient")]
    ip_address: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    gateway: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    mac_address: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    ports: Option<BTreeMap<String, Value>>,
    #[serde(default, deserialize_with = "lenient")]
    networks: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawEndpoint {
    #[serde(rename = "IPAddress", default, deserialize_with = "lenient")]
    ip_address: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    gateway: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    mac_address: Option<String>,
    #[serde(rename = "EndpointID", default, deserialize_with = "lenient")]
    endpoint_id: Option<String>,
    #[serde(rename = "NetworkID", default, deserialize_with = "lenient")]
    network_id: Option<String>,
    #[serde(rename = "IPPrefixLen", default, deserialize_with = "lenient")]
    ip_prefix_len: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawPortBinding {
    #[serde(default, deserialize_with = "lenient")]
    host_ip: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    host_port: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawMount {
    #[serde(default, deserialize_with = "lenient")]
    r#type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    source: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    destination: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    mode: Option<String>,
    #[serde(rename = "RW", default, deserialize_with = "lenient")]
    rw: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawImage {
    #[serde(default, deserialize_with = "lenient")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_items")]
    repo_tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_items")]
    repo_digests: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    created: Option<String>,
    #[serde(default, deserialize_with = "lenient_size")]
    size: u64,
    #[serde(default, deserialize_with = "lenient_size")]
    virtual_size: u64,
    #[serde(default, deserialize_with = "lenient_size")]
    shared_size: u64,
    #[serde(default, deserialize_with = "lenient")]
    architecture: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    os: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    author: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    container: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    docker_version: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    config: Option<RawImageConfig>,
    #[serde(rename = "RootFS", default, deserialize_with = "lenient")]
    root_fs: Option<RawRootFs>,
    #[serde(default, deserialize_with = "lenient_items")]
    history: Vec<RawHistory>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawImageConfig {
    #[serde(default, deserialize_with = "lenient_string_map")]
    labels: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "lenient_items")]
    env: Vec<String>,
    #[serde(default, deserialize_with = "lenient_items")]
    cmd: Vec<String>,
    #[serde(default, deserialize_with = "lenient_items")]
    entrypoint: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    working_dir: Option<String>,
    #[serde(default, deserialize_with = "lenient_keys")]
    volumes: Vec<String>,
    #[serde(default, deserialize_with = "lenient_keys")]
    exposed_ports: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawRootFs {
    #[serde(default, deserialize_with = "lenient_items")]
    layers: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawHistory {
    #[serde(default, deserialize_with = "lenient")]
    created: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    created_by: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    empty_layer: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    comment: Option<String>,
}

/// Decode the inspect array and map its first element.
fn first_result<T: DeserializeOwned>(output: &str) -> Result<T, InspectError> {
    let results: Vec<Value> = serde_json::from_str(output.trim())?;
    let first = results.into_iter().next().ok_or(InspectError::Empty)?;
    Ok(serde_json::from_value(first)?)
}

fn timestamp(raw: Option<String>) -> Option<Timestamp> {
    raw.as_deref().and_then(Timestamp::from_rfc3339)
}

/// Parse `docker container inspect <container>` output.
pub fn container_detail(output: &str) -> Result<ContainerDetail, InspectError> {
    let raw: RawContainer = first_result(output)?;

    let config = raw.config.unwrap_or_default();
    let state = raw.state.unwrap_or_default();
    let host = raw.host_config.unwrap_or_default();
    let restart_policy = host
        .restart_policy
        .and_then(|policy| policy.name)
        .unwrap_or_default();
    let status = state.status.clone().unwrap_or_default();

    Ok(ContainerDetail {
        id: raw.id.unwrap_or_default(),
        name: raw
            .name
            .map(|name| name.trim_start_matches('/').to_string())
            .unwrap_or_default(),
        image: config.image.unwrap_or_default(),
        command: config.cmd,
        created: timestamp(raw.created),
        status,
        platform: raw.platform.unwrap_or_default(),
        network_mode: host.network_mode.unwrap_or_default(),
        restart_policy: restart_policy.clone(),
        labels: config.labels,
        mounts: raw.mounts.into_iter().map(mount).collect(),
        network_settings: raw
            .network_settings
            .map(network_settings)
            .unwrap_or_default(),
        state: ContainerState {
            status: state.status.unwrap_or_default(),
            running: state.running.unwrap_or_default(),
            paused: state.paused.unwrap_or_default(),
            restarting: state.restarting.unwrap_or_default(),
            started_at: timestamp(state.started_at),
            finished_at: timestamp(state.finished_at),
            exit_code: state.exit_code.unwrap_or_default(),
            error: state.error.unwrap_or_default(),
        },
        host_config: HostConfig {
            auto_remove: host.auto_remove.unwrap_or_default(),
            privileged: host.privileged.unwrap_or_default(),
            publish_all_ports: host.publish_all_ports.unwrap_or_default(),
            restart_policy,
            dns: host.dns,
            cap_add: host.cap_add,
            cap_drop: host.cap_drop,
        },
    })
}

fn mount(raw: RawMount) -> Mount {
    Mount {
        mount_type: raw.r#type.unwrap_or_default(),
        source: raw.source.unwrap_or_default(),
        destination: raw.destination.unwrap_or_default(),
        mode: raw.mode.unwrap_or_default(),
        rw: raw.rw.unwrap_or_default(),
    }
}

/// Flatten network settings, taking endpoint details from the first attached network.
fn network_settings(raw: RawNetworkSettings) -> NetworkSettings {
    let mut settings = NetworkSettings {
        ip_address: raw.ip_address.unwrap_or_default(),
        gateway: raw.gateway.unwrap_or_default(),
        mac_address: raw.mac_address.unwrap_or_default(),
        ..Default::default()
    };

    for (container_port, bindings) in raw.ports.unwrap_or_default() {
        let Value::Array(bindings) = bindings else {
            // Exposed but unpublished ports map to null
            continue;
        };
        let protocol = container_port
            .split_once('/')
            .map(|(_, protocol)| protocol.to_string())
            .unwrap_or_default();
        for binding in bindings {
            let Ok(binding) = serde_json::from_value::<RawPortBinding>(binding) else {
                continue;
            };
            settings.port_mappings.push(PortMapping {
                container_port: container_port.clone(),
                host_ip: binding.host_ip.unwrap_or_default(),
                host_port: binding.host_port.unwrap_or_default(),
                protocol: protocol.clone(),
            });
        }
    }

    if let Some((name, endpoint)) = raw.networks.unwrap_or_default().into_iter().next() {
        settings.network_name = name;
        let endpoint: RawEndpoint = serde_json::from_value(endpoint).unwrap_or_default();

        let overrides = [
            (&mut settings.ip_address, endpoint.ip_address),
            (&mut settings.gateway, endpoint.gateway),
            (&mut settings.mac_address, endpoint.mac_address),
        ];
        for (field, value) in overrides {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                *field = value;
            }
        }

        settings.endpoint_id = endpoint.endpoint_id.unwrap_or_default();
        settings.network_id = endpoint.network_id.unwrap_or_default();
        settings.subnet_prefix = endpoint
            .ip_prefix_len
            .filter(|len| *len > 0)
            .map(|len| format!("/{len}"))
            .unwrap_or_default();
    }

    settings
}

/// Parse `docker image inspect <image>` output.
pub fn image_detail(output: &str) -> Result<ImageDetail, InspectError> {
    let raw: RawImage = first_result(output)?;
    let config = raw.config.unwrap_or_default();

    Ok(ImageDetail {
        id: raw.id.unwrap_or_default(),
        repo_tags: raw.repo_tags,
        repo_digests: raw.repo_digests,
        created: timestamp(raw.created),
        size: raw.size,
        virtual_size: raw.virtual_size,
        shared_size: raw.shared_size,
        architecture: raw.architecture.unwrap_or_default(),
        os: raw.os.unwrap_or_default(),
        author: raw.author.unwrap_or_default(),
        container: raw.container.unwrap_or_default(),
        docker_version: raw.docker_version.unwrap_or_default(),
        labels: config.labels,
        env: config.env,
        cmd: config.cmd,
        entrypoint: config.entrypoint,
        working_dir: config.working_dir.unwrap_or_default(),
        volumes: config.volumes,
        exposed_ports: config.exposed_ports,
        layers: raw.root_fs.map(|fs| fs.layers).unwrap_or_default(),
        history: raw
            .history
            .into_iter()
            .map(|h| ImageHistory {
                created: timestamp(h.created),
                created_by: h.created_by.unwrap_or_default(),
                empty_layer: h.empty_layer.unwrap_or_default(),
                comment: h.comment.unwrap_or_default(),
            })
            .collect(),
    })
}
