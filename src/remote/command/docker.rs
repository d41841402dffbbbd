//! Docker command builders.

use crate::remote::error::CoreError;
use crate::remote::sanitize::{
    container_name, env_key, image_ref, network_name, port_spec, quote_literal, quote_path,
};
use crate::remote::types::{ContainerRunRequest, RunPortMapping, VolumeMapping};

/// Field separator used in every `--format` template below.
pub const FIELD_SEPARATOR: char = '|';

/// List all containers, one pipe-delimited row per container.
pub const LIST_CONTAINERS: &str = "docker ps -a --format \
     '{{.ID}}|{{.Image}}|{{.Command}}|{{.RunningFor}}|{{.Status}}|{{.Ports}}|{{.Names}}'";

/// List images, one pipe-delimited row per image.
pub const LIST_IMAGES: &str = "docker images --format \
     '{{.Repository}}|{{.Tag}}|{{.ID}}|{{.CreatedSince}}|{{.Size}}|{{.Digest}}'";

/// Restart policies accepted by `docker run --restart`.
pub const RESTART_POLICIES: &[&str] = &["no", "always", "on-failure", "unless-stopped"];

/// Sanitize a container or image identifier, rejecting values that sanitize to nothing.
fn identifier(raw: &str, what: &str) -> Result<String, CoreError> {
    let sanitized = image_ref(raw.trim());
    if sanitized.is_empty() {
        return Err(CoreError::validation(format!("{what} is required")));
    }
    Ok(sanitized)
}

pub fn inspect_container(container_id: &str) -> Result<String, CoreError> {
    let id = identifier(container_id, "container id")?;
    Ok(format!("docker container inspect {}", quote_literal(&id)))
}

pub fn inspect_image(image_id: &str) -> Result<String, CoreError> {
    let id = identifier(image_id, "image id")?;
    Ok(format!("docker image inspect {}", quote_literal(&id)))
}

pub fn remove_image(image_id: &str, force: bool) -> Result<String, CoreError> {
    let id = identifier(image_id, "image id")?;
    let flag = if force { " -f" } else { "" };
    Ok(format!("docker rmi{} {}", flag, quote_literal(&id)))
}

/// Query the state of a single container (`running`, `exited`, ...).
pub fn container_status(container_id: &str) -> Result<String, CoreError> {
    let id = identifier(container_id, "container id")?;
    Ok(format!(
        "docker container inspect --format '{{{{.State.Status}}}}' {}",
        quote_literal(&id)
    ))
}

/// Check a run request before any command is built.
pub fn validate_run_request(request: &ContainerRunRequest) -> Result<(), CoreError> {
    if request.image.trim().is_empty() {
        return Err(CoreError::validation("image is required"));
    }

    if let Some(policy) = request.restart.as_deref().map(str::trim)
        && !policy.is_empty()
        && !RESTART_POLICIES.contains(&policy)
    {
        return Err(CoreError::validation(format!(
            "invalid restart policy: {policy}"
        )));
    }

    for port in &request.ports {
        if port.container_port.trim().is_empty() {
            return Err(CoreError::validation(
                "container port is required for port mapping",
            ));
        }
        protocol_suffix(port)?;
    }

    for volume in &request.volumes {
        if volume.host_path.trim().is_empty() || volume.container_path.trim().is_empty() {
            return Err(CoreError::validation(
                "both host path and container path are required for volume mapping",
            ));
        }
    }

    for key in request.environment.keys() {
        if key.trim().is_empty() {
            return Err(CoreError::validation("environment variable key is required"));
        }
    }

    Ok(())
}

fn protocol_suffix(port: &RunPortMapping) -> Result<&'static str, CoreError> {
    match port
        .protocol
        .as_deref()
        .map(|p| p.trim().to_ascii_lowercase())
        .as_deref()
    {
        None | Some("") | Some("tcp") => Ok(""),
        Some("udp") => Ok("/udp"),
        Some(other) => Err(CoreError::validation(format!(
            "invalid port protocol: {other}"
        ))),
    }
}

fn port_flag(port: &RunPortMapping) -> Result<String, CoreError> {
    let container = port_spec(&port.container_port);
    if container.is_empty() {
        return Err(CoreError::validation(format!(
            "invalid container port: {}",
            port.container_port
        )));
    }

    let host = port_spec(&port.host_port);
    let suffix = protocol_suffix(port)?;
    Ok(if host.is_empty() {
        format!(" -p {container}{suffix}")
    } else {
        format!(" -p {host}:{container}{suffix}")
    })
}

fn volume_flag(volume: &VolumeMapping) -> String {
    let mode = if volume.read_only { ":ro" } else { "" };
    format!(
        " -v {}:{}{}",
        quote_path(volume.host_path.trim()),
        quote_path(volume.container_path.trim()),
        mode
    )
}

/// Build the `docker run` command for a validated request.
///
/// Flags are emitted in a fixed order: `-d`, `--name`, `--restart`,
/// `--network`, ports, volumes, environment, then the image and its
/// arguments, each argument quoted individually.
pub fn run_container(request: &ContainerRunRequest) -> Result<String, CoreError> {
    validate_run_request(request)?;

    let image = identifier(&request.image, "image")?;
    let mut command = String::from("docker run");

    if request.is_detached() {
        command.push_str(" -d");
    }

    if let Some(name) = request.name.as_deref() {
        let name = container_name(name);
        if !name.is_empty() {
            command.push_str(&format!(" --name {}", quote_literal(&name)));
        }
    }

    if let Some(policy) = request.restart.as_deref().map(str::trim)
        && !policy.is_empty()
    {
        command.push_str(&format!(" --restart={policy}"));
    }

    if let Some(network) = request.network.as_deref() {
        let network = network_name(network);
        if !network.is_empty() {
            command.push_str(&format!(" --network={network}"));
        }
    }

    for port in &request.ports {
        command.push_str(&port_flag(port)?);
    }

    for volume in &request.volumes {
        command.push_str(&volume_flag(volume));
    }

    for (key, value) in &request.environment {
        command.push_str(&format!(" -e {}={}", env_key(key.trim()), quote_literal(value)));
    }

    command.push(' ');
    command.push_str(&quote_literal(&image));

    for arg in &request.command {
        command.push(' ');
        command.push_str(&quote_literal(arg));
    }

    Ok(command)
}
