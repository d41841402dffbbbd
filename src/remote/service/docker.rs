//! Container and image operations.

use tracing::{info, warn};

use super::{SessionRunner, run, run_stdout};
use crate::remote::command::docker as command;
use crate::remote::error::{CoreError, DockerOutcome, classify_docker_error, is_in_use_line, reclassify_not_found};
use crate::remote::parse::{InspectError, docker as parse, inspect};
use crate::remote::sanitize::container_name;
use crate::remote::types::{
    ContainerDetail, ContainerRunRequest, ContainerRunResponse, ContainerSummary, ImageDeleteResponse,
    ImageDetail, ImageSummary,
};

/// Status reported when a started container cannot be inspected.
const FALLBACK_RUN_STATUS: &str = "created";
/// Status reported for attached runs, which return once the container stops.
const ATTACHED_RUN_STATUS: &str = "exited";

#[derive(Clone)]
pub struct DockerService {
    runner: SessionRunner,
}

impl DockerService {
    pub fn new(runner: SessionRunner) -> Self {
        Self { runner }
    }

    pub async fn list_containers(&self, session_id: &str) -> Result<Vec<ContainerSummary>, CoreError> {
        let session = self.runner.session(session_id)?;
        let output = run_stdout(&session, command::LIST_CONTAINERS).await?;
        Ok(parse::containers(&output))
    }

    pub async fn container_detail(
        &self,
        session_id: &str,
        container_id: &str,
    ) -> Result<ContainerDetail, CoreError> {
        let session = self.runner.session(session_id)?;
        let cmd = command::inspect_container(container_id)?;
        let what = format!("container {container_id}");

        let output = run_stdout(&session, &cmd)
            .await
            .map_err(|e| reclassify_not_found(e, what.clone()))?;
        inspect::container_detail(&output).map_err(|e| inspect_error(e, "container inspect output", what))
    }

    pub async fn list_images(&self, session_id: &str) -> Result<Vec<ImageSummary>, CoreError> {
        let session = self.runner.session(session_id)?;
        let output = run_stdout(&session, command::LIST_IMAGES).await?;
        Ok(parse::images(&output))
    }

    pub async fn image_detail(&self, session_id: &str, image_id: &str) -> Result<ImageDetail, CoreError> {
        let session = self.runner.session(session_id)?;
        let cmd = command::inspect_image(image_id)?;
        let what = format!("image {image_id}");

        let output = run_stdout(&session, &cmd)
            .await
            .map_err(|e| reclassify_not_found(e, what.clone()))?;
        inspect::image_detail(&output).map_err(|e| inspect_error(e, "image inspect output", what))
    }

    /// Remove an image.
    ///
    /// Conflicts such as an image still used by a container are reported in
    /// [`ImageDeleteResponse::errors`] rather than failing the call.
    pub async fn delete_image(
        &self,
        session_id: &str,
        image_id: &str,
        force: bool,
    ) -> Result<ImageDeleteResponse, CoreError> {
        let session = self.runner.session(session_id)?;
        let cmd = command::remove_image(image_id, force)?;

        match run(&session, &cmd).await {
            Ok(output) => {
                let mut response = parse::image_delete(&output.stdout);
                response.errors.extend(
                    output
                        .stderr
                        .lines()
                        .map(str::trim)
                        .filter(|line| is_in_use_line(line))
                        .map(str::to_string),
                );
                info!(
                    "Removed image {}: {} untagged, {} deleted",
                    image_id,
                    response.untagged.len(),
                    response.deleted.len()
                );
                Ok(response)
            }
            Err(err) => {
                let stderr = err.remote_stderr().unwrap_or_default().trim().to_string();
                match classify_docker_error(&stderr) {
                    DockerOutcome::NotFound => Err(CoreError::not_found(format!("image {image_id}"))),
                    DockerOutcome::InUse => {
                        warn!("Image {} is in use: {}", image_id, stderr);
                        Ok(ImageDeleteResponse {
                            errors: conflict_lines(&stderr),
                            ..Default::default()
                        })
                    }
                    DockerOutcome::Unrecognized => Err(err),
                }
            }
        }
    }

    /// Start a container.
    ///
    /// Detached runs report the new container's ID and its state right after
    /// start; attached runs return once the container has stopped.
    pub async fn run_container(
        &self,
        session_id: &str,
        request: &ContainerRunRequest,
    ) -> Result<ContainerRunResponse, CoreError> {
        let cmd = command::run_container(request)?;
        let session = self.runner.session(session_id)?;
        let what = format!("image {}", request.image);

        let output = run(&session, &cmd)
            .await
            .map_err(|e| reclassify_not_found(e, what))?;

        let name = request
            .name
            .as_deref()
            .map(container_name)
            .unwrap_or_default();
        let warnings = parse::run_warnings(&output.stderr);

        if !request.is_detached() {
            return Ok(ContainerRunResponse {
                container_id: String::new(),
                name,
                status: ATTACHED_RUN_STATUS.to_string(),
                warnings,
            });
        }

        let container_id = parse::run_container_id(&output.stdout)
            .ok_or_else(|| CoreError::parse("docker run output", "no container id printed"))?;

        let status = match command::container_status(&container_id) {
            Ok(status_cmd) => match run_stdout(&session, &status_cmd).await {
                Ok(status) if !status.trim().is_empty() => status.trim().to_string(),
                Ok(_) => FALLBACK_RUN_STATUS.to_string(),
                Err(e) => {
                    warn!("Could not read status of container {}: {}", container_id, e);
                    FALLBACK_RUN_STATUS.to_string()
                }
            },
            Err(_) => FALLBACK_RUN_STATUS.to_string(),
        };

        info!("Started container {} from {} ({})", container_id, request.image, status);

        Ok(ContainerRunResponse {
            container_id,
            name,
            status,
            warnings,
        })
    }
}

fn inspect_error(error: InspectError, context: &str, what: String) -> CoreError {
    match error {
        InspectError::Empty => CoreError::not_found(what),
        InspectError::Decode(e) => CoreError::parse(context, e),
    }
}

/// The in-use lines of a failed `docker rmi`, or its whole stderr when none match alone.
fn conflict_lines(stderr: &str) -> Vec<String> {
    let lines: Vec<String> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| is_in_use_line(line))
        .map(str::to_string)
        .collect();
    if lines.is_empty() { vec![stderr.to_string()] } else { lines }
}
