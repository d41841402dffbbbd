//! Protected endpoints, one per facade operation.

use poem::http::StatusCode;
use poem::web::{Data, Json, Path, Query};
use poem::{IntoResponse, handler};
use serde::Deserialize;

use super::AppState;
use super::auth::AuthSession;
use crate::remote::error::CoreError;
use crate::remote::types::{
    ContainerDetail, ContainerRunRequest, ContainerSummary, CpuInfo, DiskUsage, FileSystemEntry,
    FileSystemListing, ImageDeleteResponse, ImageDetail, ImageSummary, PackageInfo, ProcessInfo,
    ServerDetails,
};

/// Parse a boolean query flag; unrecognized values are false.
fn flag(raw: Option<&str>) -> bool {
    matches!(
        raw.map(str::trim),
        Some("1" | "t" | "T" | "true" | "TRUE" | "True")
    )
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    path: Option<String>,
    recursive: Option<String>,
    include_hidden: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DetailsQuery {
    path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    path: Option<String>,
    pattern: Option<String>,
    max_depth: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    force: Option<String>,
}

#[handler]
pub async fn server_details(
    state: Data<&AppState>,
    auth: AuthSession,
) -> poem::Result<Json<ServerDetails>> {
    Ok(Json(state.services.system.server_details(&auth.session_id).await?))
}

#[handler]
pub async fn cpu_info(state: Data<&AppState>, auth: AuthSession) -> poem::Result<Json<Vec<CpuInfo>>> {
    Ok(Json(state.services.system.cpu_info(&auth.session_id).await?))
}

#[handler]
pub async fn disk_usage(
    state: Data<&AppState>,
    auth: AuthSession,
) -> poem::Result<Json<Vec<DiskUsage>>> {
    Ok(Json(state.services.system.disk_usage(&auth.session_id).await?))
}

#[handler]
pub async fn running_processes(
    state: Data<&AppState>,
    auth: AuthSession,
) -> poem::Result<Json<Vec<ProcessInfo>>> {
    Ok(Json(state.services.system.processes(&auth.session_id).await?))
}

#[handler]
pub async fn libraries(
    state: Data<&AppState>,
    auth: AuthSession,
) -> poem::Result<Json<Vec<PackageInfo>>> {
    Ok(Json(state.services.system.packages(&auth.session_id).await?))
}

#[handler]
pub async fn list_containers(
    state: Data<&AppState>,
    auth: AuthSession,
) -> poem::Result<Json<Vec<ContainerSummary>>> {
    Ok(Json(state.services.docker.list_containers(&auth.session_id).await?))
}

#[handler]
pub async fn container_detail(
    state: Data<&AppState>,
    auth: AuthSession,
    Path(container_id): Path<String>,
) -> poem::Result<Json<ContainerDetail>> {
    Ok(Json(
        state
            .services
            .docker
            .container_detail(&auth.session_id, &container_id)
            .await?,
    ))
}

#[handler]
pub async fn list_images(
    state: Data<&AppState>,
    auth: AuthSession,
) -> poem::Result<Json<Vec<ImageSummary>>> {
    Ok(Json(state.services.docker.list_images(&auth.session_id).await?))
}

#[handler]
pub async fn image_detail(
    state: Data<&AppState>,
    auth: AuthSession,
    Path(image_id): Path<String>,
) -> poem::Result<Json<ImageDetail>> {
    Ok(Json(
        state
            .services
            .docker
            .image_detail(&auth.session_id, &image_id)
            .await?,
    ))
}

#[handler]
pub async fn delete_image(
    state: Data<&AppState>,
    auth: AuthSession,
    Path(image_id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> poem::Result<Json<ImageDeleteResponse>> {
    let force = flag(query.force.as_deref());
    Ok(Json(
        state
            .services
            .docker
            .delete_image(&auth.session_id, &image_id, force)
            .await?,
    ))
}

#[handler]
pub async fn run_container(
    state: Data<&AppState>,
    auth: AuthSession,
    Json(request): Json<ContainerRunRequest>,
) -> poem::Result<impl IntoResponse> {
    let response = state
        .services
        .docker
        .run_container(&auth.session_id, &request)
        .await?;
    Ok(Json(response).with_status(StatusCode::CREATED))
}

#[handler]
pub async fn list_filesystem(
    state: Data<&AppState>,
    auth: AuthSession,
    Query(query): Query<ListQuery>,
) -> poem::Result<Json<FileSystemListing>> {
    let listing = state
        .services
        .filesystem
        .list(
            &auth.session_id,
            query.path.as_deref().unwrap_or_default(),
            flag(query.recursive.as_deref()),
            flag(query.include_hidden.as_deref()),
        )
        .await?;
    Ok(Json(listing))
}

#[handler]
pub async fn file_details(
    state: Data<&AppState>,
    auth: AuthSession,
    Query(query): Query<DetailsQuery>,
) -> poem::Result<Json<FileSystemEntry>> {
    let path = query
        .path
        .filter(|path| !path.trim().is_empty())
        .ok_or_else(|| CoreError::validation("path is required"))?;
    Ok(Json(
        state
            .services
            .filesystem
            .details(&auth.session_id, &path)
            .await?,
    ))
}

#[handler]
pub async fn search_files(
    state: Data<&AppState>,
    auth: AuthSession,
    Query(query): Query<SearchQuery>,
) -> poem::Result<Json<Vec<FileSystemEntry>>> {
    let pattern = query
        .pattern
        .filter(|pattern| !pattern.is_empty())
        .ok_or_else(|| CoreError::validation("search pattern is required"))?;
    let max_depth = query
        .max_depth
        .as_deref()
        .and_then(|depth| depth.trim().parse::<i64>().ok());

    Ok(Json(
        state
            .services
            .filesystem
            .search(
                &auth.session_id,
                query.path.as_deref().unwrap_or_default(),
                &pattern,
                max_depth,
            )
            .await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_values() {
        for truthy in ["1", "t", "T", "true", "TRUE", "True", " true "] {
            assert!(flag(Some(truthy)), "{truthy}");
        }
        for falsy in ["0", "false", "yes", ""] {
            assert!(!flag(Some(falsy)), "{falsy}");
        }
        assert!(!flag(None));
    }
}
