//! HTTP API.
//!
//! `POST /login` and `GET /docs/schema` are public; every other route
//! requires a bearer token issued by login. Handlers delegate to the
//! session-bound facades in [`crate::remote::service`].

pub mod auth;
mod error;
mod handlers;
pub mod schema;
pub mod token;

use std::sync::Arc;

use poem::middleware::Tracing;
use poem::{Endpoint, EndpointExt, Route, get, post};

use crate::config::AppConfig;
use crate::remote::service::Services;
use crate::remote::storage::SessionDirectory;

pub use token::TokenService;

/// Shared state available to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub directory: Arc<dyn SessionDirectory>,
    pub services: Services,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(config: AppConfig, directory: Arc<dyn SessionDirectory>) -> Self {
        Self {
            tokens: TokenService::new(&config.jwt_secret, config.jwt_expires),
            services: Services::new(directory.clone()),
            directory,
            config: Arc::new(config),
        }
    }
}

/// Build the router with tracing and shared state attached.
pub fn routes(state: AppState) -> impl Endpoint {
    Route::new()
        .at("/login", post(auth::login))
        .at("/logout", post(auth::logout))
        .at("/docs/schema", get(schema::schemas))
        .at("/server-details", get(handlers::server_details))
        .at("/server-details/cpu-info", get(handlers::cpu_info))
        .at("/server-details/disk-usage", get(handlers::disk_usage))
        .at("/server-details/running-processes", get(handlers::running_processes))
        .at("/server-details/libraries", get(handlers::libraries))
        .at("/docker/containers", get(handlers::list_containers))
        .at("/docker/container/:container_id", get(handlers::container_detail))
        .at("/docker/images", get(handlers::list_images))
        .at("/docker/image/run", post(handlers::run_container))
        .at(
            "/docker/image/:image_id",
            get(handlers::image_detail).delete(handlers::delete_image),
        )
        .at("/filesystem/list", get(handlers::list_filesystem))
        .at("/filesystem/details", get(handlers::file_details))
        .at("/filesystem/search", get(handlers::search_files))
        .data(state)
        .with(Tracing)
}
