//! JSON Schemas of the response records.
//!
//! Schemas use plain JSON Schema types without Rust-specific formats like
//! "uint", so generic clients can consume them.

use std::collections::BTreeMap;

use poem::handler;
use poem::web::Json;
use schemars::{Schema, SchemaGenerator, json_schema};

use super::auth::{LoginRequest, LoginResponse, MessageResponse};
use crate::remote::types::{
    ContainerDetail, ContainerRunRequest, ContainerRunResponse, ContainerSummary, CpuInfo,
    DiskUsage, FileSystemEntry, FileSystemListing, ImageDeleteResponse, ImageDetail, ImageSummary,
    PackageInfo, ProcessInfo, ServerDetails,
};

/// Unsigned integer schema: `{"type": "integer", "minimum": 0}`
///
/// Use with `#[schemars(schema_with = "crate::api::schema::uint")]` on unsigned fields.
pub fn uint(_generator: &mut SchemaGenerator) -> Schema {
    json_schema!({
        "type": "integer",
        "minimum": 0
    })
}

fn schema<T: schemars::JsonSchema>() -> Schema {
    SchemaGenerator::default().into_root_schema_for::<T>()
}

/// Schemas keyed by record name.
pub fn catalog() -> BTreeMap<&'static str, Schema> {
    BTreeMap::from([
        ("LoginRequest", schema::<LoginRequest>()),
        ("LoginResponse", schema::<LoginResponse>()),
        ("MessageResponse", schema::<MessageResponse>()),
        ("ServerDetails", schema::<ServerDetails>()),
        ("CpuInfo", schema::<Vec<CpuInfo>>()),
        ("DiskUsage", schema::<Vec<DiskUsage>>()),
        ("ProcessInfo", schema::<Vec<ProcessInfo>>()),
        ("PackageInfo", schema::<Vec<PackageInfo>>()),
        ("ContainerSummary", schema::<Vec<ContainerSummary>>()),
        ("ContainerDetail", schema::<ContainerDetail>()),
        ("ImageSummary", schema::<Vec<ImageSummary>>()),
        ("ImageDetail", schema::<ImageDetail>()),
        ("ImageDeleteResponse", schema::<ImageDeleteResponse>()),
        ("ContainerRunRequest", schema::<ContainerRunRequest>()),
        ("ContainerRunResponse", schema::<ContainerRunResponse>()),
        ("FileSystemListing", schema::<FileSystemListing>()),
        ("FileSystemEntry", schema::<FileSystemEntry>()),
    ])
}

#[handler]
pub async fn schemas() -> Json<BTreeMap<&'static str, Schema>> {
    Json(catalog())
}
