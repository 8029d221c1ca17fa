//! HTTP surface for the CodeConnect resource hierarchy.
//!
//! # Responsibility
//! - Route JSON requests onto the lifecycle service.
//! - Resolve the principal through an [`IdentityGate`] before any handler
//!   body runs.
//! - Keep the `{ error }` contract for every failure.
//!
//! # Invariants
//! - The service lock is never held across an await point.
//! - Unauthenticated requests never reach the service.

pub mod config;
pub mod error;
pub mod identity;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use codeconnect_core::{
    InMemoryResourceStore, Organization, Project, ProjectFile, ResourceService, ResourceStore,
    SqliteResourceStore, StoreResult,
};
use log::info;
use serde::{Deserialize, Serialize};

pub use config::{ConfigError, ConfigLayer, ConfigLoader, ServerConfig, StoreBackend};
pub use error::{ApiError, ErrorBody};
pub use identity::{Authenticated, IdentityGate, TrustedHeaderGate};

pub type DynStore = Box<dyn ResourceStore + Send>;
pub type SharedService = Arc<Mutex<ResourceService<DynStore>>>;

#[derive(Clone)]
pub struct AppState {
    service: SharedService,
    gate: Arc<dyn IdentityGate>,
}

impl AppState {
    pub fn new(store: DynStore, gate: Arc<dyn IdentityGate>) -> Self {
        Self {
            service: Arc::new(Mutex::new(ResourceService::new(store))),
            gate,
        }
    }

    fn lock_service(&self) -> Result<MutexGuard<'_, ResourceService<DynStore>>, ApiError> {
        self.service
            .lock()
            .map_err(|_| error::internal("resource service lock poisoned"))
    }
}

// An absent or null `name` reaches the service as empty and fails its
// validation message, not the body parser.
#[derive(Debug, Deserialize)]
struct CreateOrganizationRequest {
    name: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateProjectRequest {
    name: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateFileRequest {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SaveFileRequest {
    content: String,
}

#[derive(Debug, Serialize)]
struct OrganizationsBody {
    organizations: Vec<Organization>,
}

#[derive(Debug, Serialize)]
struct OrganizationBody {
    organization: Organization,
}

#[derive(Debug, Serialize)]
struct ProjectsBody {
    projects: Vec<Project>,
}

#[derive(Debug, Serialize)]
struct ProjectBody {
    project: Project,
}

#[derive(Debug, Serialize)]
struct FilesBody {
    files: Vec<ProjectFile>,
}

#[derive(Debug, Serialize)]
struct FileBody {
    file: ProjectFile,
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Builds the full route table over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/organizations",
            get(list_organizations).post(create_organization),
        )
        .route(
            "/organizations/{org_id}/projects",
            get(list_projects).post(create_project),
        )
        .route(
            "/organizations/{org_id}/projects/{project_id}/files",
            get(list_files).post(create_file),
        )
        .route(
            "/organizations/{org_id}/projects/{project_id}/files/{file_id}",
            put(save_file),
        )
        .with_state(state)
}

/// Opens the configured store backend.
pub fn build_store(config: &ServerConfig) -> StoreResult<DynStore> {
    let store: DynStore = match config.store {
        StoreBackend::Memory => Box::new(InMemoryResourceStore::new()),
        StoreBackend::Sqlite => Box::new(SqliteResourceStore::open(&config.sqlite_path)?),
    };
    info!(
        "event=store_open module=server status=ok backend={}",
        config.store.as_str()
    );
    Ok(store)
}

/// Serves the API until the listener fails.
pub async fn serve(config: &ServerConfig) -> anyhow::Result<()> {
    let store = build_store(config).context("open resource store failed")?;
    let app = router(AppState::new(store, Arc::new(TrustedHeaderGate)));

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .context("bind server listener failed")?;
    let local: SocketAddr = listener
        .local_addr()
        .context("read listener address failed")?;
    info!("event=server_listen module=server status=ok addr={local}");
    axum::serve(listener, app)
        .await
        .context("server terminated with error")
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": codeconnect_core::core_version(),
    }))
}

async fn list_organizations(
    Authenticated(principal): Authenticated,
    State(state): State<AppState>,
) -> ApiResult<OrganizationsBody> {
    let organizations = state
        .lock_service()?
        .list_organizations(&principal)
        .map_err(error::map_service_error)?;
    Ok(Json(OrganizationsBody { organizations }))
}

async fn create_organization(
    Authenticated(principal): Authenticated,
    State(state): State<AppState>,
    payload: Result<Json<CreateOrganizationRequest>, JsonRejection>,
) -> ApiResult<OrganizationBody> {
    let Json(payload) = payload.map_err(error::map_json_rejection)?;
    let organization = state
        .lock_service()?
        .create_organization(
            &principal,
            &payload.name.unwrap_or_default(),
            payload.description.as_deref(),
        )
        .map_err(error::map_service_error)?;
    Ok(Json(OrganizationBody { organization }))
}

async fn list_projects(
    Authenticated(principal): Authenticated,
    State(state): State<AppState>,
    Path(org_id): Path<String>,
) -> ApiResult<ProjectsBody> {
    let projects = state
        .lock_service()?
        .list_projects(&principal, &org_id)
        .map_err(error::map_service_error)?;
    Ok(Json(ProjectsBody { projects }))
}

async fn create_project(
    Authenticated(principal): Authenticated,
    State(state): State<AppState>,
    Path(org_id): Path<String>,
    payload: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> ApiResult<ProjectBody> {
    let Json(payload) = payload.map_err(error::map_json_rejection)?;
    let project = state
        .lock_service()?
        .create_project(
            &principal,
            &org_id,
            &payload.name.unwrap_or_default(),
            payload.description.as_deref(),
        )
        .map_err(error::map_service_error)?;
    Ok(Json(ProjectBody { project }))
}

async fn list_files(
    Authenticated(principal): Authenticated,
    State(state): State<AppState>,
    Path((org_id, project_id)): Path<(String, String)>,
) -> ApiResult<FilesBody> {
    let files = state
        .lock_service()?
        .list_files(&principal, &org_id, &project_id)
        .map_err(error::map_service_error)?;
    Ok(Json(FilesBody { files }))
}

async fn create_file(
    Authenticated(principal): Authenticated,
    State(state): State<AppState>,
    Path((org_id, project_id)): Path<(String, String)>,
    payload: Result<Json<CreateFileRequest>, JsonRejection>,
) -> ApiResult<FileBody> {
    let Json(payload) = payload.map_err(error::map_json_rejection)?;
    let file = state
        .lock_service()?
        .create_file(
            &principal,
            &org_id,
            &project_id,
            &payload.name.unwrap_or_default(),
        )
        .map_err(error::map_service_error)?;
    Ok(Json(FileBody { file }))
}

async fn save_file(
    Authenticated(principal): Authenticated,
    State(state): State<AppState>,
    Path((org_id, project_id, file_id)): Path<(String, String, String)>,
    payload: Result<Json<SaveFileRequest>, JsonRejection>,
) -> ApiResult<FileBody> {
    let Json(payload) = payload.map_err(error::map_json_rejection)?;
    let file = state
        .lock_service()?
        .save_file_content(&principal, &org_id, &project_id, &file_id, &payload.content)
        .map_err(error::map_service_error)?;
    Ok(Json(FileBody { file }))
}
