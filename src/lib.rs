pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::pipeline::XFormPipeline;
use crate::services::workspace::Workspace;
use axum::{
    Router,
    http::HeaderValue,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::xform::upload_form,
        api::handlers::xform::xform_test,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::xform::UploadForm,
            api::handlers::health::HealthResponse,
            models::PipelineResponse,
        )
    ),
    tags(
        (name = "xform", description = "Form conversion and validation"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<XFormPipeline>,
    pub workspace: Workspace,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(pipeline: Arc<XFormPipeline>, config: AppConfig) -> Self {
        Self {
            pipeline,
            workspace: Workspace::new(config.workspace_dir.clone()),
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/", get(api::handlers::xform::missing_form))
        .route(
            "/upload",
            post(api::handlers::xform::upload_form).layer(axum::extract::DefaultBodyLimit::max(
                state.config.max_file_size + 1024 * 1024, // Add 1MB for multipart overhead
            )),
        )
        .route("/xform_test/:filename", get(api::handlers::xform::xform_test))
        .route("/:filename", get(api::handlers::xform::xform_test))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
