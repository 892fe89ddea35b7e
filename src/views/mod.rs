pub mod documents;
mod openapi;

#[cfg(test)]
mod test_app;

use ::core::str;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::ServiceExt;
use axum::extract::DefaultBodyLimit;
use axum::extract::Json;
use axum::extract::Request;
use axum::extract::State;
use axum::middleware::Next;
use axum::response::Response;
use chrono::Duration;
use docstore_derive::ServiceError;
use docstore_models::Db;
use docstore_models::User;
use docstore_storage::AuditLog;
use docstore_storage::ContentStore;
use docstore_storage::DocumentLocks;
use thiserror::Error;
use tokio::time::timeout;
use tower::Layer as _;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::normalize_path::NormalizePath;
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use common::Version;
pub use openapi::ApiDoc;

use crate::error::Result;

fn service_router() -> Router<AppState> {
    use axum::routing::get;
    use axum::routing::post;

    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .nest(
            "/documents",
            Router::new()
                .route("/", get(documents::list).post(documents::create))
                .route(
                    "/{document_id}",
                    get(documents::get)
                        .patch(documents::patch)
                        .put(documents::put)
                        .delete(documents::delete),
                )
                .route("/{document_id}/share", post(documents::share))
                .route("/{document_id}/download", post(documents::download)),
        )
}

/// Represents the bundle of information about the issuer of a request
/// that can be extracted from recognized headers.
#[derive(Debug, Clone)]
pub enum Authentication {
    /// The issuer of the request did not provide any authentication information.
    Unauthenticated,
    /// The issuer of the request provided the 'x-remote-user-identity' header.
    Authenticated(User),
}

impl Authentication {
    /// The resolved caller, or `Unauthorized` if the request carried no
    /// identity. Must gate every handler before any core logic runs.
    pub fn authenticated_user(&self) -> Result<&User, AuthorizationError> {
        match self {
            Authentication::Unauthenticated => Err(AuthorizationError::Unauthorized),
            Authentication::Authenticated(user) => Ok(user),
        }
    }
}

pub type AuthenticationExt = axum::extract::Extension<Authentication>;

fn authenticate(headers: &axum::http::HeaderMap, db: &Db) -> Authentication {
    const IDENTITY: &str = "x-remote-user-identity";
    const NAME: &str = "x-remote-user-name";

    let identity = headers.get(IDENTITY).map(|hv| {
        str::from_utf8(hv.as_bytes())
            .expect("unexpected non-utf8 characters in x-remote-user-identity")
            .to_owned()
    });
    let name = headers.get(NAME).map(|hv| {
        str::from_utf8(hv.as_bytes())
            .expect("unexpected non-utf8 characters in x-remote-user-name")
            .to_owned()
    });

    match identity {
        None => Authentication::Unauthenticated,
        Some(identity) => {
            // Identities are resolved upstream; unknown ones are registered
            // on first sight.
            let user = User::ensure(db, &identity, &name.unwrap_or_default());
            Authentication::Authenticated(user)
        }
    }
}

async fn authentication_middleware(
    State(AppState { db, .. }): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let authentication = authenticate(req.headers(), &db);
    req.extensions_mut().insert(authentication);
    Ok(next.run(req).await)
}

#[derive(Debug, Error, ServiceError)]
#[service_error(base_id = "authz")]
pub enum AuthorizationError {
    #[error("Unauthorized, the request must carry a resolved user identity")]
    #[service_error(status = 401)]
    Unauthorized,
}

#[derive(Debug, Error, ServiceError)]
#[service_error(base_id = "app_health")]
pub enum AppHealthError {
    #[error("Timeout error")]
    Timeout,
    #[error(transparent)]
    Storage(#[from] docstore_storage::StorageError),
}

#[utoipa::path(
    get, path = "/health",
    responses(
        (status = 200, description = "Check if docstore is running correctly", body = String)
    )
)]
async fn health(
    State(AppState {
        content,
        health_check_timeout,
        ..
    }): State<AppState>,
) -> Result<&'static str> {
    timeout(
        health_check_timeout
            .to_std()
            .expect("timeout should be valid at this point"),
        check_health(content),
    )
    .await
    .map_err(|_| AppHealthError::Timeout)??;
    Ok("ok")
}

pub async fn check_health(content: Arc<ContentStore>) -> Result<()> {
    // The storage root must exist and be listable for any blob operation to
    // succeed.
    tokio::fs::create_dir_all(content.root())
        .await
        .map_err(|e| AppHealthError::Storage(e.into()))?;
    tokio::fs::read_dir(content.root())
        .await
        .map_err(|e| AppHealthError::Storage(e.into()))?;
    Ok(())
}

#[utoipa::path(
    get, path = "/version",
    responses(
        (status = 200, description = "Return the service version", body = Version),
    ),
)]
pub(in crate::views) async fn version(
    State(AppState { config, .. }): State<AppState>,
) -> Json<Version> {
    Json(Version {
        git_describe: config.app_version.clone(),
    })
}

pub struct ServerConfig {
    pub port: u16,
    pub address: String,
    pub health_check_timeout: Duration,
    /// Longest wait for the per-document critical section taken by a full
    /// re-upload before the request is reported as a retryable conflict.
    pub reupload_lock_timeout: Duration,
    pub storage_root: PathBuf,
    pub app_version: Option<String>,
}

pub struct Server {
    app_state: AppState,
    router: NormalizePath<Router>,
}

/// The state of the whole docstore service, available to all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Registry of document, user and grant rows.
    pub db: Arc<Db>,
    /// Byte-level owner of the content blobs.
    pub content: Arc<ContentStore>,
    pub audit: Arc<AuditLog>,
    /// Per-document exclusive locks serializing full re-uploads.
    pub locks: Arc<DocumentLocks>,
    pub health_check_timeout: Duration,
}

impl AppState {
    #[tracing::instrument(skip_all, level = "info", err, name = "AppState initialization")]
    async fn init(config: ServerConfig) -> anyhow::Result<Self> {
        let content = Arc::new(ContentStore::new(config.storage_root.clone()));
        tokio::fs::create_dir_all(content.root()).await?;

        Ok(Self {
            db: Arc::new(Db::new()),
            audit: Arc::new(AuditLog::new(content.clone())),
            locks: Arc::new(DocumentLocks::new()),
            content,
            health_check_timeout: config.health_check_timeout,
            config: Arc::new(config),
        })
    }
}

impl Server {
    #[tracing::instrument(skip_all, err, level = "info", name = "server initialization")]
    pub async fn new(config: ServerConfig) -> anyhow::Result<Self> {
        info!("Building server...");
        let app_state = AppState::init(config).await?;

        let request_payload_limit = RequestBodyLimitLayer::new(10 * 1024 * 1024); // 10MiB

        // Build CORS layer
        let cors = {
            let allowed_origin = env::var("DOCSTORE_ALLOWED_ORIGIN").ok();
            match allowed_origin {
                Some(origin) => CorsLayer::new()
                    .allow_methods(Any)
                    .allow_headers(Any)
                    .allow_origin(
                        origin
                            .parse::<axum::http::header::HeaderValue>()
                            .expect("invalid allowed origin"),
                    ),
                None => CorsLayer::new()
                    .allow_methods(Any)
                    .allow_headers(Any)
                    .allow_origin(Any),
            }
        };

        // Configure the axum router
        let router: Router<()> = axum::Router::<AppState>::new()
            .merge(service_router())
            .route_layer(axum::middleware::from_fn_with_state(
                app_state.clone(),
                authentication_middleware,
            ))
            .layer(DefaultBodyLimit::disable())
            .layer(request_payload_limit)
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(app_state.clone());
        let normalizing_router = NormalizePathLayer::trim_trailing_slash().layer(router);

        Ok(Self {
            app_state,
            router: normalizing_router,
        })
    }

    pub async fn start(self) -> std::io::Result<()> {
        let Self { app_state, router } = self;
        let ServerConfig { address, port, .. } = app_state.config.as_ref();

        info!("Running server...");
        let service = ServiceExt::<axum::extract::Request>::into_make_service(router);
        let listener = tokio::net::TcpListener::bind((address.as_str(), *port)).await?;
        axum::serve(listener, service).await
    }
}
