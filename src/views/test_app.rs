//! Exposes [TestApp] and [TestAppBuilder] to ease the setup of the
//! test axum server, its temporary storage root and its registry.

use std::sync::Arc;

use axum::Router;
use axum_test::TestRequest;
use axum_test::TestServer;
use common::tracing::Stream;
use common::tracing::TracingConfig;
use common::tracing::create_tracing_subscriber;
use docstore_models::Db;
use docstore_models::DocumentId;
use docstore_models::User;
use docstore_storage::AuditLog;
use docstore_storage::ContentHandle;
use docstore_storage::ContentStore;
use docstore_storage::DocumentLocks;
use serde::de::DeserializeOwned;
use tower_http::trace::TraceLayer;

use super::AppState;
use super::ServerConfig;
use super::authentication_middleware;
use super::service_router;

/// A builder interface for [TestApp]
///
/// Every test app gets a fresh registry and its own temporary storage root,
/// so tests never share state.
pub(crate) struct TestAppBuilder {
    reupload_lock_timeout: chrono::Duration,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            reupload_lock_timeout: chrono::Duration::seconds(5),
        }
    }

    pub fn reupload_lock_timeout(mut self, reupload_lock_timeout: chrono::Duration) -> Self {
        self.reupload_lock_timeout = reupload_lock_timeout;
        self
    }

    pub fn default_app() -> TestApp {
        TestAppBuilder::new().build()
    }

    pub fn build(self) -> TestApp {
        let storage_dir = tempfile::tempdir().expect("storage root should be created");

        let config = ServerConfig {
            port: 0,
            address: String::default(),
            health_check_timeout: chrono::Duration::milliseconds(500),
            reupload_lock_timeout: self.reupload_lock_timeout,
            storage_root: storage_dir.path().to_path_buf(),
            app_version: None,
        };

        // Setup tracing
        let tracing_config = TracingConfig {
            stream: Stream::Stdout,
            directives: vec![],
        };
        let sub = create_tracing_subscriber(
            tracing_config,
            tracing_subscriber::filter::LevelFilter::TRACE,
        );
        let tracing_guard = tracing::subscriber::set_default(sub);

        let content = Arc::new(ContentStore::new(config.storage_root.clone()));
        let app_state = AppState {
            db: Arc::new(Db::new()),
            audit: Arc::new(AuditLog::new(content.clone())),
            locks: Arc::new(DocumentLocks::new()),
            content,
            health_check_timeout: config.health_check_timeout,
            config: Arc::new(config),
        };

        // Configure the axum router
        let router: Router<()> = axum::Router::<AppState>::new()
            .merge(service_router())
            .route_layer(axum::middleware::from_fn_with_state(
                app_state.clone(),
                authentication_middleware,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state.clone());

        // Run server
        let server = TestServer::new(router).expect("test server should build properly");

        TestApp {
            server,
            app_state,
            _storage_dir: storage_dir,
            tracing_guard,
        }
    }
}

/// Wraps an underlying, fully configured, axum service
///
/// It also holds the registry, the content store and the temporary storage
/// root, which can be accessed through the [TestApp] methods.
pub(crate) struct TestApp {
    server: TestServer,
    app_state: AppState,
    // keeps the temporary storage root alive for the whole test
    _storage_dir: tempfile::TempDir,
    #[expect(unused)] // included here to extend its lifetime, not meant to be used in any way
    tracing_guard: tracing::subscriber::DefaultGuard,
}

impl TestApp {
    pub fn db(&self) -> Arc<Db> {
        self.app_state.db.clone()
    }

    pub fn content_store(&self) -> Arc<ContentStore> {
        self.app_state.content.clone()
    }

    pub fn locks(&self) -> Arc<DocumentLocks> {
        self.app_state.locks.clone()
    }

    /// Registers `identity` as a known user, the way the authenticating
    /// proxy would on their first request.
    pub fn user(&self, identity: impl ToString) -> User {
        let identity = identity.to_string();
        User::ensure(&self.app_state.db, &identity, &identity)
    }

    /// Reads the backing content blob of a document.
    pub async fn document_content(&self, document_id: &DocumentId) -> String {
        let handle = ContentHandle::for_key(document_id);
        self.app_state
            .content
            .read(&handle)
            .await
            .expect("document content should be materialized")
    }

    pub async fn fetch(&self, req: TestRequest) -> TestResponse {
        tracing::trace!(request = ?req);
        let response = req.await;
        TestResponse::new(response)
    }

    pub fn get(&self, path: &str) -> TestRequest {
        self.server.get(&trim_path(path))
    }

    pub fn post(&self, path: &str) -> TestRequest {
        self.server.post(&trim_path(path))
    }

    pub fn put(&self, path: &str) -> TestRequest {
        self.server.put(&trim_path(path))
    }

    pub fn patch(&self, path: &str) -> TestRequest {
        self.server.patch(&trim_path(path))
    }

    pub fn delete(&self, path: &str) -> TestRequest {
        self.server.delete(&trim_path(path))
    }
}

pub trait TestRequestExt {
    fn by_user(self, user: &User) -> Self;
}

impl TestRequestExt for TestRequest {
    fn by_user(self, user: &User) -> Self {
        self.add_header("x-remote-user-identity", &user.identity)
            .add_header("x-remote-user-name", &user.name)
    }
}

// For technical reasons, we had a hard time trying to configure the normalizing layer
// in the test server. Since we have control over the paths configured in our unit tests,
// doing this manually is probably a good enough solution for now.
fn trim_path(path: &str) -> String {
    if let Some(path) = path.strip_suffix('/') {
        path.to_owned()
    } else if path.contains("/?") {
        path.replace("/?", "?")
    } else {
        path.to_owned()
    }
}

pub struct TestResponse {
    inner: axum_test::TestResponse,
}

impl TestResponse {
    #[tracing::instrument(name = "Response", level = "debug", skip(inner), fields(status = ?inner.status_code()))]
    fn new(inner: axum_test::TestResponse) -> Self {
        tracing::trace!(response = ?inner);
        Self { inner }
    }

    #[track_caller]
    fn render_response_lossy(self) -> String {
        let bytes = self.inner.into_bytes();
        serde_json::from_slice::<serde_json::Value>(&bytes)
            .ok()
            .and_then(|json| serde_json::to_string_pretty(&json).ok())
            .unwrap_or_else(|| "cannot render response body".to_string())
    }

    #[track_caller]
    pub fn assert_status(self, expected_status: axum::http::StatusCode) -> Self {
        let actual_status = self.inner.status_code();
        if actual_status != expected_status {
            let body = self.render_response_lossy();
            pretty_assertions::assert_eq!(
                actual_status,
                expected_status,
                "unexpected status code body={body}"
            );
            unreachable!("should have already panicked")
        } else {
            self
        }
    }

    pub fn bytes(self) -> Vec<u8> {
        self.inner.into_bytes().into()
    }

    #[tracing::instrument(
        name = "Deserialization",
        level = "debug",
        skip(self),
        fields(response_status = ?self.inner.status_code())
    )]
    #[track_caller]
    pub fn json_into<T: DeserializeOwned>(self) -> T {
        let body = self.bytes();
        serde_json::from_slice(body.as_ref()).unwrap_or_else(|err| {
            tracing::error!(error = ?err, "Error deserializing test response into the desired type");
            let actual: serde_json::Value =
                serde_json::from_slice(body.as_ref()).unwrap_or_else(|err| {
                    tracing::error!(
                        error = ?err,
                        ?body,
                        "Failed to deserialize test response body into JSON"
                    );
                    panic!("could not deserialize test response into JSON");
                });
            let pretty = serde_json::to_string_pretty(&actual).unwrap();
            panic!("could not deserialize test response into the desired type:\n{pretty}");
        })
    }
}
