use axum::Extension;
use axum::extract::Json;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use docstore_derive::ServiceError;
use docstore_models::Db;
use docstore_models::Document;
use docstore_models::DocumentId;
use docstore_models::Operation;
use docstore_models::Role;
use docstore_models::User;
use docstore_models::UserId;
use docstore_storage::AuditOperation;
use docstore_storage::ContentHandle;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use utoipa::IntoParams;
use utoipa::ToSchema;

use super::AppState;
use super::AuthenticationExt;
use crate::error::Result;

#[derive(Debug, Error, ServiceError)]
#[service_error(base_id = "document")]
pub enum DocumentError {
    /// Also covers documents the caller holds no sufficient role on: both
    /// outcomes must be indistinguishable to prevent existence probing.
    #[error("Document '{document_id}', could not be found")]
    #[service_error(status = 404)]
    NotFound { document_id: DocumentId },
    #[error("share list cannot be empty")]
    #[service_error(status = 400)]
    EmptyShareList,
    #[error("Document '{document_id}' is being rewritten, retry later")]
    #[service_error(status = 409)]
    Conflict { document_id: DocumentId },
}

/// The document representation returned by every endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize))]
pub struct DocumentPayload {
    id: DocumentId,
    owner: UserId,
    /// Locator of the backing content, `null` until content exists.
    #[schema(required)]
    file_url: Option<String>,
}

impl DocumentPayload {
    fn of(document: &Document, state: &AppState) -> Self {
        Self {
            id: document.id.clone(),
            owner: document.owner.clone(),
            file_url: document
                .content_ref
                .as_ref()
                .map(|handle| state.content.url_of(handle)),
        }
    }
}

/// Resolves `document_id` on behalf of `user` for `operation`.
///
/// The single visibility predicate: a document that does not exist and a
/// document the caller may not touch produce the same `NotFound`.
fn retrieve_authorized(
    db: &Db,
    user: &User,
    document_id: DocumentId,
    operation: Operation,
) -> Result<(Document, Role), DocumentError> {
    if let Some(document) = Document::retrieve(db, &document_id) {
        if let Some(role) = document.role_of(db, &user.id) {
            if role.allows(operation) {
                return Ok((document, role));
            }
        }
    }
    Err(DocumentError::NotFound { document_id })
}

/// First `Empty → Materialized` transition of a document, performed during
/// creation.
///
/// Best-effort: on a storage fault the row keeps `content_ref = None`, the
/// fault is logged and creation still succeeds.
async fn materialize(state: &AppState, document: Document) -> Document {
    if document.content_ref.is_some() {
        return document;
    }
    let handle = ContentHandle::for_key(&document.id);
    match state.content.create(&handle).await {
        Ok(()) => {
            state
                .audit
                .record(Some(&handle), Role::Owner.label(), AuditOperation::Upload)
                .await;
            Document::set_content_ref(&state.db, &document.id, handle).unwrap_or(document)
        }
        Err(error) => {
            tracing::warn!(
                %error,
                document_id = %document.id,
                "failed to materialize document content"
            );
            document
        }
    }
}

/// Create a new document
///
/// The body may be empty; the caller becomes the owner.
#[utoipa::path(
    post, path = "/documents",
    tag = "documents",
    responses(
        (status = 201, body = DocumentPayload, description = "The created document"),
    )
)]
pub(in crate::views) async fn create(
    State(state): State<AppState>,
    Extension(auth): AuthenticationExt,
) -> Result<impl IntoResponse> {
    let user = auth.authenticated_user()?;
    let document = Document::create_for(&state.db, user.id.clone());
    let document = materialize(&state, document).await;
    Ok((
        StatusCode::CREATED,
        Json(DocumentPayload::of(&document, &state)),
    ))
}

/// Returns the documents the caller owns or collaborates on, newest-created
/// first
#[utoipa::path(
    get, path = "/documents",
    tag = "documents",
    responses(
        (status = 200, body = Vec<DocumentPayload>, description = "The list of visible documents"),
    )
)]
pub(in crate::views) async fn list(
    State(state): State<AppState>,
    Extension(auth): AuthenticationExt,
) -> Result<Json<Vec<DocumentPayload>>> {
    let user = auth.authenticated_user()?;
    let documents = Document::list_for_user(&state.db, &user.id);
    Ok(Json(
        documents
            .iter()
            .map(|document| DocumentPayload::of(document, &state))
            .collect(),
    ))
}

// Documentation struct
#[derive(IntoParams)]
#[allow(unused)]
pub struct DocumentIdParam {
    /// The id of a document
    document_id: DocumentId,
}

/// Retrieve a document
#[utoipa::path(
    get, path = "/documents/{document_id}",
    tag = "documents",
    params(DocumentIdParam),
    responses(
        (status = 200, body = DocumentPayload, description = "The requested document"),
    )
)]
pub(in crate::views) async fn get(
    State(state): State<AppState>,
    Extension(auth): AuthenticationExt,
    Path(document_id): Path<DocumentId>,
) -> Result<Json<DocumentPayload>> {
    let user = auth.authenticated_user()?;
    let (document, _) = retrieve_authorized(&state.db, user, document_id, Operation::View)?;
    Ok(Json(DocumentPayload::of(&document, &state)))
}

/// Partially edit a document
///
/// Does not touch the content bytes; records an `Edit` audit line under the
/// caller's role label.
#[utoipa::path(
    patch, path = "/documents/{document_id}",
    tag = "documents",
    params(DocumentIdParam),
    responses(
        (status = 200, body = DocumentPayload, description = "The edited document"),
    )
)]
pub(in crate::views) async fn patch(
    State(state): State<AppState>,
    Extension(auth): AuthenticationExt,
    Path(document_id): Path<DocumentId>,
) -> Result<Json<DocumentPayload>> {
    let user = auth.authenticated_user()?;
    let (document, role) = retrieve_authorized(&state.db, user, document_id, Operation::Edit)?;
    let document = Document::touch(&state.db, &document.id).unwrap_or(document);
    state
        .audit
        .record(document.content_ref.as_ref(), role.label(), AuditOperation::Edit)
        .await;
    Ok(Json(DocumentPayload::of(&document, &state)))
}

/// Fully re-upload a document
///
/// Owner only. Resets the content to just its own `Upload` audit line. The
/// truncate and the following row update run inside an exclusive critical
/// section keyed by document id; contention past the configured wait is a
/// retryable conflict.
#[utoipa::path(
    put, path = "/documents/{document_id}",
    tag = "documents",
    params(DocumentIdParam),
    responses(
        (status = 200, body = DocumentPayload, description = "The re-uploaded document"),
        (status = 409, description = "A concurrent re-upload holds the document, retry later"),
    )
)]
pub(in crate::views) async fn put(
    State(state): State<AppState>,
    Extension(auth): AuthenticationExt,
    Path(document_id): Path<DocumentId>,
) -> Result<Json<DocumentPayload>> {
    let user = auth.authenticated_user()?;
    let (document, role) =
        retrieve_authorized(&state.db, user, document_id, Operation::Reupload)?;

    let wait = state
        .config
        .reupload_lock_timeout
        .to_std()
        .expect("lock timeout should be valid at this point");
    let _guard = state
        .locks
        .acquire(document.id.as_str(), wait)
        .await
        .map_err(|_| DocumentError::Conflict {
            document_id: document.id.clone(),
        })?;

    if let Some(handle) = document.content_ref.as_ref() {
        state.content.truncate(handle).await?;
        state
            .audit
            .record(Some(handle), role.label(), AuditOperation::Upload)
            .await;
    }
    let document = Document::touch(&state.db, &document.id).unwrap_or(document);

    Ok(Json(DocumentPayload::of(&document, &state)))
}

/// Delete a document
///
/// Owner only. Cascades the collaborator grants; removal of the content
/// blob is best-effort.
#[utoipa::path(
    delete, path = "/documents/{document_id}",
    tag = "documents",
    params(DocumentIdParam),
    responses(
        (status = 204, description = "The document was deleted successfully"),
    )
)]
pub(in crate::views) async fn delete(
    State(state): State<AppState>,
    Extension(auth): AuthenticationExt,
    Path(document_id): Path<DocumentId>,
) -> Result<impl IntoResponse> {
    let user = auth.authenticated_user()?;
    let (document, _) = retrieve_authorized(&state.db, user, document_id, Operation::Delete)?;

    Document::delete(&state.db, &document.id);
    state.locks.forget(document.id.as_str());
    if let Some(handle) = document.content_ref.as_ref() {
        // the row is already gone, a leftover blob is only worth a warning
        if let Err(error) = state.content.remove(handle).await {
            tracing::warn!(%error, document_id = %document.id, "failed to remove content blob");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Share request body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(in crate::views) struct ShareForm {
    /// Candidate user ids; unresolvable ids are dropped silently
    #[schema(min_items = 1)]
    pub id_list: Vec<String>,
}

/// Grant collaborators access to a document
///
/// Owner only. Idempotent bulk grant: already granted ids are skipped and
/// unresolvable ids never affect the valid ones.
#[utoipa::path(
    post, path = "/documents/{document_id}/share",
    tag = "documents",
    params(DocumentIdParam),
    request_body = ShareForm,
    responses(
        (status = 200, body = DocumentPayload, description = "The shared document, unchanged in shape"),
    )
)]
pub(in crate::views) async fn share(
    State(state): State<AppState>,
    Extension(auth): AuthenticationExt,
    Path(document_id): Path<DocumentId>,
    Json(form): Json<ShareForm>,
) -> Result<Json<DocumentPayload>> {
    let user = auth.authenticated_user()?;
    let (document, _) = retrieve_authorized(&state.db, user, document_id, Operation::Share)?;
    if form.id_list.is_empty() {
        return Err(DocumentError::EmptyShareList.into());
    }
    document.add_shared_users(&state.db, &form.id_list);
    Ok(Json(DocumentPayload::of(&document, &state)))
}

/// Download a document
///
/// Records a `Download` audit line; the content bytes themselves are served
/// by the static file collaborator behind `file_url`.
#[utoipa::path(
    post, path = "/documents/{document_id}/download",
    tag = "documents",
    params(DocumentIdParam),
    responses(
        (status = 200, body = DocumentPayload, description = "The downloaded document"),
    )
)]
pub(in crate::views) async fn download(
    State(state): State<AppState>,
    Extension(auth): AuthenticationExt,
    Path(document_id): Path<DocumentId>,
) -> Result<Json<DocumentPayload>> {
    let user = auth.authenticated_user()?;
    let (document, role) =
        retrieve_authorized(&state.db, user, document_id, Operation::Download)?;
    state
        .audit
        .record(
            document.content_ref.as_ref(),
            role.label(),
            AuditOperation::Download,
        )
        .await;
    Ok(Json(DocumentPayload::of(&document, &state)))
}
