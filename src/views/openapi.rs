use utoipa::OpenApi;

use super::documents;

/// OpenAPI description of the service, printed by the `openapi` CLI command.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "docstore",
        description = "Shared document store with per-document embedded audit trails",
    ),
    paths(
        super::health,
        super::version,
        documents::create,
        documents::list,
        documents::get,
        documents::patch,
        documents::put,
        documents::delete,
        documents::share,
        documents::download,
    ),
    components(schemas(crate::error::InternalError)),
)]
pub struct ApiDoc;
