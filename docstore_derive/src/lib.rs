mod service_error;

use proc_macro::TokenStream;
use syn::DeriveInput;
use syn::parse_macro_input;

/// Derives `ServiceError` for an error enum.
///
/// Generates the HTTP status code, the stable error type identifier
/// (`"docstore:<base_id>:<Variant>"`) and the JSON context (the variant's
/// named fields) used by the error envelope.
///
/// ```ignore
/// #[derive(Debug, Error, ServiceError)]
/// #[service_error(base_id = "document")]
/// enum DocumentError {
///     #[error("Document '{document_id}', could not be found")]
///     #[service_error(status = 404)]
///     NotFound { document_id: DocumentId },
/// }
/// ```
///
/// Variants without a `status` attribute fall back to the enum-level
/// `default_status` (500 when unspecified).
#[proc_macro_derive(ServiceError, attributes(service_error))]
pub fn service_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    service_error::expand_service_error(&input)
        .unwrap_or_else(|e| e.write_errors())
        .into()
}
