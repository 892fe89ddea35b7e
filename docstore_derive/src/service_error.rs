use darling::FromDeriveInput;
use darling::FromVariant;
use proc_macro2::TokenStream;
use quote::quote;

#[derive(FromDeriveInput)]
#[darling(attributes(service_error), supports(enum_any))]
struct ErrorOptions {
    ident: syn::Ident,
    data: darling::ast::Data<ErrorVariant, darling::util::Ignored>,
    base_id: String,
    #[darling(default)]
    default_status: Option<u16>,
}

#[derive(FromVariant)]
#[darling(attributes(service_error))]
struct ErrorVariant {
    ident: syn::Ident,
    fields: darling::ast::Fields<syn::Field>,
    #[darling(default)]
    status: Option<u16>,
}

pub(crate) fn expand_service_error(input: &syn::DeriveInput) -> darling::Result<TokenStream> {
    let options = ErrorOptions::from_derive_input(input)?;
    let ident = &options.ident;
    let base_id = &options.base_id;
    let default_status = options.default_status.unwrap_or(500);

    let variants = options
        .data
        .as_ref()
        .take_enum()
        .expect("supports(enum_any) guarantees an enum");

    let mut status_arms = Vec::new();
    let mut type_arms = Vec::new();
    let mut context_arms = Vec::new();

    for variant in variants {
        let variant_ident = &variant.ident;
        let error_type = format!("docstore:{base_id}:{variant_ident}");
        let status = variant.status.unwrap_or(default_status);

        let pattern = match variant.fields.style {
            darling::ast::Style::Unit => quote! { Self::#variant_ident },
            darling::ast::Style::Tuple => quote! { Self::#variant_ident(..) },
            darling::ast::Style::Struct => quote! { Self::#variant_ident { .. } },
        };

        status_arms.push(quote! {
            #pattern => axum::http::StatusCode::from_u16(#status)
                .expect("error status codes are written as literals and must be valid"),
        });
        type_arms.push(quote! { #pattern => #error_type, });

        if variant.fields.style == darling::ast::Style::Struct {
            let field_idents = variant
                .fields
                .iter()
                .map(|field| field.ident.clone().expect("struct variants have named fields"))
                .collect::<Vec<_>>();
            let field_names = field_idents
                .iter()
                .map(|ident| ident.to_string())
                .collect::<Vec<_>>();
            context_arms.push(quote! {
                Self::#variant_ident { #(#field_idents),* } => {
                    let mut context = std::collections::HashMap::new();
                    #(
                        context.insert(
                            #field_names.to_owned(),
                            serde_json::to_value(#field_idents).unwrap_or_default(),
                        );
                    )*
                    context
                }
            });
        } else {
            context_arms.push(quote! { #pattern => Default::default(), });
        }
    }

    Ok(quote! {
        impl crate::error::ServiceError for #ident {
            fn get_status(&self) -> axum::http::StatusCode {
                match self {
                    #(#status_arms)*
                }
            }

            fn get_type(&self) -> &str {
                match self {
                    #(#type_arms)*
                }
            }

            fn context(&self) -> std::collections::HashMap<String, serde_json::Value> {
                match self {
                    #(#context_arms)*
                }
            }
        }
    })
}
