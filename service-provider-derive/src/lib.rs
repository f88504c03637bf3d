//! Derive macro for service-provider
//!
//! `#[derive(Inject)]` writes the `Inject` impl for a service struct: one
//! annotation per `#[service]` field, the slot list the resolver fills, and
//! optionally the lifecycle hook.
//!
//! # Example
//!
//! ```rust,ignore
//! use service_provider::{Inject, Injected};
//! use std::sync::Arc;
//!
//! #[derive(Inject)]
//! struct Database;
//!
//! #[derive(Inject)]
//! struct Cache;
//!
//! #[derive(Inject)]
//! #[inject(on_constructed = "warm_up")]
//! struct UserService {
//!     #[service]
//!     db: Injected<Database>,
//!     #[service]
//!     cache: Option<Arc<Cache>>,
//!     // Plain fields are set by the factory
//!     request_count: u64,
//! }
//!
//! impl UserService {
//!     fn warm_up(&mut self) {
//!         self.request_count = 0;
//!     }
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Ident, LitStr, Type};

/// Derive the `Inject` trait.
///
/// # Attributes
///
/// - `#[service]` on a field - inject the field. The field type must be
///   `Injected<T>` or `Option<Arc<T>>`; `T` is the dependency.
/// - `#[inject(on_constructed = "method")]` on the struct - call
///   `self.method()` once every `#[service]` field is filled.
///
/// Works on structs with named fields and on unit structs.
#[proc_macro_derive(Inject, attributes(service, inject))]
pub fn derive_inject(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand_inject(&input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_inject(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let services = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => service_fields(fields.named.iter())?,
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Inject can only be derived for structs with named fields or unit structs",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Inject can only be derived for structs",
            ));
        }
    };

    let hook = find_on_constructed(&input.attrs)?;

    let injection = if services.is_empty() {
        quote! {}
    } else {
        let keys: Vec<LitStr> = services
            .iter()
            .map(|s| LitStr::new(&s.ident.to_string(), s.ident.span()))
            .collect();
        let idents = services.iter().map(|s| s.ident);
        let dependencies = services.iter().map(|s| s.dependency);

        quote! {
            fn annotate(store: &::service_provider::MetadataStore) {
                #(
                    store.annotate(
                        ::service_provider::ServiceId::of::<Self>(),
                        #keys,
                        ::service_provider::ServiceId::of::<#dependencies>(),
                    );
                )*
            }

            fn fields(&mut self) -> ::std::vec::Vec<::service_provider::Field<'_>> {
                ::std::vec![
                    #( ::service_provider::Field::new(#keys, &mut self.#idents) ),*
                ]
            }
        }
    };

    let lifecycle = match hook {
        Some(method) => quote! {
            fn on_constructed(&mut self) {
                Self::#method(self)
            }
        },
        None => quote! {},
    };

    Ok(quote! {
        impl #impl_generics ::service_provider::Inject for #name #ty_generics #where_clause {
            #injection
            #lifecycle
        }
    })
}

/// A `#[service]` field and the service it depends on
struct ServiceField<'a> {
    ident: &'a Ident,
    dependency: &'a Type,
}

fn service_fields<'a>(
    fields: impl Iterator<Item = &'a syn::Field>,
) -> syn::Result<Vec<ServiceField<'a>>> {
    let mut services = Vec::new();

    for field in fields {
        if !field.attrs.iter().any(|attr| attr.path().is_ident("service")) {
            continue;
        }

        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "#[service] fields must be named"))?;

        let dependency = extract_injected_inner_type(&field.ty)
            .or_else(|| extract_option_arc_inner_type(&field.ty))
            .ok_or_else(|| {
                syn::Error::new_spanned(
                    &field.ty,
                    "Fields marked with #[service] must have type Injected<T> or Option<Arc<T>>",
                )
            })?;

        services.push(ServiceField { ident, dependency });
    }

    Ok(services)
}

/// Parse `#[inject(on_constructed = "method")]`
fn find_on_constructed(attrs: &[Attribute]) -> syn::Result<Option<Ident>> {
    let mut hook = None;

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("inject")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("on_constructed") {
                let method: LitStr = meta.value()?.parse()?;
                hook = Some(method.parse::<Ident>()?);
                Ok(())
            } else {
                Err(meta.error("unsupported inject attribute, expected `on_constructed`"))
            }
        })?;
    }

    Ok(hook)
}

/// Inner type of a single-argument generic named `wrapper`
fn extract_generic_inner_type<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    if let Type::Path(type_path) = ty {
        let segment = type_path.path.segments.last()?;
        if segment.ident == wrapper {
            if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                if let Some(syn::GenericArgument::Type(inner)) = args.args.first() {
                    return Some(inner);
                }
            }
        }
    }
    None
}

/// Extract T from Injected<T>
fn extract_injected_inner_type(ty: &Type) -> Option<&Type> {
    extract_generic_inner_type(ty, "Injected")
}

/// Extract T from Option<Arc<T>>
fn extract_option_arc_inner_type(ty: &Type) -> Option<&Type> {
    let inner = extract_generic_inner_type(ty, "Option")?;
    extract_generic_inner_type(inner, "Arc")
}
