mod command_attr;
use doclap_core::Docstring;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned};

use crate::command_attr::CommandAttr;

/// Reflect a function so it can drive a `doclap::Parser`.
///
/// Generates a marker type (`add_numbers` gives `AddNumbersCommand`)
/// implementing `doclap::Function`: parameter names in order, defaults taken
/// from `#[default(expr)]` parameter attributes (`Option<T>` parameters
/// default to `None`), and the doc comment as documentation.
#[proc_macro_attribute]
pub fn command(
    args: proc_macro::TokenStream,
    input: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let command_attr = parse_macro_input!(args as CommandAttr);
    let mut input_parsed = parse_macro_input!(input as syn::ItemFn);

    generate_command(&mut input_parsed, &command_attr)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

struct Reflected {
    name: String,
    ty: syn::Type,
    default: Option<TokenStream>,
}

fn generate_command(item: &mut syn::ItemFn, command_attr: &CommandAttr) -> syn::Result<TokenStream> {
    let sig = &item.sig;
    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new(asyncness.span(), "async functions cannot be commands"));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new(sig.generics.span(), "generic functions cannot be commands"));
    }

    let doc = doc_comment(&item.attrs);
    if let Err(e) = Docstring::parse(&doc) {
        return Err(syn::Error::new(sig.ident.span(), format!("malformed documentation: {e}")));
    }

    let params = item
        .sig
        .inputs
        .iter_mut()
        .map(reflect_param)
        .collect::<syn::Result<Vec<_>>>()?;

    let function = &item.sig.ident;
    let vis = &item.vis;
    let name = command_attr.name(function);
    let marker = command_attr.marker(function);
    let output = match &item.sig.output {
        syn::ReturnType::Default => quote! { () },
        syn::ReturnType::Type(_, ty) => quote! { #ty },
    };

    let signature = params.iter().map(|param| {
        let name = &param.name;
        match &param.default {
            Some(default) => quote! { ::doclap::Param::with_default(#name, #default) },
            None => quote! { ::doclap::Param::required(#name) },
        }
    });
    let arguments = params.iter().map(|param| {
        let name = &param.name;
        let ty = &param.ty;
        quote! { namespace.extract::<#ty>(#name)? }
    });
    let doc_text = doc.as_str();
    let marker_doc = format!("Reflection of [`{function}`] for `doclap`.");

    Ok(quote! {
        #item

        #[doc = #marker_doc]
        #[derive(Debug, Clone, Copy, Default)]
        #vis struct #marker;

        impl ::doclap::Function for #marker {
            type Output = #output;

            const NAME: &'static str = #name;

            fn doc() -> &'static str {
                #doc_text
            }

            fn signature() -> ::std::vec::Vec<::doclap::Param> {
                ::std::vec![#(#signature),*]
            }

            fn call(namespace: &::doclap::Namespace) -> ::doclap::Result<Self::Output> {
                ::std::result::Result::Ok(#function(#(#arguments),*))
            }
        }
    })
}

/// The `///` lines of an item joined by newlines.
fn doc_comment(attrs: &[syn::Attribute]) -> String {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            syn::Meta::NameValue(syn::MetaNameValue {
                value:
                    syn::Expr::Lit(syn::ExprLit {
                        lit: syn::Lit::Str(line),
                        ..
                    }),
                ..
            }) => Some(line.value()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reflect one parameter, removing its `#[default(..)]` attribute.
fn reflect_param(input: &mut syn::FnArg) -> syn::Result<Reflected> {
    let pat_type = match input {
        syn::FnArg::Receiver(receiver) => {
            return Err(syn::Error::new(receiver.span(), "methods cannot be commands"));
        }
        syn::FnArg::Typed(pat_type) => pat_type,
    };
    let syn::Pat::Ident(pat_ident) = pat_type.pat.as_ref() else {
        return Err(syn::Error::new(
            pat_type.pat.span(),
            "command parameters must be plain identifiers",
        ));
    };
    if let syn::Type::Reference(reference) = pat_type.ty.as_ref() {
        return Err(syn::Error::new(
            reference.span(),
            "command parameters must be owned types",
        ));
    }
    let name = pat_ident.ident.to_string().trim_start_matches("r#").to_string();
    let ty = pat_type.ty.as_ref().clone();

    let mut default = None;
    let mut kept = Vec::with_capacity(pat_type.attrs.len());
    for attr in pat_type.attrs.drain(..) {
        if attr.path().is_ident("default") {
            let expr: syn::Expr = attr.parse_args()?;
            default = Some(default_value(&ty, &expr));
        } else {
            kept.push(attr);
        }
    }
    pat_type.attrs = kept;

    if default.is_none() && is_option(&ty) {
        default = Some(quote! { ::doclap::Value::None });
    }
    Ok(Reflected { name, ty, default })
}

fn default_value(ty: &syn::Type, expr: &syn::Expr) -> TokenStream {
    let value = match expr {
        syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Str(_),
            ..
        }) => quote! { ::std::convert::From::from(#expr) },
        _ => quote! { #expr },
    };
    quote! {
        {
            let value: #ty = #value;
            ::doclap::Value::from(value)
        }
    }
}

fn is_option(ty: &syn::Type) -> bool {
    match ty {
        syn::Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Option"),
        _ => false,
    }
}
