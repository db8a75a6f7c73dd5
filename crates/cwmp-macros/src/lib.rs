//! Derive macros for the TR-181 data-model mirror.
//!
//! `#[derive(Tr181Node)]` generates the `Tr181Field` implementation for a
//! mirror record: the depth-first `visit` used by the indexer, and the
//! path-segment `apply` / `add_instance` / `delete_instance` used by the
//! SetParameterValues / AddObject / DeleteObject handlers. `Vec<...>` fields
//! are collections: their path segment is the singular noun (resolved at
//! runtime through `crate::node::singular`, the one place the table lives)
//! and a `<Singular>NumberOfEntries` count leaf is derived from their
//! cardinality.
//!
//! `#[derive(Tr181Instance)]` exposes the sparse 1-based `index` field of a
//! collection element.
//!
//! Field names map to TR-181 names by PascalCasing the snake_case ident;
//! anything that convention cannot spell (`SSID`, `OUI`, vendor prefixes)
//! takes `#[tr181(name = "...")]`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Type, parse_macro_input};

#[proc_macro_derive(Tr181Node, attributes(tr181))]
pub fn derive_tr181_node(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    TokenStream::from(impl_tr181_node(&input))
}

#[proc_macro_derive(Tr181Instance)]
pub fn derive_tr181_instance(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    TokenStream::from(impl_tr181_instance(&input))
}

struct NodeField {
    ident: syn::Ident,
    /// TR-181 spelling of the field (plural spelling for collections).
    name: String,
    is_collection: bool,
}

fn impl_tr181_node(input: &DeriveInput) -> TokenStream2 {
    let name = &input.ident;
    let type_name = name.to_string();

    let fields = named_fields(input, "Tr181Node");
    let entries: Vec<NodeField> = fields
        .iter()
        .map(|field| {
            let ident = field.ident.clone().expect("named field");
            NodeField {
                name: tr181_name(field, &ident),
                is_collection: is_vec(&field.ty),
                ident,
            }
        })
        .collect();

    let visit_calls: Vec<TokenStream2> = entries
        .iter()
        .map(|entry| {
            let ident = &entry.ident;
            let field_name = &entry.name;
            if entry.is_collection {
                quote! {
                    crate::node::visit_collection(&self.#ident, path, #field_name, walk);
                }
            } else {
                quote! {
                    crate::node::Tr181Field::visit(
                        &self.#ident,
                        &crate::node::join(path, #field_name),
                        walk,
                    );
                }
            }
        })
        .collect();

    let apply_arms: Vec<TokenStream2> = entries
        .iter()
        .map(|entry| {
            let ident = &entry.ident;
            let field_name = &entry.name;
            if entry.is_collection {
                quote! {
                    if *head == crate::node::singular(#field_name) {
                        return crate::node::apply_collection(&mut self.#ident, rest, value);
                    }
                }
            } else {
                quote! {
                    if *head == #field_name {
                        return crate::node::Tr181Field::apply(&mut self.#ident, rest, value);
                    }
                }
            }
        })
        .collect();

    let add_arms: Vec<TokenStream2> = entries
        .iter()
        .map(|entry| {
            let ident = &entry.ident;
            let field_name = &entry.name;
            if entry.is_collection {
                quote! {
                    if *head == crate::node::singular(#field_name) {
                        return crate::node::add_to_collection(&mut self.#ident, rest);
                    }
                }
            } else {
                quote! {
                    if *head == #field_name {
                        return crate::node::Tr181Field::add_instance(&mut self.#ident, rest);
                    }
                }
            }
        })
        .collect();

    let delete_arms: Vec<TokenStream2> = entries
        .iter()
        .map(|entry| {
            let ident = &entry.ident;
            let field_name = &entry.name;
            if entry.is_collection {
                quote! {
                    if *head == crate::node::singular(#field_name) {
                        return crate::node::delete_from_collection(&mut self.#ident, rest);
                    }
                }
            } else {
                quote! {
                    if *head == #field_name {
                        return crate::node::Tr181Field::delete_instance(&mut self.#ident, rest);
                    }
                }
            }
        })
        .collect();

    quote! {
        impl crate::node::Tr181Field for #name {
            fn visit(&self, path: &str, walk: &mut crate::node::Walk<'_>) {
                if !walk.enter(#type_name) {
                    return;
                }
                #(#visit_calls)*
                walk.leave();
            }

            fn apply(
                &mut self,
                segments: &[&str],
                value: &str,
            ) -> Result<(), crate::node::PathError> {
                let Some((head, rest)) = segments.split_first() else {
                    return Err(crate::node::PathError::UnknownPath);
                };
                #(#apply_arms)*
                Err(crate::node::PathError::UnknownPath)
            }

            fn add_instance(
                &mut self,
                segments: &[&str],
            ) -> Result<u32, crate::node::PathError> {
                let Some((head, rest)) = segments.split_first() else {
                    return Err(crate::node::PathError::NotACollection);
                };
                #(#add_arms)*
                Err(crate::node::PathError::UnknownPath)
            }

            fn delete_instance(
                &mut self,
                segments: &[&str],
            ) -> Result<(), crate::node::PathError> {
                let Some((head, rest)) = segments.split_first() else {
                    return Err(crate::node::PathError::NotAnElement);
                };
                #(#delete_arms)*
                Err(crate::node::PathError::UnknownPath)
            }
        }
    }
}

fn impl_tr181_instance(input: &DeriveInput) -> TokenStream2 {
    let name = &input.ident;
    let fields = named_fields(input, "Tr181Instance");
    let has_index = fields
        .iter()
        .any(|field| field.ident.as_ref().is_some_and(|ident| ident == "index"));
    assert!(
        has_index,
        "Tr181Instance requires an `index: u32` field on {name}"
    );

    quote! {
        impl crate::node::Tr181Instance for #name {
            fn index(&self) -> u32 {
                self.index
            }

            fn set_index(&mut self, index: u32) {
                self.index = index;
            }
        }
    }
}

fn named_fields<'a>(
    input: &'a DeriveInput,
    derive_name: &str,
) -> &'a syn::punctuated::Punctuated<syn::Field, syn::token::Comma> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => panic!("{derive_name} can only be derived for structs with named fields"),
        },
        _ => panic!("{derive_name} can only be derived for structs"),
    }
}

fn is_vec(ty: &Type) -> bool {
    if let Type::Path(path) = ty {
        path.path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Vec")
    } else {
        false
    }
}

/// `#[tr181(name = "...")]` override, else PascalCase of the snake_case
/// ident (`serial_number` -> `SerialNumber`).
fn tr181_name(field: &syn::Field, ident: &syn::Ident) -> String {
    for attr in &field.attrs {
        if !attr.path().is_ident("tr181") {
            continue;
        }
        let mut name = None;
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let lit: syn::LitStr = meta.value()?.parse()?;
                name = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("expected `name = \"...\"`"))
            }
        })
        .unwrap_or_else(|e| panic!("bad #[tr181] attribute on {ident}: {e}"));
        if let Some(name) = name {
            return name;
        }
    }
    pascal_case(&ident.to_string())
}

fn pascal_case(snake: &str) -> String {
    snake
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
