//! `#[derive(Record)]`: generates the `restc_json::Record` field table
//! for a named-field struct.
//!
//! Grounded on Design Notes §9 ("Compile-time reflection for records"):
//! the original adapts a struct's members via Boost.Fusion
//! (`for_each_member.hpp`), producing a compile-time list the JSON
//! bridge walks generically. This macro is the idiomatic Rust
//! replacement — a derive that emits, per field, a zero-sized marker
//! type implementing `restc_json::FieldAccess<Self>`, collected into a
//! `const FIELDS` table, plus a generated `Default` impl (new array
//! elements are default-constructed, then populated field by field).
//!
//! Field-level `#[record(rename = "jsonName")]` overrides the JSON key
//! a field is read from and written to; it otherwise defaults to the
//! Rust field's own name.

#![warn(rust_2018_idioms)]

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr};

/// See the module documentation.
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "#[derive(Record)] requires a struct with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "#[derive(Record)] only applies to structs",
            ))
        }
    };

    let mut marker_defs = Vec::new();
    let mut marker_idents = Vec::new();
    let mut default_assignments = Vec::new();

    for field in fields {
        let field_ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "tuple fields are not supported"))?;
        let json_name = json_name_for(field)?;
        let marker_ident = format_ident!("__RecordField_{}_{}", struct_name, field_ident);

        marker_defs.push(quote! {
            #[allow(non_camel_case_types)]
            struct #marker_ident;

            impl ::restc_json::FieldAccess<#struct_name> for #marker_ident {
                fn json_name(&self) -> &'static str {
                    #json_name
                }

                fn is_empty(&self, instance: &#struct_name) -> bool {
                    ::restc_json::JsonValue::is_empty(&instance.#field_ident)
                }

                fn write(
                    &self,
                    instance: &#struct_name,
                    ser: &mut ::restc_json::Serializer,
                    opts: &::restc_json::SerializeOptions,
                ) -> Result<(), ::restc_errors::RestcError> {
                    ::restc_json::JsonValue::write_json(&instance.#field_ident, ser, opts)
                }

                fn read(
                    &self,
                    instance: &mut #struct_name,
                    tok: &mut ::restc_json::Tokenizer<'_>,
                    budget: &mut ::restc_json::MemoryBudget,
                    opts: &::restc_json::DeserializeOptions,
                ) -> Result<(), ::restc_errors::RestcError> {
                    instance.#field_ident = ::restc_json::JsonValue::read_json(tok, budget, opts)?;
                    Ok(())
                }
            }
        });
        marker_idents.push(marker_ident);
        default_assignments.push(quote! {
            #field_ident: ::core::default::Default::default()
        });
    }

    Ok(quote! {
        #(#marker_defs)*

        impl ::restc_json::Record for #struct_name {
            const FIELDS: &'static [&'static dyn ::restc_json::FieldAccess<Self>] = &[
                #(&#marker_idents),*
            ];
        }

        impl ::core::default::Default for #struct_name {
            fn default() -> Self {
                Self {
                    #(#default_assignments),*
                }
            }
        }
    })
}

/// The JSON key a field is read from and written to: the field's own
/// name, unless overridden with `#[record(rename = "...")]`.
fn json_name_for(field: &syn::Field) -> syn::Result<String> {
    for attr in &field.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        let mut rename = None;
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value = meta.value()?;
                let lit: LitStr = value.parse()?;
                rename = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("unsupported #[record(..)] key, expected `rename`"))
            }
        })?;
        if let Some(name) = rename {
            return Ok(name);
        }
    }
    Ok(field
        .ident
        .as_ref()
        .expect("named field")
        .to_string())
}
