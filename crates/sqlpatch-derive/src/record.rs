//! Record derive macro implementation.

mod attrs;

use std::collections::HashSet;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, Result};

use crate::common::syn_types::{ByteKind, detect_bytes, infer_sql_type, option_inner};
use attrs::{FieldAttrs, FieldKind, get_field_attrs, get_struct_attrs};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;

    // The catalog lives in a single static; generic instantiations would share it.
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Record cannot be derived for generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Record can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Record can only be derived for structs",
            ));
        }
    };

    let table = get_struct_attrs(&input)?.table;

    let mut column_defs = Vec::new();
    let mut accessors = Vec::new();
    let mut seen = HashSet::<String>::new();

    for field in fields {
        let attrs = get_field_attrs(field)?;
        if attrs.skip {
            continue;
        }
        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };

        let column = attrs
            .column
            .clone()
            .unwrap_or_else(|| field_ident.unraw().to_string());
        if !seen.insert(column.to_ascii_lowercase()) {
            return Err(syn::Error::new_spanned(
                field,
                format!("duplicate column `{column}`"),
            ));
        }

        column_defs.push(column_def(&column, &field.ty, &attrs));
        let value = field_value(field_ident, &field.ty, attrs.kind());
        accessors.push(quote! {
            if column.is_named(#column) {
                return ::std::result::Result::Ok(#value);
            }
        });
    }

    let missing = format!("no such field on {name}");

    Ok(quote! {
        impl ::sqlpatch::Record for #name {
            fn table_def() -> &'static ::sqlpatch::TableDef {
                static TABLE: ::std::sync::OnceLock<::sqlpatch::TableDef> =
                    ::std::sync::OnceLock::new();
                TABLE.get_or_init(|| {
                    ::sqlpatch::TableDef::new(#table)
                        #(.column(#column_defs))*
                })
            }

            fn table(&self) -> &'static ::sqlpatch::TableDef {
                <Self as ::sqlpatch::Record>::table_def()
            }

            fn field(
                &self,
                column: &::sqlpatch::Column,
            ) -> ::sqlpatch::OrmResult<::sqlpatch::FieldValue<'_>> {
                #(#accessors)*
                ::std::result::Result::Err(::sqlpatch::OrmError::field_access(
                    column.name.as_str(),
                    #missing,
                ))
            }
        }
    })
}

/// `Column` builder expression for one field.
fn column_def(column: &str, ty: &syn::Type, attrs: &FieldAttrs) -> TokenStream {
    let sql_type = attrs.declared_sql_type().unwrap_or(match attrs.kind() {
        FieldKind::Json => "Json",
        FieldKind::Bytes => "Blob",
        _ => infer_sql_type(ty),
    });
    let sql_type = format_ident!("{}", sql_type);

    let mut def = quote! {
        ::sqlpatch::Column::new(#column).sql_type(::sqlpatch::SqlType::#sql_type)
    };
    let roles = [
        (attrs.id, quote!(.primary_key())),
        (attrs.version, quote!(.version())),
        (attrs.created, quote!(.created())),
        (attrs.updated, quote!(.updated())),
        (attrs.auto_increment, quote!(.auto_increment())),
        (attrs.deleted, quote!(.deleted())),
    ];
    for (enabled, call) in roles {
        if enabled {
            def.extend(call);
        }
    }
    if let Some(nullable) = attrs.nullable {
        def.extend(quote!(.nullable(#nullable)));
    }
    if let Some(direction) = attrs.map_direction() {
        let direction = format_ident!("{}", direction);
        def.extend(quote!(.map_direction(::sqlpatch::MapDirection::#direction)));
    }
    def
}

/// Accessor expression yielding the field's `FieldValue`.
fn field_value(ident: &syn::Ident, ty: &syn::Type, kind: FieldKind) -> TokenStream {
    let inner_ty = option_inner(ty);
    let bytes = detect_bytes(inner_ty.unwrap_or(ty));
    let kind = match kind {
        FieldKind::Plain if bytes.is_some() => FieldKind::Bytes,
        kind => kind,
    };
    if kind == FieldKind::Plain {
        return quote!(::sqlpatch::ToField::to_field(&self.#ident));
    }

    let array = bytes == Some(ByteKind::Array);
    if inner_ty.is_none() {
        return wrap(kind, array, quote!(&self.#ident));
    }
    let value = wrap(kind, array, quote!(value));
    quote! {
        match &self.#ident {
            ::std::option::Option::Some(value) => {
                ::sqlpatch::FieldValue::Ptr(::std::boxed::Box::new(#value))
            }
            ::std::option::Option::None => ::sqlpatch::FieldValue::Nil,
        }
    }
}

fn wrap(kind: FieldKind, array: bool, value: TokenStream) -> TokenStream {
    match kind {
        FieldKind::Json => {
            quote!(::sqlpatch::FieldValue::Struct(::sqlpatch::StructValue::document(#value)))
        }
        FieldKind::Reference => {
            quote!(::sqlpatch::FieldValue::Struct(::sqlpatch::StructValue::reference(#value)))
        }
        FieldKind::Convert => quote!(::sqlpatch::FieldValue::Custom(#value)),
        FieldKind::Scalar => quote!(::sqlpatch::FieldValue::Scalar(#value)),
        FieldKind::Bytes => {
            let bytes = quote!(::std::convert::AsRef::<[u8]>::as_ref(#value));
            if array {
                quote!(::sqlpatch::FieldValue::ByteArray(#bytes))
            } else {
                quote!(::sqlpatch::FieldValue::Bytes(#bytes))
            }
        }
        FieldKind::Plain => quote!(::sqlpatch::ToField::to_field(#value)),
    }
}
