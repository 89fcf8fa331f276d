//! Attribute parsing for the Record derive macro.
//!
//! Handles parsing of struct-level and field-level `#[orm(...)]` attributes.

use heck::ToSnakeCase;
use syn::{DeriveInput, Result};

use crate::common::syn_types::parse_sql_type;
use crate::sql_ident::{parse_sql_ident, parse_sql_ident_with_span};

pub(super) struct StructAttrs {
    pub(super) table: String,
}

struct StructAttrList {
    table: Option<String>,
}

impl syn::parse::Parse for StructAttrList {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut table = None;

        loop {
            if input.is_empty() {
                break;
            }

            let ident: syn::Ident = input.parse()?;
            let _: syn::Token![=] = input.parse()?;
            let value: syn::LitStr = input.parse()?;

            match ident.to_string().as_str() {
                "table" => table = Some(parse_sql_ident(&value, "table")?),
                other => {
                    return Err(syn::Error::new_spanned(
                        &ident,
                        format!("unknown struct attribute `{other}`"),
                    ));
                }
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        Ok(Self { table })
    }
}

/// Extract struct-level attributes. The table name defaults to the snake_case
/// struct name.
pub(super) fn get_struct_attrs(input: &DeriveInput) -> Result<StructAttrs> {
    let mut table: Option<String> = None;

    for attr in &input.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        if let syn::Meta::List(meta_list) = &attr.meta {
            let parsed = syn::parse2::<StructAttrList>(meta_list.tokens.clone())?;
            if parsed.table.is_some() {
                table = parsed.table;
            }
        }
    }

    let table = match table {
        Some(table) => table,
        None => parse_sql_ident_with_span(
            &input.ident.to_string().to_snake_case(),
            input.ident.span(),
            "derived table name",
        )?,
    };
    Ok(StructAttrs { table })
}

/// How a field's value is exposed to the update pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum FieldKind {
    /// Through its `ToField` impl.
    Plain,
    Json,
    Reference,
    Convert,
    Scalar,
    Bytes,
}

#[derive(Default)]
pub(super) struct FieldAttrs {
    pub(super) id: bool,
    pub(super) version: bool,
    pub(super) created: bool,
    pub(super) updated: bool,
    pub(super) auto_increment: bool,
    pub(super) deleted: bool,
    pub(super) nullable: Option<bool>,
    pub(super) read_only: bool,
    pub(super) write_only: bool,
    pub(super) column: Option<String>,
    pub(super) sql_type: Option<&'static str>,
    pub(super) skip: bool,
    kinds: Vec<FieldKind>,
}

impl FieldAttrs {
    pub(super) fn kind(&self) -> FieldKind {
        self.kinds.first().copied().unwrap_or(FieldKind::Plain)
    }

    /// `SqlType` variant name, when declared.
    pub(super) fn declared_sql_type(&self) -> Option<&'static str> {
        self.sql_type
    }

    /// `MapDirection` variant name, unless the default applies.
    pub(super) fn map_direction(&self) -> Option<&'static str> {
        if self.read_only {
            Some("ReadOnly")
        } else if self.write_only {
            Some("WriteOnly")
        } else {
            None
        }
    }
}

impl syn::parse::Parse for FieldAttrs {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attrs = FieldAttrs::default();

        loop {
            if input.is_empty() {
                break;
            }

            let ident: syn::Ident = input.parse()?;
            let key = ident.to_string();

            match key.as_str() {
                "id" => attrs.id = true,
                "version" => attrs.version = true,
                "created" => attrs.created = true,
                "updated" => attrs.updated = true,
                "auto_increment" => attrs.auto_increment = true,
                "deleted" => attrs.deleted = true,
                "nullable" => attrs.nullable = Some(true),
                "not_null" => attrs.nullable = Some(false),
                "read_only" => attrs.read_only = true,
                "write_only" => attrs.write_only = true,
                "skip" => attrs.skip = true,
                "json" => attrs.kinds.push(FieldKind::Json),
                "reference" => attrs.kinds.push(FieldKind::Reference),
                "convert" => attrs.kinds.push(FieldKind::Convert),
                "scalar" => attrs.kinds.push(FieldKind::Scalar),
                "bytes" => attrs.kinds.push(FieldKind::Bytes),
                "column" | "sql_type" => {
                    let _: syn::Token![=] = input.parse()?;
                    let value: syn::LitStr = input.parse()?;
                    if key == "column" {
                        attrs.column = Some(parse_sql_ident(&value, "column")?);
                    } else {
                        let ty = parse_sql_type(&value.value()).ok_or_else(|| {
                            syn::Error::new(
                                value.span(),
                                format!("unknown sql_type `{}`", value.value()),
                            )
                        })?;
                        attrs.sql_type = Some(ty);
                    }
                }
                other => {
                    return Err(syn::Error::new_spanned(
                        &ident,
                        format!("unknown field attribute `{other}`"),
                    ));
                }
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        Ok(attrs)
    }
}

pub(super) fn get_field_attrs(field: &syn::Field) -> Result<FieldAttrs> {
    let mut merged = FieldAttrs::default();

    for attr in &field.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        if let syn::Meta::List(meta_list) = &attr.meta {
            let parsed = syn::parse2::<FieldAttrs>(meta_list.tokens.clone())?;
            merged.id |= parsed.id;
            merged.version |= parsed.version;
            merged.created |= parsed.created;
            merged.updated |= parsed.updated;
            merged.auto_increment |= parsed.auto_increment;
            merged.deleted |= parsed.deleted;
            merged.read_only |= parsed.read_only;
            merged.write_only |= parsed.write_only;
            merged.skip |= parsed.skip;
            merged.kinds.extend(parsed.kinds);
            if parsed.nullable.is_some() {
                merged.nullable = parsed.nullable;
            }
            if parsed.column.is_some() {
                merged.column = parsed.column;
            }
            if parsed.sql_type.is_some() {
                merged.sql_type = parsed.sql_type;
            }
        }
    }

    // Validate conflicts
    if merged.kinds.len() > 1 {
        return Err(syn::Error::new_spanned(
            field,
            "json, reference, convert, scalar and bytes are mutually exclusive",
        ));
    }
    if merged.read_only && merged.write_only {
        return Err(syn::Error::new_spanned(
            field,
            "read_only and write_only are mutually exclusive",
        ));
    }
    if merged.id && merged.nullable == Some(true) {
        return Err(syn::Error::new_spanned(
            field,
            "a primary key column cannot be nullable",
        ));
    }
    if merged.skip && (merged.id || merged.column.is_some()) {
        return Err(syn::Error::new_spanned(
            field,
            "skip cannot be combined with id or column",
        ));
    }

    Ok(merged)
}
