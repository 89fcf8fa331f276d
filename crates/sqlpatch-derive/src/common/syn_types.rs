//! Type helper utilities for syn type analysis.

/// Extract the inner type T from Option<T>, or return None if not an Option type.
///
/// Recognizes `Option<T>`, `std::option::Option<T>`, and `core::option::Option<T>`.
pub fn option_inner(ty: &syn::Type) -> Option<&syn::Type> {
    single_generic_arg(ty, "Option")
}

/// Extract the inner type T from Vec<T>, or return None if not a Vec type.
///
/// Recognizes `Vec<T>` and `std::vec::Vec<T>`.
pub fn vec_inner(ty: &syn::Type) -> Option<&syn::Type> {
    single_generic_arg(ty, "Vec")
}

fn single_generic_arg<'a>(ty: &'a syn::Type, name: &str) -> Option<&'a syn::Type> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };
    let seg = type_path.path.segments.last()?;
    if seg.ident != name {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &seg.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    let syn::GenericArgument::Type(inner) = args.args.first()? else {
        return None;
    };
    Some(inner)
}

/// Last path segment identifier of a type (`chrono::DateTime<Utc>` -> `DateTime`).
pub fn last_ident(ty: &syn::Type) -> Option<String> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };
    Some(type_path.path.segments.last()?.ident.to_string())
}

fn is_u8(ty: &syn::Type) -> bool {
    matches!(ty, syn::Type::Path(p) if p.path.is_ident("u8"))
}

/// Byte payload shapes that bypass the generic collection encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteKind {
    /// `Vec<u8>`
    Vec,
    /// `[u8; N]`
    Array,
}

/// Detect `Vec<u8>` and `[u8; N]`.
pub fn detect_bytes(ty: &syn::Type) -> Option<ByteKind> {
    if let syn::Type::Array(arr) = ty {
        return is_u8(&arr.elem).then_some(ByteKind::Array);
    }
    vec_inner(ty).filter(|inner| is_u8(inner)).map(|_| ByteKind::Vec)
}

/// `SqlType` variant name for a Rust field type when none is declared.
pub fn infer_sql_type(ty: &syn::Type) -> &'static str {
    let ty = option_inner(ty).unwrap_or(ty);
    if detect_bytes(ty).is_some() {
        return "Blob";
    }
    if let syn::Type::Reference(r) = ty {
        return infer_sql_type(&r.elem);
    }
    match last_ident(ty).as_deref() {
        Some("bool") => "Bool",
        Some("i8" | "i16") => "SmallInt",
        Some("i32" | "u8" | "u16") => "Int",
        Some("i64" | "u32" | "u64" | "isize" | "usize") => "BigInt",
        Some("f32") => "Real",
        Some("f64") => "Double",
        Some("DateTime" | "NaiveDateTime") => "DateTime",
        Some("NaiveDate") => "Date",
        Some("Uuid") => "Uuid",
        Some("Vec" | "HashMap" | "BTreeMap" | "Value") => "Text",
        _ => "Varchar",
    }
}

/// Map a declared `sql_type = "..."` name to its `SqlType` variant name.
pub fn parse_sql_type(name: &str) -> Option<&'static str> {
    let variant = match name.trim().to_ascii_lowercase().as_str() {
        "bool" | "boolean" => "Bool",
        "smallint" | "int2" | "tinyint" => "SmallInt",
        "int" | "integer" | "int4" => "Int",
        "bigint" | "int8" => "BigInt",
        "real" | "float4" | "float" => "Real",
        "double" | "double precision" | "float8" => "Double",
        "numeric" | "decimal" => "Numeric",
        "char" | "character" => "Char",
        "varchar" | "character varying" => "Varchar",
        "text" => "Text",
        "uuid" => "Uuid",
        "json" => "Json",
        "jsonb" => "Jsonb",
        "bytea" => "Bytea",
        "blob" | "binary" | "varbinary" => "Blob",
        "date" => "Date",
        "time" => "Time",
        "datetime" => "DateTime",
        "timestamp" => "Timestamp",
        "timestamptz" | "timestamp with time zone" => "TimestampTz",
        _ => return None,
    };
    Some(variant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_option_inner() {
        let ty: syn::Type = parse_quote!(Option<String>);
        assert!(option_inner(&ty).is_some());

        let ty: syn::Type = parse_quote!(std::option::Option<i32>);
        assert!(option_inner(&ty).is_some());

        let ty: syn::Type = parse_quote!(String);
        assert!(option_inner(&ty).is_none());

        let ty: syn::Type = parse_quote!(Vec<String>);
        assert!(option_inner(&ty).is_none());
    }

    #[test]
    fn test_detect_bytes() {
        let ty: syn::Type = parse_quote!(Vec<u8>);
        assert_eq!(detect_bytes(&ty), Some(ByteKind::Vec));

        let ty: syn::Type = parse_quote!(std::vec::Vec<u8>);
        assert_eq!(detect_bytes(&ty), Some(ByteKind::Vec));

        let ty: syn::Type = parse_quote!([u8; 16]);
        assert_eq!(detect_bytes(&ty), Some(ByteKind::Array));

        let ty: syn::Type = parse_quote!(Vec<u16>);
        assert_eq!(detect_bytes(&ty), None);

        let ty: syn::Type = parse_quote!([i32; 4]);
        assert_eq!(detect_bytes(&ty), None);
    }

    #[test]
    fn test_infer_sql_type() {
        let ty: syn::Type = parse_quote!(Option<i64>);
        assert_eq!(infer_sql_type(&ty), "BigInt");

        let ty: syn::Type = parse_quote!(chrono::DateTime<chrono::Utc>);
        assert_eq!(infer_sql_type(&ty), "DateTime");

        let ty: syn::Type = parse_quote!(Option<Vec<u8>>);
        assert_eq!(infer_sql_type(&ty), "Blob");

        let ty: syn::Type = parse_quote!(Vec<String>);
        assert_eq!(infer_sql_type(&ty), "Text");

        let ty: syn::Type = parse_quote!(String);
        assert_eq!(infer_sql_type(&ty), "Varchar");
    }

    #[test]
    fn test_parse_sql_type() {
        assert_eq!(parse_sql_type("JSONB"), Some("Jsonb"));
        assert_eq!(parse_sql_type(" timestamp with time zone "), Some("TimestampTz"));
        assert_eq!(parse_sql_type("geometry"), None);
    }
}
