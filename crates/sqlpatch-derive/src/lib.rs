//! Derive macros for sqlpatch
//!
//! Provides `#[derive(Record)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod common;
mod record;
mod sql_ident;

/// Derive the `Record` trait for a struct.
///
/// # Example
///
/// ```ignore
/// use sqlpatch::Record;
///
/// #[derive(Record)]
/// #[orm(table = "users")]
/// struct User {
///     #[orm(id)]
///     code: String,
///     name: String,
///     #[orm(column = "years")]
///     age: i32,
///     #[orm(deleted)]
///     deleted_at: Option<chrono::DateTime<chrono::Utc>>,
/// }
/// ```
///
/// # Generated
///
/// - `fn table_def() -> &'static TableDef` - column catalog, built once
/// - `fn table(&self) -> &'static TableDef`
/// - `fn field(&self, column: &Column) -> OrmResult<FieldValue<'_>>`
///
/// # Struct attributes
///
/// - `#[orm(table = "name")]` - Table name (defaults to the snake_case struct name)
///
/// # Field attributes
///
/// - `id`, `version`, `created`, `updated`, `auto_increment`, `deleted` - Column roles
/// - `nullable` / `not_null` - Override nullability (every column except `id` is nullable by default)
/// - `read_only` / `write_only` - Mapping direction
/// - `column = "name"` - Map field to a different column name
/// - `sql_type = "jsonb"` - Storage type (inferred from the Rust type otherwise)
/// - `json` - Serialize the field as a JSON document
/// - `reference` - The field is another `Record`; its primary key is written
/// - `convert` - The field implements `ToDb`
/// - `scalar` - The field implements `ScalarValue`
/// - `bytes` - Treat the field as a byte sequence
/// - `skip` - Not a column
#[proc_macro_derive(Record, attributes(orm))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
