//! Field classifier: decides whether a column takes part in the UPDATE and with
//! which `required` / `include_nil` flags.

use crate::catalog::{Column, MapDirection, Record};
use crate::error::OrmResult;
use crate::field::FieldValue;
use crate::policy::UpdatePolicy;

/// Why a column was left out of the clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Version,
    Created,
    Updated,
    AutoIncrement,
    SoftDeleted,
    Omitted,
    NotSelected,
    ReadOnly,
    ExternallyHandled,
    /// The field's runtime type is indeterminate.
    Absent,
    /// Forced out through `must_columns`.
    ForcedExclude,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Version => "version",
            Self::Created => "created",
            Self::Updated => "updated",
            Self::AutoIncrement => "auto_increment",
            Self::SoftDeleted => "soft_deleted",
            Self::Omitted => "omitted",
            Self::NotSelected => "not_selected",
            Self::ReadOnly => "read_only",
            Self::ExternallyHandled => "externally_handled",
            Self::Absent => "absent",
            Self::ForcedExclude => "forced_exclude",
        }
    }
}

/// A column that survived classification.
#[derive(Debug)]
pub struct Classified<'a> {
    pub value: FieldValue<'a>,
    pub required: bool,
    pub include_nil: bool,
}

#[derive(Debug)]
pub enum Classification<'a> {
    Skip(SkipReason),
    Include(Classified<'a>),
}

/// Policy-only exclusion rules, checked in order before the field is read.
pub fn policy_skip(column: &Column, policy: &UpdatePolicy) -> Option<SkipReason> {
    if column.is_version && !policy.include_version {
        return Some(SkipReason::Version);
    }
    if column.is_created && !policy.cols.contains(&column.name) {
        return Some(SkipReason::Created);
    }
    if column.is_updated && !policy.include_updated {
        return Some(SkipReason::Updated);
    }
    if column.is_auto_increment && !policy.include_auto_increment {
        return Some(SkipReason::AutoIncrement);
    }
    if column.is_deleted && !policy.unscoped {
        return Some(SkipReason::SoftDeleted);
    }
    if policy.omit.contains(&column.name) {
        return Some(SkipReason::Omitted);
    }
    if !policy.cols.is_empty() && !policy.cols.contains(&column.name) {
        return Some(SkipReason::NotSelected);
    }
    if column.map_direction == MapDirection::ReadOnly {
        return Some(SkipReason::ReadOnly);
    }
    if policy.is_externally_handled(&column.name) {
        return Some(SkipReason::ExternallyHandled);
    }
    None
}

/// Classify one column of `record`.
///
/// Accessor failures abort with the accessor's error.
pub fn classify<'r>(
    column: &Column,
    record: &'r dyn Record,
    policy: &UpdatePolicy,
) -> OrmResult<Classification<'r>> {
    if let Some(reason) = policy_skip(column, policy) {
        return Ok(Classification::Skip(reason));
    }

    let mut value = record.field(column)?;
    if matches!(value, FieldValue::Absent) {
        return Ok(Classification::Skip(SkipReason::Absent));
    }

    let mut required = policy.all_cols;
    let mut include_nil = policy.all_cols || policy.include_nil;

    match policy.must_columns.get(column) {
        Some(true) => required = true,
        Some(false) => return Ok(Classification::Skip(SkipReason::ForcedExclude)),
        None => {}
    }

    if policy.nullable_columns.get(column) == Some(true) && column.nullable && value.is_zero() {
        value = FieldValue::Nil;
        include_nil = true;
    }

    Ok(Classification::Include(Classified {
        value,
        required,
        include_nil,
    }))
}
