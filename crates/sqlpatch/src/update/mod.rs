//! Record-to-UPDATE-clause compiler.
//!
//! Columns are visited in catalog order. For each one the classifier applies
//! the policy, the encoder turns the field into a [`Value`](crate::Value) (or
//! skips it), and the assembler records the result.
//!
//! # Example
//! ```ignore
//! use sqlpatch::{MySql, UpdateContext, UpdatePolicy, build_update_clause};
//!
//! let ctx = UpdateContext::new(&MySql);
//! let clause = build_update_clause(&user, &UpdatePolicy::new(), &ctx)?;
//! assert_eq!(clause.fragments(), vec!["`name` = ?"]);
//! ```

mod classify;
mod clause;
mod encode;


pub use classify::{Classification, Classified, SkipReason, classify, policy_skip};
pub use clause::{ClauseEntry, UpdateClause, UpdateStatement};
pub use encode::Encoder;

use chrono::{FixedOffset, Offset, Utc};

use crate::catalog::Record;
use crate::dialect::Dialect;
use crate::error::OrmResult;
use crate::policy::UpdatePolicy;

/// Environment an update clause is built in.
#[derive(Debug, Clone, Copy)]
pub struct UpdateContext<'a> {
    pub dialect: &'a dyn Dialect,
    /// Default zone for time columns without their own.
    pub time_zone: FixedOffset,
}

impl<'a> UpdateContext<'a> {
    /// Context with UTC as the default time zone.
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self {
            dialect,
            time_zone: Utc.fix(),
        }
    }

    pub fn time_zone(mut self, tz: FixedOffset) -> Self {
        self.time_zone = tz;
        self
    }
}

/// Build the UPDATE clause for `record` under `policy`.
///
/// All-or-nothing: on error no clause is returned.
pub fn build_update_clause(
    record: &dyn Record,
    policy: &UpdatePolicy,
    ctx: &UpdateContext<'_>,
) -> OrmResult<UpdateClause> {
    let table = record.table();
    let encoder = Encoder {
        dialect: ctx.dialect,
        time_zone: ctx.time_zone,
        use_bool: policy.use_bool,
    };

    let mut clause = UpdateClause::new();
    for column in table.columns() {
        let field = match classify(column, record, policy)? {
            Classification::Include(field) => field,
            Classification::Skip(reason) => {
                tracing::trace!(
                    target: "sqlpatch.update",
                    table = %table.name,
                    column = %column.name,
                    reason = reason.as_str(),
                    "column skipped"
                );
                continue;
            }
        };

        let kind = field.value.kind();
        let Some(value) = encoder.encode(field.value, field.required, field.include_nil, column)?
        else {
            tracing::trace!(
                target: "sqlpatch.update",
                table = %table.name,
                column = %column.name,
                kind,
                "column skipped by encoder"
            );
            continue;
        };
        clause.push(column, value, ctx.dialect);
    }

    tracing::debug!(
        target: "sqlpatch.update",
        table = %table.name,
        dialect = ctx.dialect.name(),
        set_count = clause.set_len(),
        param_count = clause.entries().len(),
        "built update clause"
    );

    Ok(clause)
}
