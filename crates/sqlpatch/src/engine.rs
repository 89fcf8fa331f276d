//! Engine: owns the dialect, the default time zone and the template registry.

use std::sync::Arc;

use chrono::{FixedOffset, Offset, Utc};
use serde::Serialize;

use crate::catalog::Record;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::policy::UpdatePolicy;
use crate::template::{TemplateBuilder, TemplateRegistry};
use crate::update::{UpdateClause, UpdateContext, UpdateStatement, build_update_clause};

/// Configuration for [`Engine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Default zone used to format time values.
    pub time_zone: FixedOffset,
    /// Log rendered template SQL at INFO level.
    pub show_sql: bool,
    /// Truncate logged SQL (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            time_zone: Utc.fix(),
            show_sql: false,
            max_sql_length: Some(200),
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default time zone.
    pub fn time_zone(mut self, tz: FixedOffset) -> Self {
        self.time_zone = tz;
        self
    }

    /// Log rendered template SQL.
    pub fn show_sql(mut self, yes: bool) -> Self {
        self.show_sql = yes;
        self
    }

    /// Set maximum SQL length to log.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation in logs.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }
}

/// Entry point tying a dialect to update-clause building and named SQL templates.
///
/// `Engine` is `Send + Sync`; share it behind an `Arc`.
#[derive(Debug)]
pub struct Engine {
    dialect: Arc<dyn Dialect>,
    config: EngineConfig,
    templates: TemplateRegistry,
}

impl Engine {
    /// Create an engine with default configuration and plain templates.
    pub fn new(dialect: impl Dialect + 'static) -> Self {
        Self::with_config(dialect, EngineConfig::default())
    }

    pub fn with_config(dialect: impl Dialect + 'static, config: EngineConfig) -> Self {
        Self {
            dialect: Arc::new(dialect),
            config,
            templates: TemplateRegistry::default(),
        }
    }

    /// Replace the template builder.
    ///
    /// Starts from an empty registry, so call this before registering SQL.
    pub fn template_builder(mut self, builder: impl TemplateBuilder + 'static) -> Self {
        self.templates = TemplateRegistry::new(builder);
        self
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    /// Register SQL under `namespace.id`.
    pub fn register_sql(&self, namespace: &str, id: &str, sql: &str) -> OrmResult<()> {
        self.templates.register(namespace, id, sql)
    }

    fn update_context(&self) -> UpdateContext<'_> {
        UpdateContext::new(self.dialect.as_ref()).time_zone(self.config.time_zone)
    }

    /// Build the UPDATE clause for `record`.
    pub fn update_clause(&self, record: &dyn Record, policy: &UpdatePolicy) -> OrmResult<UpdateClause> {
        build_update_clause(record, policy, &self.update_context())
    }

    /// Build and render a full UPDATE statement for `record`'s table.
    pub fn update_statement(
        &self,
        record: &dyn Record,
        policy: &UpdatePolicy,
    ) -> OrmResult<UpdateStatement> {
        let clause = self.update_clause(record, policy)?;
        clause.to_statement(&record.table().name, self.dialect())
    }

    /// Render the template registered under `key`.
    pub fn build_sql(&self, key: &str, params: &serde_json::Value) -> OrmResult<String> {
        let sql = self.templates.render(key, params)?;
        if self.config.show_sql {
            tracing::info!(
                target: "sqlpatch.sql",
                key,
                sql = %self.truncate_sql(&sql),
                "rendered template"
            );
        }
        Ok(sql)
    }

    /// Like [`build_sql`](Self::build_sql), serializing `params` first.
    pub fn build_sql_with<T: Serialize>(&self, key: &str, params: &T) -> OrmResult<String> {
        let params = serde_json::to_value(params)
            .map_err(|e| OrmError::Serialization(format!("template params for {key}: {e}")))?;
        self.build_sql(key, &params)
    }

    fn truncate_sql<'s>(&self, sql: &'s str) -> std::borrow::Cow<'s, str> {
        match self.config.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)).into(),
            _ => sql.into(),
        }
    }
}

fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
