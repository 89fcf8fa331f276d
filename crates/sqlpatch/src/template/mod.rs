//! Named SQL templates.
//!
//! SQL text is registered under `namespace.id` keys and compiled on first use
//! by a pluggable [`TemplateBuilder`]. The registry is owned by an
//! [`Engine`](crate::Engine); there is no process-wide state.
//!
//! # Example
//! ```ignore
//! use sqlpatch::template::{PlainTemplates, TemplateRegistry};
//!
//! let registry = TemplateRegistry::new(PlainTemplates);
//! registry.register("user", "active", "SELECT * FROM users\n  WHERE active")?;
//! let sql = registry.render("user.active", &serde_json::json!({}))?;
//! assert_eq!(sql, "SELECT * FROM users WHERE active");
//! ```

mod cache;


use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::error::{OrmError, OrmResult};
use cache::TemplateCache;

/// Namespace used when a template is registered without one.
pub const DEFAULT_NAMESPACE: &str = "default_namespace";

/// A compiled template.
pub trait Template: Send + Sync {
    /// Render with the given parameters.
    fn render(&self, params: &serde_json::Value) -> OrmResult<String>;
}

/// Compiles template source text.
pub trait TemplateBuilder: Send + Sync {
    fn build(&self, key: &str, source: &str) -> OrmResult<Arc<dyn Template>>;
}

/// Builder whose templates render their SQL text unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTemplates;

struct PlainTemplate(String);

impl Template for PlainTemplate {
    fn render(&self, _params: &serde_json::Value) -> OrmResult<String> {
        Ok(self.0.clone())
    }
}

impl TemplateBuilder for PlainTemplates {
    fn build(&self, _key: &str, source: &str) -> OrmResult<Arc<dyn Template>> {
        Ok(Arc::new(PlainTemplate(source.to_string())))
    }
}

/// Full registry key for `namespace` and `id`.
pub fn template_key(namespace: &str, id: &str) -> String {
    let namespace = if namespace.is_empty() {
        DEFAULT_NAMESPACE
    } else {
        namespace
    };
    format!("{namespace}.{id}")
}

fn normalize_source(sql: &str) -> String {
    sql.replace('\n', " ").trim().to_string()
}

fn collapse_whitespace(sql: &str) -> String {
    static SPACES_RE: OnceLock<Regex> = OnceLock::new();
    SPACES_RE
        .get_or_init(|| Regex::new(r"\s+").expect("invalid built-in whitespace regex"))
        .replace_all(sql.trim(), " ")
        .into_owned()
}

/// Registry of named SQL templates with compile-once-per-key caching.
pub struct TemplateRegistry {
    builder: Arc<dyn TemplateBuilder>,
    cache: TemplateCache,
}

impl TemplateRegistry {
    pub fn new(builder: impl TemplateBuilder + 'static) -> Self {
        Self::with_builder(Arc::new(builder))
    }

    pub fn with_builder(builder: Arc<dyn TemplateBuilder>) -> Self {
        Self {
            builder,
            cache: TemplateCache::default(),
        }
    }

    /// Register SQL under `namespace.id`.
    ///
    /// Newlines become spaces and the text is trimmed. Fails on an empty id or
    /// a key that is already registered.
    pub fn register(&self, namespace: &str, id: &str, sql: &str) -> OrmResult<()> {
        if id.trim().is_empty() {
            return Err(OrmError::template(format!(
                "{} has sql without an id",
                if namespace.is_empty() { DEFAULT_NAMESPACE } else { namespace }
            )));
        }
        let key = template_key(namespace, id.trim());
        self.cache.insert_if_absent(key, normalize_source(sql))
    }

    /// Register several `(id, sql)` pairs under one namespace.
    ///
    /// Stops at the first failure; entries registered before it are kept.
    pub fn register_all<'s>(
        &self,
        namespace: &str,
        entries: impl IntoIterator<Item = (&'s str, &'s str)>,
    ) -> OrmResult<usize> {
        let mut count = 0;
        for (id, sql) in entries {
            self.register(namespace, id, sql)?;
            count += 1;
        }
        Ok(count)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.cache.contains(key)
    }

    /// Registered (normalized) source for `key`.
    pub fn source(&self, key: &str) -> Option<String> {
        self.cache.source(key)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` has already been compiled.
    pub fn is_compiled(&self, key: &str) -> bool {
        self.cache.is_compiled(key)
    }

    /// The compiled template for `key`, compiling it on first use.
    pub fn get(&self, key: &str) -> OrmResult<Arc<dyn Template>> {
        if key.is_empty() {
            return Err(OrmError::template("the map key must not be empty"));
        }
        self.cache.get(key, self.builder.as_ref())
    }

    /// Render `key` with `params` and collapse whitespace runs to single spaces.
    pub fn render(&self, key: &str, params: &serde_json::Value) -> OrmResult<String> {
        let template = self.get(key)?;
        let sql = template.render(params)?;
        Ok(collapse_whitespace(&sql))
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new(PlainTemplates)
    }
}

impl fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateRegistry")
            .field("templates", &self.len())
            .finish()
    }
}
