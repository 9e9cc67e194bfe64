use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{AccessScripts, DialectScripts, OracleScripts, SqliteScripts, TSqlScripts};

/// Lookup of dialects by name, built once at startup and handed to whoever
/// needs it. Names compare case-insensitively.
#[derive(Clone, Default)]
pub struct DialectRegistry {
    dialects: BTreeMap<String, Arc<dyn DialectScripts>>,
}

impl DialectRegistry {
    pub fn empty() -> Self {
        DialectRegistry::default()
    }

    /// Every dialect shipped with sqlmill.
    pub fn standard() -> Self {
        let mut registry = DialectRegistry::empty();
        registry.register(Arc::new(TSqlScripts::modern()));
        registry.register(Arc::new(TSqlScripts::sql2000()));
        registry.register(Arc::new(AccessScripts));
        registry.register(Arc::new(OracleScripts));
        registry.register(Arc::new(SqliteScripts));
        registry
    }

    /// Adds or replaces the dialect under its own name.
    pub fn register(&mut self, dialect: Arc<dyn DialectScripts>) {
        self.dialects.insert(dialect.name().to_ascii_lowercase(), dialect);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn DialectScripts>> {
        self.dialects.get(&name.to_ascii_lowercase()).cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.dialects.values().map(|d| d.name()).collect()
    }
}

impl std::fmt::Debug for DialectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialectRegistry").field("dialects", &self.names()).finish()
    }
}
