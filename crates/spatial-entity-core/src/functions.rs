//! Custom query-language functions.

use std::collections::BTreeMap;
use std::fmt;

/// Category of a custom query function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FunctionKind {
    /// Date and time functions.
    Datetime,
    /// Numeric functions.
    Numeric,
    /// String functions.
    String,
}

impl FunctionKind {
    /// All kinds, in registration order.
    pub const ALL: [FunctionKind; 3] = [
        FunctionKind::Datetime,
        FunctionKind::Numeric,
        FunctionKind::String,
    ];

    /// Parse a configuration key such as `string` or `string_functions`.
    ///
    /// Returns `None` for keys that do not name a function kind.
    pub fn from_config_key(key: &str) -> Option<Self> {
        let key = key.trim().to_ascii_lowercase();
        let kind = key.strip_suffix("_functions").unwrap_or(&key);
        match kind {
            "datetime" => Some(FunctionKind::Datetime),
            "numeric" => Some(FunctionKind::Numeric),
            "string" => Some(FunctionKind::String),
            _ => None,
        }
    }

    /// Configuration key for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionKind::Datetime => "datetime",
            FunctionKind::Numeric => "numeric",
            FunctionKind::String => "string",
        }
    }
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registered query functions, keyed by kind and lowercase name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFunctionRegistry {
    functions: BTreeMap<FunctionKind, BTreeMap<String, String>>,
}

impl QueryFunctionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function. Names are case-insensitive; a later registration
    /// of the same name replaces the handler.
    pub fn register(
        &mut self,
        kind: FunctionKind,
        name: impl AsRef<str>,
        handler: impl Into<String>,
    ) {
        self.functions
            .entry(kind)
            .or_default()
            .insert(name.as_ref().to_lowercase(), handler.into());
    }

    /// Register every entry of a `dql` configuration table.
    ///
    /// Keys that do not name a function kind are skipped.
    pub fn register_config(&mut self, dql: &BTreeMap<String, BTreeMap<String, String>>) {
        for (key, functions) in dql {
            let Some(kind) = FunctionKind::from_config_key(key) else {
                tracing::debug!(key = %key, "ignoring unknown query function kind");
                continue;
            };
            for (name, handler) in functions {
                self.register(kind, name, handler.clone());
            }
        }
    }

    /// Get the handler of a function.
    pub fn get(&self, kind: FunctionKind, name: &str) -> Option<&str> {
        self.functions
            .get(&kind)
            .and_then(|f| f.get(&name.to_lowercase()))
            .map(String::as_str)
    }

    /// Iterate over the functions of one kind, sorted by name.
    pub fn functions(&self, kind: FunctionKind) -> impl Iterator<Item = (&str, &str)> {
        self.functions
            .get(&kind)
            .into_iter()
            .flat_map(|f| f.iter().map(|(n, h)| (n.as_str(), h.as_str())))
    }

    /// Total number of registered functions.
    pub fn len(&self) -> usize {
        self.functions.values().map(BTreeMap::len).sum()
    }

    /// Check if no function is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dql(entries: &[(&str, &[(&str, &str)])]) -> BTreeMap<String, BTreeMap<String, String>> {
        entries
            .iter()
            .map(|(kind, fns)| {
                (
                    kind.to_string(),
                    fns.iter()
                        .map(|(n, h)| (n.to_string(), h.to_string()))
                        .collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_config_keys() {
        assert_eq!(
            FunctionKind::from_config_key("datetime_functions"),
            Some(FunctionKind::Datetime)
        );
        assert_eq!(
            FunctionKind::from_config_key("Numeric"),
            Some(FunctionKind::Numeric)
        );
        assert_eq!(FunctionKind::from_config_key("aggregate_functions"), None);
    }

    #[test]
    fn test_register_config_skips_unknown_kinds() {
        let mut registry = QueryFunctionRegistry::new();
        registry.register_config(&dql(&[
            ("datetime_functions", &[("DATE_FORMAT", "fn::DateFormat")]),
            ("string", &[("soundex", "fn::Soundex")]),
            ("spatial_functions", &[("st_within", "fn::StWithin")]),
        ]));

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.get(FunctionKind::Datetime, "date_format"),
            Some("fn::DateFormat")
        );
        assert_eq!(
            registry.get(FunctionKind::String, "SOUNDEX"),
            Some("fn::Soundex")
        );
        assert_eq!(registry.get(FunctionKind::Numeric, "st_within"), None);
    }

    #[test]
    fn test_functions_listing() {
        let mut registry = QueryFunctionRegistry::new();
        registry.register(FunctionKind::Numeric, "round", "fn::Round");
        registry.register(FunctionKind::Numeric, "ACOS", "fn::Acos");

        let names: Vec<_> = registry
            .functions(FunctionKind::Numeric)
            .map(|(n, _)| n)
            .collect();
        assert_eq!(names, vec!["acos", "round"]);
        assert_eq!(registry.functions(FunctionKind::String).count(), 0);
    }
}
