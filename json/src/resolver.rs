//! External reference resolvers.
//!
//! The engine closes over `$ref` targets at registration time through a
//! chain of [`SchemaResolver`]s, first non-empty result wins. Two
//! backings are provided: an in-memory table for pre-loaded documents
//! and a directory of schema files addressed by URI prefix.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use schema_eval_core::{InstanceNode, SchemaResolver};

use crate::provider::{parse_json, parse_yaml};

/// In-memory resolver: URI string to pre-wrapped schema document.
///
/// # Examples
///
/// ```
/// use schema_eval_core::Validator;
/// use schema_eval_json::{MapResolver, parse_json};
///
/// let mut external = MapResolver::new();
/// external.insert(
///     "https://example.com/name",
///     parse_json(r#"{"type": "string"}"#).unwrap(),
/// );
///
/// let mut validator = Validator::builder().with_resolver(external).build();
/// let schema = parse_json(r#"{"$ref": "https://example.com/name"}"#).unwrap();
/// let uri = validator
///     .register_schema("https://example.com/root", &schema)
///     .unwrap();
/// assert!(
///     validator
///         .validate(&uri, &parse_json("\"ok\"").unwrap())
///         .unwrap()
///         .valid
/// );
/// ```
#[derive(Default)]
pub struct MapResolver {
    schemas: HashMap<String, InstanceNode>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a document under a URI.
    pub fn insert(&mut self, uri: impl Into<String>, schema: InstanceNode) {
        self.schemas.insert(uri.into(), schema);
    }
}

impl SchemaResolver for MapResolver {
    fn resolve(&self, uri: &str) -> Option<InstanceNode> {
        self.schemas.get(uri).cloned()
    }
}

/// Directory-backed resolver: URIs under a prefix map to files on disk.
///
/// `https://example.com/schemas/user.json` with prefix
/// `https://example.com/schemas/` resolves to `<root>/user.json`. Files
/// ending in `.yaml`/`.yml` are parsed as YAML, everything else as JSON.
/// Paths escaping the root directory are rejected.
pub struct DirResolver {
    prefix: String,
    root: PathBuf,
}

impl DirResolver {
    pub fn new(prefix: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            root: root.into(),
        }
    }

    fn relative_path(&self, uri: &str) -> Option<PathBuf> {
        let relative = uri.strip_prefix(&self.prefix)?;
        let path = Path::new(relative);
        if path
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            Some(self.root.join(path))
        } else {
            None
        }
    }
}

impl SchemaResolver for DirResolver {
    fn resolve(&self, uri: &str) -> Option<InstanceNode> {
        let path = self.relative_path(uri)?;
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(uri, path = %path.display(), error = %e, "schema file unreadable");
                return None;
            }
        };
        let yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
        let parsed = if yaml {
            parse_yaml(&text)
        } else {
            parse_json(&text)
        };
        match parsed {
            Ok(document) => Some(document),
            Err(e) => {
                tracing::debug!(uri, error = %e, "schema file failed to parse");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_resolver_returns_registered_documents() {
        let mut resolver = MapResolver::new();
        resolver.insert("urn:a", parse_json("true").unwrap());
        assert!(resolver.resolve("urn:a").is_some());
        assert!(resolver.resolve("urn:b").is_none());
    }

    #[test]
    fn test_dir_resolver_rejects_escaping_paths() {
        let resolver = DirResolver::new("https://example.com/", "/tmp/schemas");
        assert!(resolver.relative_path("https://example.com/../etc/passwd").is_none());
        assert!(resolver.relative_path("https://other.org/x.json").is_none());
        assert_eq!(
            resolver.relative_path("https://example.com/a/b.json"),
            Some(PathBuf::from("/tmp/schemas/a/b.json"))
        );
    }
}
