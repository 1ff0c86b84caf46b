//! URI resolution helpers for identifiers and references.
//!
//! Schema identity is URI-based: `$id` establishes resource base URIs,
//! `$ref` values resolve against the lexical base, and the registry index
//! is keyed by absolute URI strings of the form `document#fragment`.
//!
//! `urn:` bases need special handling: the `url` crate refuses to join
//! relative paths against a URN, but fragment-only references (the common
//! case for `#/$defs/...` and `#anchor`) are always resolvable by
//! replacing the base's fragment.

use url::Url;

use crate::error::SchemaError;

/// Parses an absolute URI for use as a registration base.
///
/// An empty fragment (`http://example.com/s#`) is normalized away.
pub fn parse_base(uri: &str) -> Result<Url, SchemaError> {
    let mut url = Url::parse(uri).map_err(|e| SchemaError::InvalidUri {
        uri: uri.to_string(),
        reason: e.to_string(),
    })?;
    if url.fragment() == Some("") {
        url.set_fragment(None);
    }
    Ok(url)
}

/// Resolves a reference string against a base URI.
///
/// Fragment-only references replace the base's fragment; anything else is
/// joined relative to the base, falling back to absolute parsing when the
/// base cannot carry relative paths (URNs).
///
/// # Examples
///
/// ```
/// use schema_eval_core::uri::{parse_base, resolve_reference};
///
/// let base = parse_base("https://example.com/root.json").unwrap();
/// let joined = resolve_reference(&base, "defs.json#/a").unwrap();
/// assert_eq!(joined.as_str(), "https://example.com/defs.json#/a");
///
/// let urn = parse_base("urn:example:schema").unwrap();
/// let anchored = resolve_reference(&urn, "#node").unwrap();
/// assert_eq!(anchored.as_str(), "urn:example:schema#node");
/// ```
pub fn resolve_reference(base: &Url, reference: &str) -> Result<Url, SchemaError> {
    if let Some(fragment) = reference.strip_prefix('#') {
        let mut url = base.clone();
        url.set_fragment(if fragment.is_empty() {
            None
        } else {
            Some(fragment)
        });
        return Ok(url);
    }
    base.join(reference)
        .or_else(|_| Url::parse(reference))
        .map_err(|e| SchemaError::InvalidUri {
            uri: reference.to_string(),
            reason: e.to_string(),
        })
        .map(|mut url| {
            if url.fragment() == Some("") {
                url.set_fragment(None);
            }
            url
        })
}

/// Splits a resolved URI into its document part and its percent-decoded
/// fragment (empty when absent).
pub fn split_fragment(url: &Url) -> (String, String) {
    let fragment = url.fragment().map(percent_decode).unwrap_or_default();
    let mut doc = url.clone();
    doc.set_fragment(None);
    (doc.to_string(), fragment)
}

/// The registry index key for a resolved URI: `document#fragment`, or the
/// bare document URI when the fragment is empty.
pub fn index_key(url: &Url) -> String {
    let (doc, fragment) = split_fragment(url);
    alias_key(&doc, &fragment)
}

/// Builds an index key from a document URI string and a raw fragment.
pub fn alias_key(document: &str, fragment: &str) -> String {
    if fragment.is_empty() {
        document.to_string()
    } else {
        format!("{document}#{fragment}")
    }
}

/// True when a fragment is a JSON pointer rather than a plain-name anchor.
pub fn is_pointer_fragment(fragment: &str) -> bool {
    fragment.is_empty() || fragment.starts_with('/')
}

/// Decodes `%XX` escapes, leaving malformed sequences untouched.
pub fn percent_decode(text: &str) -> String {
    if !text.contains('%') {
        return text.to_string();
    }
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if let (Some(hi), Some(lo)) = (
                bytes.get(i + 1).and_then(|b| (*b as char).to_digit(16)),
                bytes.get(i + 2).and_then(|b| (*b as char).to_digit(16)),
            ) {
                out.push((hi * 16 + lo) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_drops_empty_fragment() {
        let url = parse_base("http://json-schema.org/draft-07/schema#").unwrap();
        assert_eq!(url.as_str(), "http://json-schema.org/draft-07/schema");
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = parse_base("https://example.com/a/root.json").unwrap();
        let target = resolve_reference(&base, "other.json").unwrap();
        assert_eq!(target.as_str(), "https://example.com/a/other.json");
    }

    #[test]
    fn test_resolve_absolute_overrides_base() {
        let base = parse_base("https://example.com/root.json").unwrap();
        let target = resolve_reference(&base, "urn:elsewhere").unwrap();
        assert_eq!(target.as_str(), "urn:elsewhere");
    }

    #[test]
    fn test_fragment_only_against_urn_base() {
        let base = parse_base("urn:test").unwrap();
        let target = resolve_reference(&base, "#/$defs/A").unwrap();
        assert_eq!(index_key(&target), "urn:test#/$defs/A");
    }

    #[test]
    fn test_relative_path_against_urn_base_is_an_error() {
        let base = parse_base("urn:test").unwrap();
        assert!(resolve_reference(&base, "other.json").is_err());
    }

    #[test]
    fn test_index_key_decodes_percent_escapes() {
        let base = parse_base("https://example.com/s").unwrap();
        let target = resolve_reference(&base, "#/a%20b").unwrap();
        assert_eq!(index_key(&target), "https://example.com/s#/a b");
    }

    #[test]
    fn test_pointer_fragment_detection() {
        assert!(is_pointer_fragment(""));
        assert!(is_pointer_fragment("/$defs/A"));
        assert!(!is_pointer_fragment("anchor"));
    }
}
