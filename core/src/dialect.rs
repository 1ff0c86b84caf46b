//! Dialect and vocabulary tables for the five specification versions.
//!
//! A [`Draft`] answers, for every keyword name: is it bound in this
//! dialect, which vocabulary owns it, does its value contain subschemas
//! the compiler must walk, and how does it behave (assertion, applicator,
//! reference, annotation, or a reserved location the compiler consumes
//! itself).
//!
//! Vocabulary activation is a 2019-09/2020-12 concept: deactivating a
//! vocabulary removes its keyword bindings at schema-parse time for the
//! affected schema resource. String-valued keywords of a deactivated
//! vocabulary degrade to annotation-only evaluators; everything else is
//! skipped.

use std::collections::BTreeSet;

/// One of the five supported specification versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Draft {
    Draft4,
    Draft6,
    Draft7,
    Draft201909,
    Draft202012,
}

impl Draft {
    /// Maps a `$schema` URI to its draft. Trailing empty fragments are
    /// tolerated (`http://json-schema.org/draft-07/schema#`).
    ///
    /// # Examples
    ///
    /// ```
    /// use schema_eval_core::Draft;
    ///
    /// assert_eq!(
    ///     Draft::from_meta_schema_uri("https://json-schema.org/draft/2020-12/schema"),
    ///     Some(Draft::Draft202012)
    /// );
    /// assert_eq!(
    ///     Draft::from_meta_schema_uri("http://json-schema.org/draft-04/schema#"),
    ///     Some(Draft::Draft4)
    /// );
    /// assert_eq!(Draft::from_meta_schema_uri("https://example.com/meta"), None);
    /// ```
    pub fn from_meta_schema_uri(uri: &str) -> Option<Draft> {
        match uri.trim_end_matches('#') {
            "http://json-schema.org/draft-04/schema" => Some(Draft::Draft4),
            "http://json-schema.org/draft-06/schema" => Some(Draft::Draft6),
            "http://json-schema.org/draft-07/schema" => Some(Draft::Draft7),
            "https://json-schema.org/draft/2019-09/schema" => Some(Draft::Draft201909),
            "https://json-schema.org/draft/2020-12/schema" => Some(Draft::Draft202012),
            _ => None,
        }
    }

    /// The canonical meta-schema URI for this draft.
    pub fn meta_schema_uri(self) -> &'static str {
        match self {
            Draft::Draft4 => "http://json-schema.org/draft-04/schema",
            Draft::Draft6 => "http://json-schema.org/draft-06/schema",
            Draft::Draft7 => "http://json-schema.org/draft-07/schema",
            Draft::Draft201909 => "https://json-schema.org/draft/2019-09/schema",
            Draft::Draft202012 => "https://json-schema.org/draft/2020-12/schema",
        }
    }

    /// Whether this draft partitions keywords into toggleable vocabularies.
    pub fn has_vocabularies(self) -> bool {
        self >= Draft::Draft201909
    }

    /// Whether keywords unknown to the dialect are collected as
    /// annotations (2019-09 and 2020-12) or silently skipped (4-7).
    pub(crate) fn unknown_keywords_as_annotations(self) -> bool {
        self >= Draft::Draft201909
    }

    /// In drafts 4-7 a `$ref` makes its sibling keywords inert.
    pub(crate) fn ref_is_exclusive(self) -> bool {
        self <= Draft::Draft7
    }

    /// All vocabularies this draft defines, i.e. the default activation.
    pub fn default_vocabularies(self) -> VocabularySet {
        let mut set = VocabularySet::default();
        if !self.has_vocabularies() {
            return set;
        }
        set.insert(Vocabulary::Core);
        set.insert(Vocabulary::Applicator);
        set.insert(Vocabulary::Validation);
        set.insert(Vocabulary::Metadata);
        set.insert(Vocabulary::FormatAnnotation);
        set.insert(Vocabulary::Content);
        if self == Draft::Draft202012 {
            set.insert(Vocabulary::Unevaluated);
        }
        set
    }

    /// Looks up the binding for a keyword name in this dialect.
    pub(crate) fn keyword(self, name: &str) -> Option<KeywordInfo> {
        keyword_info(self, name)
    }
}

/// A named, independently toggleable keyword group (2019-09/2020-12).
///
/// Earlier drafts have no vocabulary concept; their keywords are tagged
/// with the group they later joined, and activation is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Vocabulary {
    Core,
    Applicator,
    Unevaluated,
    Validation,
    Metadata,
    FormatAnnotation,
    Content,
}

impl Vocabulary {
    /// The vocabulary URI in the given draft, when the draft defines it.
    pub fn uri(self, draft: Draft) -> Option<&'static str> {
        match draft {
            Draft::Draft201909 => match self {
                Vocabulary::Core => Some("https://json-schema.org/draft/2019-09/vocab/core"),
                Vocabulary::Applicator => {
                    Some("https://json-schema.org/draft/2019-09/vocab/applicator")
                }
                Vocabulary::Validation => {
                    Some("https://json-schema.org/draft/2019-09/vocab/validation")
                }
                Vocabulary::Metadata => {
                    Some("https://json-schema.org/draft/2019-09/vocab/meta-data")
                }
                Vocabulary::FormatAnnotation => {
                    Some("https://json-schema.org/draft/2019-09/vocab/format")
                }
                Vocabulary::Content => Some("https://json-schema.org/draft/2019-09/vocab/content"),
                Vocabulary::Unevaluated => None,
            },
            Draft::Draft202012 => match self {
                Vocabulary::Core => Some("https://json-schema.org/draft/2020-12/vocab/core"),
                Vocabulary::Applicator => {
                    Some("https://json-schema.org/draft/2020-12/vocab/applicator")
                }
                Vocabulary::Unevaluated => {
                    Some("https://json-schema.org/draft/2020-12/vocab/unevaluated")
                }
                Vocabulary::Validation => {
                    Some("https://json-schema.org/draft/2020-12/vocab/validation")
                }
                Vocabulary::Metadata => {
                    Some("https://json-schema.org/draft/2020-12/vocab/meta-data")
                }
                Vocabulary::FormatAnnotation => {
                    Some("https://json-schema.org/draft/2020-12/vocab/format-annotation")
                }
                Vocabulary::Content => Some("https://json-schema.org/draft/2020-12/vocab/content"),
            },
            _ => None,
        }
    }

    /// Reverse lookup of [`Vocabulary::uri`] for one draft.
    pub fn from_uri(draft: Draft, uri: &str) -> Option<Vocabulary> {
        [
            Vocabulary::Core,
            Vocabulary::Applicator,
            Vocabulary::Unevaluated,
            Vocabulary::Validation,
            Vocabulary::Metadata,
            Vocabulary::FormatAnnotation,
            Vocabulary::Content,
        ]
        .into_iter()
        .find(|v| v.uri(draft) == Some(uri))
    }
}

/// The set of vocabularies active for one schema resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VocabularySet {
    active: BTreeSet<Vocabulary>,
}

impl VocabularySet {
    pub fn insert(&mut self, vocabulary: Vocabulary) {
        self.active.insert(vocabulary);
    }

    pub fn remove(&mut self, vocabulary: Vocabulary) {
        self.active.remove(&vocabulary);
    }

    pub fn contains(&self, vocabulary: Vocabulary) -> bool {
        self.active.contains(&vocabulary)
    }
}

/// Where subschemas live inside a keyword's value, for the compile walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SubschemaShape {
    /// The value contains no subschemas.
    Leaf,
    /// The value is itself a schema (`not`, `additionalProperties`).
    Value,
    /// The value is an array of schemas (`allOf`, `prefixItems`).
    List,
    /// Schema or array of schemas (`items` before 2020-12).
    ValueOrList,
    /// The value maps names to schemas (`properties`, `$defs`).
    Map,
    /// Mixed map of schemas and string arrays (`dependencies`, drafts 4-7).
    DependencyMap,
}

/// Behavioral family of a keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeywordClass {
    Assertion,
    Applicator,
    Reference,
    Annotation,
    /// Consumed by the compiler (identifiers, anchors, `$defs`, `then`,
    /// `else`, draft-4 boolean exclusives); never becomes an evaluator of
    /// its own.
    Reserved,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct KeywordInfo {
    pub vocabulary: Vocabulary,
    pub shape: SubschemaShape,
    pub class: KeywordClass,
}

fn info(vocabulary: Vocabulary, shape: SubschemaShape, class: KeywordClass) -> Option<KeywordInfo> {
    Some(KeywordInfo {
        vocabulary,
        shape,
        class,
    })
}

fn keyword_info(draft: Draft, name: &str) -> Option<KeywordInfo> {
    use Draft::*;
    use SubschemaShape::*;
    use Vocabulary::*;

    match name {
        // -- core ---------------------------------------------------------
        "$ref" => info(Core, Leaf, KeywordClass::Reference),
        "$recursiveRef" if draft == Draft201909 => info(Core, Leaf, KeywordClass::Reference),
        "$dynamicRef" if draft == Draft202012 => info(Core, Leaf, KeywordClass::Reference),
        "id" if draft == Draft4 => info(Core, Leaf, KeywordClass::Reserved),
        "$id" if draft >= Draft6 => info(Core, Leaf, KeywordClass::Reserved),
        "$anchor" if draft >= Draft201909 => info(Core, Leaf, KeywordClass::Reserved),
        "$recursiveAnchor" if draft == Draft201909 => info(Core, Leaf, KeywordClass::Reserved),
        "$dynamicAnchor" if draft == Draft202012 => info(Core, Leaf, KeywordClass::Reserved),
        "$vocabulary" if draft >= Draft201909 => info(Core, Leaf, KeywordClass::Reserved),
        "$schema" => info(Core, Leaf, KeywordClass::Reserved),
        "$comment" if draft >= Draft7 => info(Core, Leaf, KeywordClass::Reserved),
        "$defs" if draft >= Draft201909 => info(Core, Map, KeywordClass::Reserved),
        // Reserved in every dialect so legacy references into
        // `definitions` keep resolving under newer drafts.
        "definitions" => info(Core, Map, KeywordClass::Reserved),

        // -- applicators --------------------------------------------------
        "properties" => info(Applicator, Map, KeywordClass::Applicator),
        "patternProperties" => info(Applicator, Map, KeywordClass::Applicator),
        "additionalProperties" => info(Applicator, Value, KeywordClass::Applicator),
        "propertyNames" if draft >= Draft6 => info(Applicator, Value, KeywordClass::Applicator),
        "dependencies" if draft <= Draft7 => {
            info(Applicator, DependencyMap, KeywordClass::Applicator)
        }
        "dependentSchemas" if draft >= Draft201909 => {
            info(Applicator, Map, KeywordClass::Applicator)
        }
        "items" if draft <= Draft201909 => info(Applicator, ValueOrList, KeywordClass::Applicator),
        "items" => info(Applicator, Value, KeywordClass::Applicator),
        "additionalItems" if draft <= Draft201909 => {
            info(Applicator, Value, KeywordClass::Applicator)
        }
        "prefixItems" if draft == Draft202012 => info(Applicator, List, KeywordClass::Applicator),
        "contains" if draft >= Draft6 => info(Applicator, Value, KeywordClass::Applicator),
        "allOf" | "anyOf" | "oneOf" => info(Applicator, List, KeywordClass::Applicator),
        "not" => info(Applicator, Value, KeywordClass::Applicator),
        "if" if draft >= Draft7 => info(Applicator, Value, KeywordClass::Applicator),
        // Compiled for reachability, evaluated through `if`.
        "then" | "else" if draft >= Draft7 => info(Applicator, Value, KeywordClass::Reserved),
        "unevaluatedItems" if draft == Draft201909 => {
            info(Applicator, Value, KeywordClass::Applicator)
        }
        "unevaluatedProperties" if draft == Draft201909 => {
            info(Applicator, Value, KeywordClass::Applicator)
        }
        "unevaluatedItems" if draft == Draft202012 => {
            info(Unevaluated, Value, KeywordClass::Applicator)
        }
        "unevaluatedProperties" if draft == Draft202012 => {
            info(Unevaluated, Value, KeywordClass::Applicator)
        }

        // -- assertions ---------------------------------------------------
        "type" | "enum" => info(Validation, Leaf, KeywordClass::Assertion),
        "const" if draft >= Draft6 => info(Validation, Leaf, KeywordClass::Assertion),
        "multipleOf" | "maximum" | "minimum" => info(Validation, Leaf, KeywordClass::Assertion),
        // Boolean modifiers of minimum/maximum in draft 4, standalone
        // numeric assertions from draft 6 on.
        "exclusiveMaximum" | "exclusiveMinimum" if draft == Draft4 => info(Validation, Leaf, KeywordClass::Reserved),
        "exclusiveMaximum" | "exclusiveMinimum" => info(Validation, Leaf, KeywordClass::Assertion),
        "maxLength" | "minLength" | "pattern" => info(Validation, Leaf, KeywordClass::Assertion),
        "maxItems" | "minItems" | "uniqueItems" => info(Validation, Leaf, KeywordClass::Assertion),
        "maxContains" | "minContains" if draft >= Draft201909 => info(Validation, Leaf, KeywordClass::Assertion),
        "maxProperties" | "minProperties" | "required" => info(Validation, Leaf, KeywordClass::Assertion),
        "dependentRequired" if draft >= Draft201909 => info(Validation, Leaf, KeywordClass::Assertion),

        // -- annotations --------------------------------------------------
        "format" => info(FormatAnnotation, Leaf, KeywordClass::Annotation),
        "title" | "description" | "default" => info(Metadata, Leaf, KeywordClass::Annotation),
        "examples" if draft >= Draft6 => info(Metadata, Leaf, KeywordClass::Annotation),
        "deprecated" if draft >= Draft201909 => info(Metadata, Leaf, KeywordClass::Annotation),
        "readOnly" | "writeOnly" if draft >= Draft7 => info(Metadata, Leaf, KeywordClass::Annotation),
        "contentEncoding" | "contentMediaType" if draft >= Draft7 => {
            info(Content, Leaf, KeywordClass::Annotation)
        }
        "contentSchema" if draft >= Draft201909 => info(Content, Value, KeywordClass::Annotation),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_ordering_matches_publication_order() {
        assert!(Draft::Draft4 < Draft::Draft6);
        assert!(Draft::Draft7 < Draft::Draft201909);
        assert!(Draft::Draft201909 < Draft::Draft202012);
    }

    #[test]
    fn test_keyword_availability_per_draft() {
        assert!(Draft::Draft4.keyword("const").is_none());
        assert!(Draft::Draft6.keyword("const").is_some());
        assert!(Draft::Draft6.keyword("if").is_none());
        assert!(Draft::Draft7.keyword("if").is_some());
        assert!(Draft::Draft7.keyword("unevaluatedProperties").is_none());
        assert!(Draft::Draft201909.keyword("unevaluatedProperties").is_some());
        assert!(Draft::Draft201909.keyword("$dynamicRef").is_none());
        assert!(Draft::Draft202012.keyword("$dynamicRef").is_some());
        assert!(Draft::Draft202012.keyword("additionalItems").is_none());
    }

    #[test]
    fn test_draft4_exclusives_are_reserved() {
        let d4 = Draft::Draft4.keyword("exclusiveMinimum").unwrap();
        assert!(matches!(d4.class, KeywordClass::Reserved));
        let d6 = Draft::Draft6.keyword("exclusiveMinimum").unwrap();
        assert!(matches!(d6.class, KeywordClass::Assertion));
    }

    #[test]
    fn test_unevaluated_vocabulary_split() {
        let v2019 = Draft::Draft201909.keyword("unevaluatedProperties").unwrap();
        assert_eq!(v2019.vocabulary, Vocabulary::Applicator);
        let v2020 = Draft::Draft202012.keyword("unevaluatedProperties").unwrap();
        assert_eq!(v2020.vocabulary, Vocabulary::Unevaluated);
    }

    #[test]
    fn test_vocabulary_uri_round_trip() {
        for draft in [Draft::Draft201909, Draft::Draft202012] {
            let uri = Vocabulary::Validation.uri(draft).unwrap();
            assert_eq!(Vocabulary::from_uri(draft, uri), Some(Vocabulary::Validation));
        }
        assert_eq!(Vocabulary::Unevaluated.uri(Draft::Draft201909), None);
    }

    #[test]
    fn test_default_vocabularies() {
        let set = Draft::Draft202012.default_vocabularies();
        assert!(set.contains(Vocabulary::Unevaluated));
        let set = Draft::Draft201909.default_vocabularies();
        assert!(!set.contains(Vocabulary::Unevaluated));
        assert!(set.contains(Vocabulary::Validation));
    }
}
