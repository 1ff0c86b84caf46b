//! Recursive schema compilation.
//!
//! A document enters under an absolute base URI. Every schema object in
//! it is registered under its pointer-relative URI for each enclosing
//! resource, so discovering an `$id` rebases the whole subtree
//! (copy-not-move: the pointer-relative alias and the identifier-relative
//! alias both stay valid and point at the same arena node). Anchors add
//! `resource#name` aliases scoped to the nearest enclosing resource.
//!
//! References are closed over after the document compiles: every pending
//! absolute target is looked up in the index, and targets in documents
//! the registry has never seen are fetched through the external resolver
//! chain (first non-empty result wins) and compiled under the foreign
//! URI, until a fixpoint. Whatever stays pending surfaces as a
//! validation error at evaluation time, not a crash.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use url::Url;

use crate::dialect::{Draft, KeywordClass, SubschemaShape, Vocabulary, VocabularySet};
use crate::error::{Result, SchemaError};
use crate::keywords::{
    self, BoundKeyword, ChildSet, EvaluatorKind, FactoryInput, RefTarget,
};
use crate::registry::{MetaInfo, NodeId, Registry, SchemaNode, SchemaResolver};
use crate::uri::{alias_key, parse_base, resolve_reference};
use crate::validator::MalformedKeywordPolicy;
use crate::value::{InstanceNode, escape_token};

pub(crate) struct CompileOptions {
    pub default_draft: Draft,
    pub malformed: MalformedKeywordPolicy,
}

/// Base URI, dialect and vocabulary activation for the schema resource
/// currently being compiled.
#[derive(Clone)]
struct ResourceState {
    base: Url,
    draft: Draft,
    vocabularies: VocabularySet,
}

pub(crate) struct Compiler<'a> {
    registry: &'a mut Registry,
    resolvers: &'a [Box<dyn SchemaResolver>],
    options: &'a CompileOptions,
}

impl<'a> Compiler<'a> {
    pub(crate) fn new(
        registry: &'a mut Registry,
        resolvers: &'a [Box<dyn SchemaResolver>],
        options: &'a CompileOptions,
    ) -> Self {
        Self {
            registry,
            resolvers,
            options,
        }
    }

    /// Compiles `document` under `base_uri` and closes over external
    /// references. Returns the canonical root URI.
    pub(crate) fn compile_document(
        &mut self,
        base_uri: &str,
        document: &InstanceNode,
    ) -> Result<String> {
        let root = self.compile_root(base_uri, document)?;
        self.close_references()?;
        Ok(root)
    }

    fn compile_root(&mut self, base_uri: &str, document: &InstanceNode) -> Result<String> {
        let base = parse_base(base_uri)?;
        if base.fragment().is_some() {
            return Err(SchemaError::InvalidUri {
                uri: base_uri.to_string(),
                reason: "a registration base URI must not carry a fragment".to_string(),
            });
        }
        let doc_uri = base.to_string();
        if self.registry.has_document(&doc_uri) {
            return Err(SchemaError::DuplicateUri(doc_uri));
        }
        self.registry.mark_document(doc_uri.clone());

        let (draft, vocabularies) = self.dialect_for(document)?;
        self.registry.record_meta(
            doc_uri.clone(),
            MetaInfo {
                draft,
                vocabulary: vocabulary_declaration(document),
            },
        );

        let state = ResourceState {
            base,
            draft,
            vocabularies,
        };
        let aliases = vec![(doc_uri.clone(), String::new())];
        let root = self.compile_value(document, &state, aliases, true)?;
        tracing::debug!(uri = %doc_uri, draft = ?draft, "compiled schema document");
        Ok(self.registry.node(root).canonical_uri())
    }

    /// Resolves the dialect and vocabulary activation for a document (or
    /// embedded resource) from its `$schema`, defaulting to the session
    /// dialect.
    fn dialect_for(&self, schema: &InstanceNode) -> Result<(Draft, VocabularySet)> {
        let Some(uri) = schema.get("$schema").and_then(InstanceNode::as_str) else {
            let draft = self.options.default_draft;
            return Ok((draft, draft.default_vocabularies()));
        };
        if let Some(draft) = Draft::from_meta_schema_uri(uri) {
            return Ok((draft, draft.default_vocabularies()));
        }
        let key = parse_base(uri)?.to_string();
        let Some(info) = self.registry.meta_for(&key) else {
            return Err(SchemaError::UnknownMetaschema(uri.to_string()));
        };
        let draft = info.draft;
        if !draft.has_vocabularies() {
            return Ok((draft, draft.default_vocabularies()));
        }
        let vocabularies = match &info.vocabulary {
            None => draft.default_vocabularies(),
            Some(declared) => {
                let mut set = VocabularySet::default();
                for (vocab_uri, required) in declared {
                    match Vocabulary::from_uri(draft, vocab_uri) {
                        Some(vocabulary) => set.insert(vocabulary),
                        None if *required => {
                            return Err(SchemaError::UnknownVocabulary(vocab_uri.clone()));
                        }
                        None => {
                            tracing::debug!(uri = %vocab_uri, "ignoring unknown optional vocabulary");
                        }
                    }
                }
                set
            }
        };
        Ok((draft, vocabularies))
    }

    fn compile_value(
        &mut self,
        value: &InstanceNode,
        state: &ResourceState,
        aliases: Vec<(String, String)>,
        is_doc_root: bool,
    ) -> Result<NodeId> {
        if let Some(allowed) = value.as_bool() {
            let keywords = if allowed {
                Vec::new()
            } else {
                vec![BoundKeyword {
                    name: String::new(),
                    kind: EvaluatorKind::AlwaysFail,
                }]
            };
            let (doc, fragment) = aliases.last().expect("alias chain is never empty").clone();
            let id = self.registry.allocate(SchemaNode {
                keywords,
                resource_uri: doc,
                fragment,
                base_uri: state.base.clone(),
                is_resource_root: is_doc_root,
                recursive_anchor: false,
                draft: state.draft,
            });
            for (doc, pointer) in &aliases {
                self.registry.register_alias(alias_key(doc, pointer), id)?;
            }
            return Ok(id);
        }

        let Some(object) = value.as_object() else {
            return Err(SchemaError::InvalidSchemaShape {
                location: aliases
                    .last()
                    .map(|(doc, ptr)| alias_key(doc, ptr))
                    .unwrap_or_default(),
                found: value.node_type().to_string(),
            });
        };

        let mut state = state.clone();
        let mut aliases = aliases;
        let mut is_resource_root = is_doc_root;

        // An embedded resource may switch dialect via its own $schema.
        if !is_doc_root
            && value.get("$schema").is_some()
            && (value.get("$id").is_some() || value.get("id").is_some())
        {
            let (draft, vocabularies) = self.dialect_for(value)?;
            state.draft = draft;
            state.vocabularies = vocabularies;
        }

        // Identifier: a new resource base, or (drafts 4-7) a plain-name
        // anchor in fragment-only form.
        let mut legacy_anchor: Option<String> = None;
        let id_keyword = if state.draft == Draft::Draft4 { "id" } else { "$id" };
        if let Some(id_value) = value.get(id_keyword) {
            match id_value.as_str() {
                None => {
                    self.keyword_issue(malformed(&aliases, id_keyword, "value must be a string"))?;
                }
                Some(text) if text.starts_with('#') => {
                    let name = &text[1..];
                    if !name.is_empty() && !name.starts_with('/') && state.draft <= Draft::Draft7 {
                        legacy_anchor = Some(name.to_string());
                    } else {
                        self.keyword_issue(malformed(
                            &aliases,
                            id_keyword,
                            "fragment identifiers are only valid as plain-name anchors in drafts 4-7",
                        ))?;
                    }
                }
                Some(text) => match resolve_reference(&state.base, text) {
                    Ok(resolved) if resolved.fragment().is_none() => {
                        let doc = resolved.to_string();
                        // An embedded resource counts as a known document;
                        // the resolver chain must never be asked for it.
                        self.registry.mark_document(doc.clone());
                        state.base = resolved;
                        aliases.push((doc, String::new()));
                        is_resource_root = true;
                    }
                    Ok(_) => {
                        self.keyword_issue(malformed(
                            &aliases,
                            id_keyword,
                            "resource identifiers must not carry a fragment",
                        ))?;
                    }
                    Err(e) => {
                        self.keyword_issue(malformed(&aliases, id_keyword, e.to_string()))?;
                    }
                },
            }
        }

        let (resource_doc, fragment) =
            aliases.last().expect("alias chain is never empty").clone();
        let id = self.registry.allocate(SchemaNode {
            keywords: Vec::new(),
            resource_uri: resource_doc.clone(),
            fragment,
            base_uri: state.base.clone(),
            is_resource_root,
            recursive_anchor: false,
            draft: state.draft,
        });
        for (doc, pointer) in &aliases {
            self.registry.register_alias(alias_key(doc, pointer), id)?;
        }

        if let Some(anchor) = legacy_anchor {
            self.registry
                .register_alias(alias_key(&resource_doc, &anchor), id)?;
        }
        self.register_anchors(value, &state, &resource_doc, id, is_resource_root)?;

        // Compile every subschema-bearing keyword first, under
        // pointer-relative URIs extended from each alias.
        let mut children: BTreeMap<String, ChildSet> = BTreeMap::new();
        let mut dropped: HashSet<String> = HashSet::new();
        for (name, keyword_value) in object {
            let Some(info) = state.draft.keyword(name) else {
                continue;
            };
            match self.compile_children(name, keyword_value, &state, &aliases, info.shape) {
                Ok(Some(set)) => {
                    children.insert(name.clone(), set);
                }
                Ok(None) => {}
                Err(e @ (SchemaError::MalformedKeyword { .. }
                | SchemaError::InvalidSchemaShape { .. })) => {
                    self.keyword_issue(e)?;
                    dropped.insert(name.clone());
                }
                Err(e) => return Err(e),
            }
        }

        // Then bind evaluators in declaration order.
        let location = alias_key(&resource_doc, &self.registry.node(id).fragment);
        let ref_exclusive =
            state.draft.ref_is_exclusive() && object.iter().any(|(name, _)| name == "$ref");
        let mut bound: Vec<BoundKeyword> = Vec::new();
        let factory = FactoryInput {
            draft: state.draft,
            base: &state.base,
            location: &location,
            object: value,
            children: &children,
        };
        for (name, keyword_value) in object {
            if dropped.contains(name) || (ref_exclusive && name != "$ref") {
                continue;
            }
            match state.draft.keyword(name) {
                None => {
                    if state.draft.unknown_keywords_as_annotations() {
                        bound.push(BoundKeyword {
                            name: name.clone(),
                            kind: EvaluatorKind::Annotation(keyword_value.to_json()),
                        });
                    }
                }
                Some(info) if matches!(info.class, KeywordClass::Reserved) => {}
                Some(info)
                    if state.draft.has_vocabularies()
                        && !state.vocabularies.contains(info.vocabulary) =>
                {
                    // Deactivated vocabulary: string-valued keywords
                    // degrade to annotations, the rest are skipped.
                    if let Some(text) = keyword_value.as_str() {
                        bound.push(BoundKeyword {
                            name: name.clone(),
                            kind: EvaluatorKind::Annotation(serde_json::Value::String(
                                text.to_string(),
                            )),
                        });
                    }
                }
                Some(_) => match keywords::build_evaluator(&factory, name, keyword_value) {
                    Ok(Some(kind)) => bound.push(BoundKeyword {
                        name: name.clone(),
                        kind,
                    }),
                    Ok(None) => {}
                    Err(e) => self.keyword_issue(e)?,
                },
            }
        }

        self.registry.node_mut(id).keywords = bound;
        Ok(id)
    }

    fn register_anchors(
        &mut self,
        value: &InstanceNode,
        state: &ResourceState,
        resource_doc: &str,
        id: NodeId,
        is_resource_root: bool,
    ) -> Result<()> {
        if state.draft >= Draft::Draft201909 {
            if let Some(anchor_value) = value.get("$anchor") {
                match anchor_value.as_str() {
                    Some(name) => self
                        .registry
                        .register_alias(alias_key(resource_doc, name), id)?,
                    None => self.keyword_issue(SchemaError::MalformedKeyword {
                        keyword: "$anchor".to_string(),
                        location: alias_key(resource_doc, &self.registry.node(id).fragment),
                        reason: "value must be a string".to_string(),
                    })?,
                }
            }
        }
        if state.draft == Draft::Draft202012 {
            if let Some(anchor_value) = value.get("$dynamicAnchor") {
                match anchor_value.as_str() {
                    Some(name) => {
                        self.registry
                            .register_alias(alias_key(resource_doc, name), id)?;
                        self.registry.register_dynamic_anchor(
                            resource_doc.to_string(),
                            name.to_string(),
                            id,
                        );
                    }
                    None => self.keyword_issue(SchemaError::MalformedKeyword {
                        keyword: "$dynamicAnchor".to_string(),
                        location: alias_key(resource_doc, &self.registry.node(id).fragment),
                        reason: "value must be a string".to_string(),
                    })?,
                }
            }
        }
        if state.draft == Draft::Draft201909
            && value.get("$recursiveAnchor").and_then(InstanceNode::as_bool) == Some(true)
            && is_resource_root
        {
            self.registry.node_mut(id).recursive_anchor = true;
            self.registry
                .register_recursive_root(resource_doc.to_string(), id);
        }
        Ok(())
    }

    /// Compiles the subschemas inside one keyword's value according to
    /// its declared shape. Returns `None` for leaf keywords and for
    /// `DependencyMap` entries without any schema.
    fn compile_children(
        &mut self,
        name: &str,
        value: &InstanceNode,
        state: &ResourceState,
        aliases: &[(String, String)],
        shape: SubschemaShape,
    ) -> Result<Option<ChildSet>> {
        let set = match shape {
            SubschemaShape::Leaf => return Ok(None),
            SubschemaShape::Value => {
                let child = self.compile_value(value, state, extend(aliases, &[name]), false)?;
                ChildSet::One(child)
            }
            SubschemaShape::List => {
                let Some(items) = value.as_array() else {
                    return Err(malformed(aliases, name, "value must be an array of schemas"));
                };
                let mut children = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    children.push(self.compile_value(
                        item,
                        state,
                        extend(aliases, &[name, &index.to_string()]),
                        false,
                    )?);
                }
                ChildSet::List(children)
            }
            SubschemaShape::ValueOrList => {
                if let Some(items) = value.as_array() {
                    let mut children = Vec::with_capacity(items.len());
                    for (index, item) in items.iter().enumerate() {
                        children.push(self.compile_value(
                            item,
                            state,
                            extend(aliases, &[name, &index.to_string()]),
                            false,
                        )?);
                    }
                    ChildSet::List(children)
                } else {
                    let child =
                        self.compile_value(value, state, extend(aliases, &[name]), false)?;
                    ChildSet::One(child)
                }
            }
            SubschemaShape::Map => {
                let Some(members) = value.as_object() else {
                    return Err(malformed(aliases, name, "value must be an object of schemas"));
                };
                let mut children = Vec::with_capacity(members.len());
                for (member, subschema) in members {
                    children.push((
                        member.clone(),
                        self.compile_value(
                            subschema,
                            state,
                            extend(aliases, &[name, member]),
                            false,
                        )?,
                    ));
                }
                ChildSet::Map(children)
            }
            SubschemaShape::DependencyMap => {
                let Some(members) = value.as_object() else {
                    return Err(malformed(
                        aliases,
                        name,
                        "value must be an object of schemas or property-name arrays",
                    ));
                };
                let mut children = Vec::with_capacity(members.len());
                for (member, dependency) in members {
                    let child = if dependency.as_array().is_some() {
                        None
                    } else {
                        Some(self.compile_value(
                            dependency,
                            state,
                            extend(aliases, &[name, member]),
                            false,
                        )?)
                    };
                    children.push((member.clone(), child));
                }
                ChildSet::Dependencies(children)
            }
        };
        Ok(Some(set))
    }

    /// Applies the session's malformed-keyword policy to a construction
    /// error: fail the compilation, or skip the keyword.
    fn keyword_issue(&self, error: SchemaError) -> Result<()> {
        match self.options.malformed {
            MalformedKeywordPolicy::Fail => Err(error),
            MalformedKeywordPolicy::Ignore => {
                tracing::debug!(error = %error, "skipping malformed keyword");
                Ok(())
            }
        }
    }

    /// Resolves pending reference targets, fetching unknown documents
    /// through the resolver chain until a fixpoint.
    fn close_references(&mut self) -> Result<()> {
        loop {
            let missing = self.patch_pass();
            if missing.is_empty() {
                return Ok(());
            }
            for doc in missing {
                if self.registry.has_document(&doc) {
                    continue;
                }
                match self.resolvers.iter().find_map(|r| r.resolve(&doc)) {
                    Some(document) => {
                        tracing::debug!(uri = %doc, "fetched external schema document");
                        self.compile_root(&doc, &document)?;
                    }
                    None => {
                        tracing::debug!(uri = %doc, "external reference is unresolvable");
                        self.registry.mark_document(doc);
                    }
                }
            }
        }
    }

    /// One resolution sweep: patches every pending target present in the
    /// index and returns the document URIs that would have to be fetched.
    fn patch_pass(&mut self) -> Vec<String> {
        let mut patches: Vec<(NodeId, usize, NodeId)> = Vec::new();
        let mut missing: BTreeSet<String> = BTreeSet::new();
        for id in 0..self.registry.len() {
            for (slot, keyword) in self.registry.node(id).keywords.iter().enumerate() {
                let Some(uri) = pending_target(&keyword.kind) else {
                    continue;
                };
                match self.registry.lookup(uri) {
                    Some(target) => patches.push((id, slot, target)),
                    None => {
                        let document = uri.split('#').next().unwrap_or(uri);
                        if !self.registry.has_document(document) {
                            missing.insert(document.to_string());
                        }
                    }
                }
            }
        }
        for (id, slot, target) in patches {
            resolve_target(&mut self.registry.node_mut(id).keywords[slot].kind, target);
        }
        missing.into_iter().collect()
    }
}

fn pending_target(kind: &EvaluatorKind) -> Option<&str> {
    match kind {
        EvaluatorKind::Ref(RefTarget::Pending(uri))
        | EvaluatorKind::RecursiveRef(RefTarget::Pending(uri))
        | EvaluatorKind::DynamicRef {
            fallback: RefTarget::Pending(uri),
            ..
        } => Some(uri),
        _ => None,
    }
}

fn resolve_target(kind: &mut EvaluatorKind, target: NodeId) {
    match kind {
        EvaluatorKind::Ref(slot)
        | EvaluatorKind::RecursiveRef(slot)
        | EvaluatorKind::DynamicRef { fallback: slot, .. } => {
            *slot = RefTarget::Resolved(target);
        }
        _ => {}
    }
}

fn extend(aliases: &[(String, String)], segments: &[&str]) -> Vec<(String, String)> {
    aliases
        .iter()
        .map(|(doc, pointer)| {
            let mut extended = pointer.clone();
            for segment in segments {
                extended.push('/');
                extended.push_str(&escape_token(segment));
            }
            (doc.clone(), extended)
        })
        .collect()
}

fn malformed(aliases: &[(String, String)], keyword: &str, reason: impl Into<String>) -> SchemaError {
    SchemaError::MalformedKeyword {
        keyword: keyword.to_string(),
        location: aliases
            .last()
            .map(|(doc, ptr)| alias_key(doc, ptr))
            .unwrap_or_default(),
        reason: reason.into(),
    }
}

fn vocabulary_declaration(document: &InstanceNode) -> Option<Vec<(String, bool)>> {
    let members = document.get("$vocabulary")?.as_object()?;
    Some(
        members
            .iter()
            .map(|(uri, required)| (uri.clone(), required.as_bool().unwrap_or(true)))
            .collect(),
    )
}
