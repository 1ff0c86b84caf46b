//! URI-indexed registry of compiled schema nodes.
//!
//! Schemas form a cyclic, URI-addressed graph: `$ref` may point at an
//! ancestor, a sibling document, or a resource that is only fetched
//! through an external resolver. Nodes are therefore arena-allocated and
//! addressed by index; the registry maps every alias URI of a schema
//! location (its pointer-relative form plus each identifier-relative
//! form established by `$id`, `$anchor` and `$dynamicAnchor`) to the
//! owning arena slot.
//!
//! The registry is populated during [`Validator::register_schema`]
//! (including the closure pass over external references) and is read-only
//! afterwards, which makes it safe to share across concurrent
//! validations.
//!
//! [`Validator::register_schema`]: crate::Validator::register_schema

use std::collections::{HashMap, HashSet};

use url::Url;

use crate::dialect::Draft;
use crate::error::{Result, SchemaError};
use crate::keywords::BoundKeyword;
use crate::uri::alias_key;
use crate::value::InstanceNode;

/// Arena index of a compiled schema node.
pub(crate) type NodeId = usize;

/// Resolves URIs the registry cannot satisfy locally.
///
/// Resolvers compose: the first one returning `Some` wins. A resolver
/// returns the raw schema document already wrapped into the abstract
/// value model (providers in `schema-eval-json` do the text parsing).
pub trait SchemaResolver: Send + Sync {
    /// Returns the schema document registered under `uri`, or `None`
    /// when this resolver does not know it.
    fn resolve(&self, uri: &str) -> Option<InstanceNode>;
}

/// A compiled schema unit: an ordered collection of bound evaluators plus
/// its identity.
#[derive(Debug)]
pub(crate) struct SchemaNode {
    pub keywords: Vec<BoundKeyword>,
    /// Document URI of the nearest enclosing resource (no fragment).
    pub resource_uri: String,
    /// JSON-pointer fragment from the resource root; empty at the root.
    pub fragment: String,
    /// Lexical base URI in effect when this node was parsed.
    pub base_uri: Url,
    /// True for document roots and `$id` holders; entering one pushes the
    /// dynamic scope.
    pub is_resource_root: bool,
    /// `$recursiveAnchor: true` (2019-09).
    pub recursive_anchor: bool,
    pub draft: Draft,
}

impl SchemaNode {
    /// Canonical absolute URI of this schema location.
    pub fn canonical_uri(&self) -> String {
        alias_key(&self.resource_uri, &self.fragment)
    }

    /// Canonical URI of one keyword inside this schema object.
    pub fn keyword_location(&self, keyword: &str) -> String {
        if keyword.is_empty() {
            return self.canonical_uri();
        }
        alias_key(&self.resource_uri, &format!("{}/{keyword}", self.fragment))
    }
}

/// Meta-schema facts recorded per compiled document, consulted when a
/// later document names it in `$schema`.
#[derive(Debug, Clone)]
pub(crate) struct MetaInfo {
    pub draft: Draft,
    /// Raw `$vocabulary` declaration of the document root: URI plus its
    /// required flag. `None` when the root declares no `$vocabulary`.
    pub vocabulary: Option<Vec<(String, bool)>>,
}

/// Mapping from absolute URI string to compiled schema node.
#[derive(Default)]
pub struct Registry {
    nodes: Vec<SchemaNode>,
    index: HashMap<String, NodeId>,
    /// `(resource URI, anchor name)` pairs declared via `$dynamicAnchor`.
    dynamic_anchors: HashMap<(String, String), NodeId>,
    /// Resources whose root declares `$recursiveAnchor: true`.
    recursive_roots: HashMap<String, NodeId>,
    /// Document URIs already compiled or known unfetchable; guards the
    /// external-resolver closure against refetch loops.
    documents: HashSet<String>,
    meta: HashMap<String, MetaInfo>,
}

impl Registry {
    pub(crate) fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut SchemaNode {
        &mut self.nodes[id]
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn lookup(&self, key: &str) -> Option<NodeId> {
        self.index.get(key).copied()
    }

    pub(crate) fn dynamic_anchor(&self, resource: &str, anchor: &str) -> Option<NodeId> {
        self.dynamic_anchors
            .get(&(resource.to_string(), anchor.to_string()))
            .copied()
    }

    pub(crate) fn recursive_root(&self, resource: &str) -> Option<NodeId> {
        self.recursive_roots.get(resource).copied()
    }

    /// Reserves an arena slot, to be filled once the node's keywords are
    /// compiled. Children may be compiled (and registered) in between.
    pub(crate) fn allocate(&mut self, placeholder: SchemaNode) -> NodeId {
        self.nodes.push(placeholder);
        self.nodes.len() - 1
    }

    /// Registers one alias URI for a node. Two distinct schema objects
    /// must never resolve to the same absolute URI.
    pub(crate) fn register_alias(&mut self, key: String, id: NodeId) -> Result<()> {
        tracing::debug!(uri = %key, node = id, "registering schema alias");
        match self.index.insert(key.clone(), id) {
            None => Ok(()),
            Some(previous) if previous == id => Ok(()),
            Some(_) => Err(SchemaError::DuplicateUri(key)),
        }
    }

    pub(crate) fn register_dynamic_anchor(
        &mut self,
        resource: String,
        anchor: String,
        id: NodeId,
    ) {
        // First declaration in a resource wins, matching lexical order.
        self.dynamic_anchors.entry((resource, anchor)).or_insert(id);
    }

    pub(crate) fn register_recursive_root(&mut self, resource: String, id: NodeId) {
        self.recursive_roots.entry(resource).or_insert(id);
    }

    pub(crate) fn has_document(&self, uri: &str) -> bool {
        self.documents.contains(uri)
    }

    pub(crate) fn mark_document(&mut self, uri: String) {
        self.documents.insert(uri);
    }

    pub(crate) fn record_meta(&mut self, uri: String, info: MetaInfo) {
        self.meta.entry(uri).or_insert(info);
    }

    pub(crate) fn meta_for(&self, uri: &str) -> Option<&MetaInfo> {
        self.meta.get(uri)
    }
}
