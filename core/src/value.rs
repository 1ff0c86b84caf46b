//! Provider-agnostic view of a parsed JSON value.
//!
//! [`InstanceNode`] is the abstract tree every other component works
//! against: schema documents enter the registry as instance trees, and
//! instances are validated as instance trees. Providers (see the
//! `schema-eval-json` crate) build these trees from concrete parsers and
//! finish them with [`InstanceNode::rooted`], which assigns each value its
//! JSON-pointer path from the document root.
//!
//! Numbers are arbitrary-precision decimals. A number whose normalized
//! value (trailing zeros stripped) has no fractional part is classified
//! [`NodeType::Integer`], so `1` and `1.0` are the same value to `const`,
//! `enum`, and `uniqueItems`.
//!
//! # Examples
//!
//! ```
//! use schema_eval_core::{InstanceNode, NodeType};
//!
//! let doc = InstanceNode::object(vec![
//!     ("tags".into(), InstanceNode::array(vec![InstanceNode::string("a")])),
//! ])
//! .rooted();
//!
//! assert_eq!(doc.node_type(), NodeType::Object);
//! let tags = doc.get("tags").unwrap();
//! assert_eq!(tags.pointer(), "/tags");
//! assert_eq!(tags.as_array().unwrap()[0].pointer(), "/tags/0");
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};

use bigdecimal::BigDecimal;

/// The seven value classifications of the abstract model.
///
/// `Integer` and `Number` are distinct classifications of the same JSON
/// number syntax: a number is an integer iff it has no fractional part
/// after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Null,
    Boolean,
    String,
    Integer,
    Number,
    Array,
    Object,
}

impl NodeType {
    /// The JSON Schema `type` keyword name for this classification.
    pub fn keyword_name(self) -> &'static str {
        match self {
            NodeType::Null => "null",
            NodeType::Boolean => "boolean",
            NodeType::String => "string",
            NodeType::Integer => "integer",
            NodeType::Number => "number",
            NodeType::Array => "array",
            NodeType::Object => "object",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword_name())
    }
}

/// An arbitrary-precision number plus its integer classification.
#[derive(Debug, Clone)]
pub struct NumberValue {
    value: BigDecimal,
    integral: bool,
}

impl NumberValue {
    /// Normalizes `value` and classifies it.
    pub fn new(value: BigDecimal) -> Self {
        let value = value.normalized();
        let integral = value.is_integer();
        Self { value, integral }
    }

    pub fn value(&self) -> &BigDecimal {
        &self.value
    }

    /// True when the normalized value has no fractional part.
    pub fn is_integral(&self) -> bool {
        self.integral
    }
}

impl PartialEq for NumberValue {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for NumberValue {}

/// One node of the abstract value tree.
///
/// Carries its JSON-pointer path from the document root (`~` and `/`
/// escaped as `~0`/`~1`). Equality and hashing are value-based and
/// type-aware: the pointer never participates, objects compare
/// order-independently, and numbers compare numerically.
///
/// # Examples
///
/// ```
/// use schema_eval_core::InstanceNode;
///
/// let one = InstanceNode::integer(1);
/// let one_point_zero = InstanceNode::number("1.0".parse().unwrap());
/// assert_eq!(one, one_point_zero);
/// assert_ne!(one, InstanceNode::string("1"));
/// ```
#[derive(Debug, Clone)]
pub struct InstanceNode {
    pointer: String,
    kind: NodeKind,
}

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Null,
    Boolean(bool),
    String(String),
    Number(NumberValue),
    Array(Vec<InstanceNode>),
    Object(Vec<(String, InstanceNode)>),
}

impl InstanceNode {
    pub fn null() -> Self {
        Self::from_kind(NodeKind::Null)
    }

    pub fn boolean(value: bool) -> Self {
        Self::from_kind(NodeKind::Boolean(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::from_kind(NodeKind::String(value.into()))
    }

    pub fn number(value: BigDecimal) -> Self {
        Self::from_kind(NodeKind::Number(NumberValue::new(value)))
    }

    pub fn integer(value: i64) -> Self {
        Self::number(BigDecimal::from(value))
    }

    /// An array with the given elements, in order.
    pub fn array(items: Vec<InstanceNode>) -> Self {
        Self::from_kind(NodeKind::Array(items))
    }

    /// An object with the given members in insertion order.
    pub fn object(members: Vec<(String, InstanceNode)>) -> Self {
        Self::from_kind(NodeKind::Object(members))
    }

    fn from_kind(kind: NodeKind) -> Self {
        Self {
            pointer: String::new(),
            kind,
        }
    }

    /// Finalizes a hand-built tree as a document root, assigning every
    /// descendant its pointer path. Providers call this exactly once per
    /// parse; the tree is immutable afterwards.
    ///
    /// # Examples
    ///
    /// ```
    /// use schema_eval_core::InstanceNode;
    ///
    /// let doc = InstanceNode::object(vec![
    ///     ("a/b".into(), InstanceNode::integer(1)),
    /// ])
    /// .rooted();
    /// assert_eq!(doc.get("a/b").unwrap().pointer(), "/a~1b");
    /// ```
    pub fn rooted(mut self) -> Self {
        self.assign_pointers(String::new());
        self
    }

    fn assign_pointers(&mut self, pointer: String) {
        match &mut self.kind {
            NodeKind::Array(items) => {
                for (index, item) in items.iter_mut().enumerate() {
                    item.assign_pointers(format!("{pointer}/{index}"));
                }
            }
            NodeKind::Object(members) => {
                for (name, member) in members.iter_mut() {
                    member.assign_pointers(format!("{pointer}/{}", escape_token(name)));
                }
            }
            _ => {}
        }
        self.pointer = pointer;
    }

    /// Re-homes a synthesized value at an explicit location. Used for
    /// derived instances such as `propertyNames` key strings.
    pub(crate) fn at_pointer(mut self, pointer: &str) -> Self {
        self.pointer = pointer.to_string();
        self
    }

    /// This value's JSON-pointer path from its document root.
    pub fn pointer(&self) -> &str {
        &self.pointer
    }

    pub fn node_type(&self) -> NodeType {
        match &self.kind {
            NodeKind::Null => NodeType::Null,
            NodeKind::Boolean(_) => NodeType::Boolean,
            NodeKind::String(_) => NodeType::String,
            NodeKind::Number(n) if n.is_integral() => NodeType::Integer,
            NodeKind::Number(_) => NodeType::Number,
            NodeKind::Array(_) => NodeType::Array,
            NodeKind::Object(_) => NodeType::Object,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match &self.kind {
            NodeKind::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&NumberValue> {
        match &self.kind {
            NodeKind::Number(n) => Some(n),
            _ => None,
        }
    }

    /// The value as an unsigned integer, when it is an integral number
    /// that fits. Keyword bounds (`minLength`, `maxItems`, ...) go
    /// through this.
    pub fn as_u64(&self) -> Option<u64> {
        use bigdecimal::ToPrimitive;
        match &self.kind {
            NodeKind::Number(n) if n.is_integral() => n.value().to_u64(),
            _ => None,
        }
    }

    /// The elements of an array, in document order.
    pub fn as_array(&self) -> Option<&[InstanceNode]> {
        match &self.kind {
            NodeKind::Array(items) => Some(items),
            _ => None,
        }
    }

    /// The members of an object, in insertion order.
    pub fn as_object(&self) -> Option<&[(String, InstanceNode)]> {
        match &self.kind {
            NodeKind::Object(members) => Some(members),
            _ => None,
        }
    }

    /// Looks up an object member by name.
    pub fn get(&self, name: &str) -> Option<&InstanceNode> {
        self.as_object()?
            .iter()
            .find(|(member, _)| member == name)
            .map(|(_, node)| node)
    }

    /// Converts to a `serde_json::Value`, used for annotation payloads.
    pub fn to_json(&self) -> serde_json::Value {
        match &self.kind {
            NodeKind::Null => serde_json::Value::Null,
            NodeKind::Boolean(b) => serde_json::Value::Bool(*b),
            NodeKind::String(s) => serde_json::Value::String(s.clone()),
            NodeKind::Number(n) => {
                let text = n.value().to_string();
                serde_json::from_str::<serde_json::Number>(&text)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::String(text))
            }
            NodeKind::Array(items) => {
                serde_json::Value::Array(items.iter().map(InstanceNode::to_json).collect())
            }
            NodeKind::Object(members) => {
                let mut map = serde_json::Map::new();
                for (name, member) in members {
                    map.insert(name.clone(), member.to_json());
                }
                serde_json::Value::Object(map)
            }
        }
    }
}

impl PartialEq for InstanceNode {
    fn eq(&self, other: &Self) -> bool {
        match (&self.kind, &other.kind) {
            (NodeKind::Null, NodeKind::Null) => true,
            (NodeKind::Boolean(a), NodeKind::Boolean(b)) => a == b,
            (NodeKind::String(a), NodeKind::String(b)) => a == b,
            (NodeKind::Number(a), NodeKind::Number(b)) => a == b,
            (NodeKind::Array(a), NodeKind::Array(b)) => a == b,
            (NodeKind::Object(a), NodeKind::Object(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(name, node)| other.get(name).is_some_and(|theirs| node == theirs))
            }
            _ => false,
        }
    }
}

impl Eq for InstanceNode {}

impl Hash for InstanceNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.kind {
            NodeKind::Null => 0u8.hash(state),
            NodeKind::Boolean(b) => {
                1u8.hash(state);
                b.hash(state);
            }
            NodeKind::String(s) => {
                2u8.hash(state);
                s.hash(state);
            }
            NodeKind::Number(n) => {
                3u8.hash(state);
                // The stored value is normalized, so equal numbers render
                // to identical strings.
                n.value().to_string().hash(state);
            }
            NodeKind::Array(items) => {
                4u8.hash(state);
                for item in items {
                    item.hash(state);
                }
            }
            NodeKind::Object(members) => {
                5u8.hash(state);
                let mut sorted: Vec<_> = members.iter().collect();
                sorted.sort_by(|(a, _), (b, _)| a.cmp(b));
                for (name, member) in sorted {
                    name.hash(state);
                    member.hash(state);
                }
            }
        }
    }
}

/// Escapes one JSON-pointer reference token (`~` → `~0`, `/` → `~1`).
pub fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Reverses [`escape_token`].
pub fn unescape_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}
