//! Raw, tree-structured schema documents.
//!
//! A [`SchemaDocument`] is the parsed input handed to the compiler: an
//! immutable arena of named nodes carrying attribute/value pairs. The
//! document element itself is not stored as a node; its children are the
//! root-level nodes.
//!
//! # Examples
//!
//! ```
//! use aggregate_schema_core::SchemaDocument;
//!
//! let mut builder = SchemaDocument::builder("Schema");
//! let order = builder.add_root("Order", [("Type", "data-model")]);
//! let lines = builder.add_child(order, "Lines", [("Type", "children")]);
//! let product = builder.add_child(lines, "Product", [("Type", "word")]);
//! let doc = builder.build();
//!
//! assert_eq!(doc.path(product), "Order/Lines/Product");
//! assert_eq!(doc.root_of(product), order);
//! assert_eq!(doc.find_path(&["Lines", "Product"]), Some(product));
//! ```

use serde::{Deserialize, Serialize};

/// Index of a node inside its [`SchemaDocument`].
///
/// Ids are only meaningful for the document that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// One element of the raw tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawNode {
    name: String,
    attributes: Vec<(String, String)>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl RawNode {
    /// Structural (element) name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attributes in declaration order.
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }
}

/// Immutable snapshot of a parsed schema tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDocument {
    name: String,
    nodes: Vec<RawNode>,
    top_level: Vec<NodeId>,
}

impl SchemaDocument {
    /// Starts building a document whose document element is called `name`.
    pub fn builder(name: impl Into<String>) -> DocumentBuilder {
        DocumentBuilder::new(name)
    }

    /// Name of the document element.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of nodes, excluding the document element.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the document has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the raw node for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this document.
    pub fn node(&self, id: NodeId) -> &RawNode {
        &self.nodes[id.0]
    }

    /// Structural name of `id`.
    pub fn node_name(&self, id: NodeId) -> &str {
        &self.node(id).name
    }

    /// Looks up an attribute value by exact key.
    pub fn attribute(&self, id: NodeId, key: &str) -> Option<&str> {
        self.node(id)
            .attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Attributes of `id` in declaration order.
    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        &self.node(id).attributes
    }

    /// Structural parent; `None` for root-level nodes.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Direct children in document order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Root-level nodes (children of the document element).
    pub fn top_level(&self) -> &[NodeId] {
        &self.top_level
    }

    pub fn is_top_level(&self, id: NodeId) -> bool {
        self.node(id).parent.is_none()
    }

    /// Structural ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |current| self.parent(*current))
    }

    /// The root-level node whose subtree contains `id` (itself when top-level).
    pub fn root_of(&self, id: NodeId) -> NodeId {
        self.ancestors(id).last().unwrap_or(id)
    }

    /// Descendants of `id` in pre-order, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Every node in document order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.top_level
            .iter()
            .flat_map(move |root| std::iter::once(*root).chain(self.descendants(*root)))
    }

    /// Slash-separated structural path from the root-level node.
    pub fn path(&self, id: NodeId) -> String {
        let mut segments: Vec<&str> = self.ancestors(id).map(|a| self.node_name(a)).collect();
        segments.reverse();
        segments.push(self.node_name(id));
        segments.join("/")
    }

    /// Finds the first node, in document order, whose name is the last
    /// segment and whose direct ancestors carry the preceding segments.
    ///
    /// The chain may start at any depth, so `["Lines", "Product"]` matches
    /// `Order/Lines/Product`.
    pub fn find_path(&self, segments: &[&str]) -> Option<NodeId> {
        self.find_paths(segments).into_iter().next()
    }

    /// Every match of [`find_path`](Self::find_path), in document order.
    pub fn find_paths(&self, segments: &[&str]) -> Vec<NodeId> {
        let Some((last, init)) = segments.split_last() else {
            return Vec::new();
        };
        self.iter()
            .filter(|candidate| {
                if self.node_name(*candidate) != *last {
                    return false;
                }
                let mut current = *candidate;
                for expected in init.iter().rev() {
                    match self.parent(current) {
                        Some(parent) if self.node_name(parent) == *expected => current = parent,
                        _ => return false,
                    }
                }
                true
            })
            .collect()
    }
}

/// Incremental constructor for [`SchemaDocument`].
#[derive(Debug)]
pub struct DocumentBuilder {
    name: String,
    nodes: Vec<RawNode>,
    top_level: Vec<NodeId>,
}

impl DocumentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            top_level: Vec::new(),
        }
    }

    /// Appends a root-level node.
    pub fn add_root<'a>(
        &mut self,
        name: impl Into<String>,
        attributes: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> NodeId {
        let id = self.push(name.into(), attributes, None);
        self.top_level.push(id);
        id
    }

    /// Appends a child under `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` was not produced by this builder.
    pub fn add_child<'a>(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        attributes: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> NodeId {
        let id = self.push(name.into(), attributes, Some(parent));
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Appends an owned attribute to an existing node.
    pub fn push_attribute(&mut self, id: NodeId, key: impl Into<String>, value: impl Into<String>) {
        self.nodes[id.0].attributes.push((key.into(), value.into()));
    }

    pub fn build(self) -> SchemaDocument {
        SchemaDocument {
            name: self.name,
            nodes: self.nodes,
            top_level: self.top_level,
        }
    }

    fn push<'a>(
        &mut self,
        name: String,
        attributes: impl IntoIterator<Item = (&'a str, &'a str)>,
        parent: Option<NodeId>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(RawNode {
            name,
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            parent,
            children: Vec::new(),
        });
        id
    }
}
