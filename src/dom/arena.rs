//! Arena-based document tree.
//!
//! Nodes live in a flat vector and link to each other by index. A [`NodeId`]
//! stays valid for the lifetime of the [`Document`] even when the node is
//! detached, which is what lets the editor keep addressing a node while its
//! structural position (its [`Path`](crate::Path)) changes.

use html5ever::{LocalName, QualName, ns};

/// Identifier of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel value for no node.
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }

    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

/// Node payload.
#[derive(Debug, Clone)]
pub enum NodeData {
    Document,
    Element {
        name: QualName,
        attrs: Vec<Attribute>,
        /// Style replayed by the editor. Kept apart from the `style`
        /// attribute so that clearing it restores the author's own style.
        inline_override: Option<String>,
    },
    Text(String),
    Comment(String),
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
}

/// HTML attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

impl Attribute {
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: QualName::new(None, ns!(), LocalName::from(name)),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub data: NodeData,
    pub parent: NodeId,
    pub first_child: NodeId,
    pub last_child: NodeId,
    pub prev_sibling: NodeId,
    pub next_sibling: NodeId,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
        }
    }
}

/// Arena-backed HTML document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    document: NodeId,
}

impl Document {
    /// Create an empty document holding only the document node.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            document: NodeId::NONE,
        };
        doc.document = doc.alloc(Node::new(NodeData::Document));
        doc
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// The document node.
    pub fn document(&self) -> NodeId {
        self.document
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    /// Number of allocated nodes, detached ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Create a detached element.
    pub fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>) -> NodeId {
        self.alloc(Node::new(NodeData::Element {
            name,
            attrs,
            inline_override: None,
        }))
    }

    /// Create a detached HTML element by tag name.
    pub fn create_html_element(&mut self, tag: &str) -> NodeId {
        let name = QualName::new(None, ns!(html), LocalName::from(tag));
        self.create_element(name, Vec::new())
    }

    pub fn create_text(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Text(text)))
    }

    pub fn create_comment(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Comment(text)))
    }

    pub fn create_doctype(&mut self, name: String, public_id: String, system_id: String) -> NodeId {
        self.alloc(Node::new(NodeData::Doctype {
            name,
            public_id,
            system_id,
        }))
    }

    /// Append `child` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(NodeId::NONE);

        if let Some(child_node) = self.get_mut(child) {
            child_node.parent = parent;
            child_node.prev_sibling = last_child;
            child_node.next_sibling = NodeId::NONE;
        }

        if let Some(last_node) = self.get_mut(last_child) {
            last_node.next_sibling = child;
        }

        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = child;
            }
            parent_node.last_child = child;
        }
    }

    /// Insert `new_node` immediately before `sibling`.
    pub fn insert_before(&mut self, sibling: NodeId, new_node: NodeId) {
        let (parent, prev) = match self.get(sibling) {
            Some(n) => (n.parent, n.prev_sibling),
            None => return,
        };

        if let Some(new) = self.get_mut(new_node) {
            new.parent = parent;
            new.prev_sibling = prev;
            new.next_sibling = sibling;
        }

        if let Some(sib) = self.get_mut(sibling) {
            sib.prev_sibling = new_node;
        }

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = new_node;
            }
        } else if let Some(par) = self.get_mut(parent) {
            par.first_child = new_node;
        }
    }

    /// Append text, merging into the last child when it is a text node.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(NodeId::NONE);

        if let Some(last) = self.get_mut(last_child)
            && let NodeData::Text(ref mut existing) = last.data
        {
            existing.push_str(text);
            return;
        }

        let text_node = self.create_text(text.to_string());
        self.append(parent, text_node);
    }

    /// Unlink a node from its parent. The node and its subtree stay in the
    /// arena and can be reinserted.
    pub fn detach(&mut self, target: NodeId) {
        let (parent, prev, next) = match self.get(target) {
            Some(n) => (n.parent, n.prev_sibling, n.next_sibling),
            None => return,
        };

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = next;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.first_child = next;
        }

        if next.is_some() {
            if let Some(n) = self.get_mut(next) {
                n.prev_sibling = prev;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.last_child = prev;
        }

        if let Some(node) = self.get_mut(target) {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
    }

    /// Insert `child` so that it becomes the `index`-th element child of
    /// `parent`. Indices past the end append.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        match self.element_child(parent, index) {
            Some(sibling) => self.insert_before(sibling, child),
            None => self.append(parent, child),
        }
    }

    /// Detach every child of `parent`.
    pub fn clear_children(&mut self, parent: NodeId) {
        let children: Vec<_> = self.children(parent).collect();
        for child in children {
            self.detach(child);
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(NodeId::is_some)
    }

    /// Iterate over all children of a node.
    pub fn children(&self, parent: NodeId) -> ChildrenIter<'_> {
        let first = self
            .get(parent)
            .map(|n| n.first_child)
            .unwrap_or(NodeId::NONE);
        ChildrenIter {
            doc: self,
            current: first,
        }
    }

    /// Iterate over element children only, the way `Element.children` does.
    pub fn element_children(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(parent).filter(|&c| self.is_element(c))
    }

    pub fn element_child(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        self.element_children(parent).nth(index)
    }

    /// Position of an element among its parent's element children.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.element_children(parent).position(|c| c == id)
    }

    /// Whether `node` is `ancestor` or lies in its subtree.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = node;
        while current.is_some() {
            if current == ancestor {
                return true;
            }
            current = self.get(current).map(|n| n.parent).unwrap_or(NodeId::NONE);
        }
        false
    }

    /// Depth-first pre-order walk over `root` and its descendants.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if self.get(id).is_none() {
                continue;
            }
            out.push(id);
            let mut children: Vec<_> = self.children(id).collect();
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Find the first node matching a predicate.
    pub fn find<F>(&self, predicate: F) -> Option<NodeId>
    where
        F: Fn(&Node) -> bool,
    {
        self.descendants(self.document)
            .into_iter()
            .find(|&id| self.get(id).is_some_and(&predicate))
    }

    pub fn find_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.find(|node| {
            matches!(&node.data, NodeData::Element { name, .. } if name.local.as_ref() == tag)
        })
    }

    /// The `<body>` element, which is the editing root.
    pub fn body(&self) -> Option<NodeId> {
        self.find_by_tag("body")
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ChildrenIter<'a> {
    doc: &'a Document,
    current: NodeId,
}

impl Iterator for ChildrenIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self
            .doc
            .get(id)
            .map(|n| n.next_sibling)
            .unwrap_or(NodeId::NONE);
        Some(id)
    }
}

/// Element accessors.
impl Document {
    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, NodeData::Element { .. }))
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, NodeData::Text(_)))
    }

    /// Lowercase local name of an element.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { name, .. } => Some(name.local.as_ref()),
            _ => None,
        })
    }

    pub fn attr(&self, id: NodeId, attr_name: &str) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|a| a.name.local.as_ref() == attr_name)
                .map(|a| a.value.as_str()),
            _ => None,
        })
    }

    /// Set an attribute, replacing an existing value. Returns `false` for
    /// non-elements.
    pub fn set_attr(&mut self, id: NodeId, attr_name: &str, value: &str) -> bool {
        let Some(NodeData::Element { attrs, .. }) = self.get_mut(id).map(|n| &mut n.data) else {
            return false;
        };
        match attrs.iter_mut().find(|a| a.name.local.as_ref() == attr_name) {
            Some(existing) => existing.value = value.to_string(),
            None => attrs.push(Attribute::new(attr_name, value)),
        }
        true
    }

    pub fn remove_attr(&mut self, id: NodeId, attr_name: &str) -> bool {
        let Some(NodeData::Element { attrs, .. }) = self.get_mut(id).map(|n| &mut n.data) else {
            return false;
        };
        let before = attrs.len();
        attrs.retain(|a| a.name.local.as_ref() != attr_name);
        attrs.len() != before
    }

    pub fn inline_override(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element {
                inline_override, ..
            } => inline_override.as_deref(),
            _ => None,
        })
    }

    pub fn set_inline_override(&mut self, id: NodeId, css: Option<String>) -> bool {
        match self.get_mut(id).map(|n| &mut n.data) {
            Some(NodeData::Element {
                inline_override, ..
            }) => {
                *inline_override = css;
                true
            }
            _ => false,
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            if let Some(Node {
                data: NodeData::Text(text),
                ..
            }) = self.get(node)
            {
                out.push_str(text);
            }
        }
        out
    }

    /// Replace all children of `id` with a single text node.
    pub fn set_text(&mut self, id: NodeId, text: &str) -> bool {
        if !self.is_element(id) {
            return false;
        }
        self.clear_children(id);
        if !text.is_empty() {
            let node = self.create_text(text.to_string());
            self.append(id, node);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_children() {
        let mut doc = Document::new();

        let parent = doc.create_html_element("div");
        let child1 = doc.create_html_element("p");
        let child2 = doc.create_html_element("p");

        doc.append(doc.document(), parent);
        doc.append(parent, child1);
        doc.append(parent, child2);

        let children: Vec<_> = doc.children(parent).collect();
        assert_eq!(children, vec![child1, child2]);
        assert_eq!(doc.index_in_parent(child2), Some(1));
    }

    #[test]
    fn test_text_merging() {
        let mut doc = Document::new();

        let p = doc.create_html_element("p");
        doc.append(doc.document(), p);

        doc.append_text(p, "Hello, ");
        doc.append_text(p, "World!");

        assert_eq!(doc.children(p).count(), 1);
        assert_eq!(doc.text_content(p), "Hello, World!");
    }

    #[test]
    fn test_element_children_skip_text() {
        let mut doc = Document::new();
        let div = doc.create_html_element("div");
        doc.append(doc.document(), div);
        doc.append_text(div, "  ");
        let span = doc.create_html_element("span");
        doc.append(div, span);
        doc.append_text(div, "tail");

        assert_eq!(doc.element_child(div, 0), Some(span));
        assert_eq!(doc.element_child(div, 1), None);
        assert_eq!(doc.index_in_parent(span), Some(0));
    }

    #[test]
    fn test_detach_and_reinsert() {
        let mut doc = Document::new();
        let list = doc.create_html_element("ul");
        doc.append(doc.document(), list);
        let items: Vec<_> = (0..3)
            .map(|_| {
                let li = doc.create_html_element("li");
                doc.append(list, li);
                li
            })
            .collect();

        doc.detach(items[0]);
        assert_eq!(doc.parent(items[0]), None);
        assert_eq!(doc.element_children(list).collect::<Vec<_>>(), vec![items[1], items[2]]);

        doc.insert_child(list, 1, items[0]);
        assert_eq!(
            doc.element_children(list).collect::<Vec<_>>(),
            vec![items[1], items[0], items[2]]
        );

        doc.insert_child(list, 10, items[1]);
        assert_eq!(doc.element_child(list, 2), Some(items[1]));
    }

    #[test]
    fn test_attributes_and_override() {
        let mut doc = Document::new();
        let p = doc.create_html_element("p");

        assert!(doc.set_attr(p, "class", "lead"));
        assert!(doc.set_attr(p, "class", "lead big"));
        assert_eq!(doc.attr(p, "class"), Some("lead big"));
        assert!(doc.remove_attr(p, "class"));
        assert!(!doc.remove_attr(p, "class"));

        let text = doc.create_text("x".into());
        assert!(!doc.set_attr(text, "class", "nope"));
        assert!(!doc.set_inline_override(text, Some("color: red".into())));

        assert!(doc.set_inline_override(p, Some("color: red".into())));
        assert_eq!(doc.inline_override(p), Some("color: red"));
    }

    #[test]
    fn test_set_text_replaces_children() {
        let mut doc = Document::new();
        let p = doc.create_html_element("p");
        let b = doc.create_html_element("b");
        doc.append(p, b);
        doc.append_text(b, "bold");

        assert!(doc.set_text(p, "plain"));
        assert_eq!(doc.text_content(p), "plain");
        assert_eq!(doc.element_children(p).count(), 0);
    }
}
