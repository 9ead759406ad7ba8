use crate::decorations::DocRange;

use super::kind::NodeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) name: &'static str,
    pub(crate) from: usize,
    pub(crate) to: usize,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

/// Owned syntax tree with absolute byte offsets and parent links.
///
/// Node 0 is always the document root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxTree {
    nodes: Vec<NodeData>,
}

/// Return value of a [`SyntaxTree::walk`] visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Children,
    Skip,
}

impl SyntaxTree {
    /// A tree holding only a document root spanning `len` bytes.
    pub fn empty(len: usize) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.push(NodeKind::Document, "document", 0, len, None);
        tree
    }

    pub(crate) fn push(
        &mut self,
        kind: NodeKind,
        name: &'static str,
        from: usize,
        to: usize,
        parent: Option<NodeId>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            name,
            from,
            to,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    pub(crate) fn sort_children(&mut self, id: NodeId) {
        let mut children = std::mem::take(&mut self.nodes[id.0].children);
        children.sort_by_key(|child| (self.nodes[child.0].from, self.nodes[child.0].to));
        self.nodes[id.0].children = children;
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode {
            tree: self,
            id: NodeId(0),
        }
    }

    pub fn node(&self, id: NodeId) -> Option<SyntaxNode<'_>> {
        (id.0 < self.nodes.len()).then_some(SyntaxNode { tree: self, id })
    }

    /// Deepest node with `from <= pos < to`. When no child contains `pos`,
    /// a child ending exactly at `pos` is preferred.
    pub fn resolve(&self, pos: usize) -> SyntaxNode<'_> {
        let mut current = self.root();
        loop {
            let containing = current
                .children()
                .find(|child| child.from() <= pos && pos < child.to())
                .or_else(|| {
                    current
                        .children()
                        .filter(|child| child.to() == pos && child.from() < child.to())
                        .last()
                });
            match containing {
                Some(child) => current = child,
                None => return current,
            }
        }
    }

    /// Pre-order iteration over every node.
    pub fn iter(&self) -> impl Iterator<Item = SyntaxNode<'_>> {
        self.root().descendants()
    }

    /// Pre-order walk. Returning [`Visit::Skip`] leaves the node's subtree out.
    pub fn walk<'t>(&'t self, mut visitor: impl FnMut(SyntaxNode<'t>) -> Visit) {
        let mut stack = vec![NodeId(0)];
        while let Some(id) = stack.pop() {
            let node = SyntaxNode { tree: self, id };
            if visitor(node) == Visit::Children {
                stack.extend(self.nodes[id.0].children.iter().rev().copied());
            }
        }
    }

    /// Indented outline of the tree, one node per line.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for node in self.iter() {
            let depth = node.ancestors().count();
            out.push_str(&format!(
                "{}{} {}..{}\n",
                "  ".repeat(depth),
                node.name(),
                node.from(),
                node.to()
            ));
        }
        out
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SyntaxNode<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl PartialEq for SyntaxNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl<'t> SyntaxNode<'t> {
    fn data(&self) -> &'t NodeData {
        &self.tree.nodes[self.id.0]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.data().kind
    }

    pub fn name(&self) -> &'static str {
        self.data().name
    }

    pub fn from(&self) -> usize {
        self.data().from
    }

    pub fn to(&self) -> usize {
        self.data().to
    }

    pub fn range(&self) -> DocRange {
        DocRange::new(self.from(), self.to())
    }

    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.from()..self.to()).unwrap_or("")
    }

    pub fn parent(&self) -> Option<SyntaxNode<'t>> {
        let tree = self.tree;
        self.data().parent.map(|id| SyntaxNode { tree, id })
    }

    pub fn ancestors(self) -> impl Iterator<Item = SyntaxNode<'t>> {
        std::iter::successors(self.parent(), |node| node.parent())
    }

    pub fn children(self) -> impl Iterator<Item = SyntaxNode<'t>> {
        let tree = self.tree;
        self.data()
            .children
            .iter()
            .map(move |&id| SyntaxNode { tree, id })
    }

    pub fn child(self, kind: NodeKind) -> Option<SyntaxNode<'t>> {
        self.children().find(|child| child.kind() == kind)
    }

    pub fn children_of(self, kind: NodeKind) -> impl Iterator<Item = SyntaxNode<'t>> {
        self.children().filter(move |child| child.kind() == kind)
    }

    /// This node and everything below it, pre-order.
    pub fn descendants(self) -> impl Iterator<Item = SyntaxNode<'t>> {
        let tree = self.tree;
        let mut stack = vec![self.id];
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            stack.extend(tree.nodes[id.0].children.iter().rev().copied());
            Some(SyntaxNode { tree, id })
        })
    }

    pub fn has_ancestor(self, kind: NodeKind) -> bool {
        self.ancestors().any(|node| node.kind() == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> SyntaxTree {
        // document 0..10
        //   paragraph 0..4
        //     emphasis 1..3
        //   paragraph 5..10
        let mut tree = SyntaxTree::empty(10);
        let root = tree.root().id();
        let p1 = tree.push(NodeKind::Paragraph, "paragraph", 0, 4, Some(root));
        tree.push(NodeKind::Emphasis, "emphasis", 1, 3, Some(p1));
        tree.push(NodeKind::Paragraph, "paragraph", 5, 10, Some(root));
        tree
    }

    #[test]
    fn test_preorder_iteration() {
        let tree = sample();
        let names: Vec<(&str, usize)> = tree.iter().map(|n| (n.name(), n.from())).collect();

        assert_eq!(
            names,
            vec![
                ("document", 0),
                ("paragraph", 0),
                ("emphasis", 1),
                ("paragraph", 5)
            ]
        );
    }

    #[test]
    fn test_walk_can_skip_subtrees() {
        let tree = sample();
        let mut seen = Vec::new();
        tree.walk(|node| {
            seen.push(node.name());
            if node.kind() == NodeKind::Paragraph {
                Visit::Skip
            } else {
                Visit::Children
            }
        });

        assert_eq!(seen, vec!["document", "paragraph", "paragraph"]);
    }

    #[test]
    fn test_resolve_finds_deepest_node() {
        let tree = sample();

        assert_eq!(tree.resolve(2).kind(), NodeKind::Emphasis);
        assert_eq!(tree.resolve(0).kind(), NodeKind::Paragraph);
        // Gap between paragraphs belongs to the root, but a node ending at
        // the position wins.
        assert_eq!(tree.resolve(4).from(), 0);
        assert_eq!(tree.resolve(4).kind(), NodeKind::Paragraph);
        assert_eq!(tree.resolve(10).from(), 5);
    }

    #[test]
    fn test_parent_and_child_lookup() {
        let tree = sample();
        let emphasis = tree.resolve(2);

        assert_eq!(emphasis.parent().map(|p| p.kind()), Some(NodeKind::Paragraph));
        assert!(emphasis.has_ancestor(NodeKind::Document));
        assert_eq!(tree.root().children_of(NodeKind::Paragraph).count(), 2);
        assert!(tree.root().child(NodeKind::Emphasis).is_none());
    }
}
