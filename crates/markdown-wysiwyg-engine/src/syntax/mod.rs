//! # Syntax tree adapter
//!
//! tree-sitter-md ships two grammars: a block grammar for document structure
//! and an inline grammar for emphasis, links, code spans and HTML tags. The
//! block tree is parsed first (incrementally when a previous tree is
//! available); each block `inline` node is then parsed with the inline grammar
//! restricted to that node's bytes, so inline nodes carry absolute offsets.
//!
//! Both passes are flattened into one owned [`SyntaxTree`] so the decoration
//! builder can walk a single tree with parent links and never touches
//! tree-sitter lifetimes.

pub mod kind;
pub mod tree;

use thiserror::Error;
use tree_sitter::{Node, Parser, Point, Tree};
use tree_sitter_md::{INLINE_LANGUAGE, LANGUAGE};

pub use kind::{ListMarkerKind, NodeKind};
pub use tree::{NodeId, SyntaxNode, SyntaxTree, Visit};

#[derive(Debug, Error)]
pub enum SyntaxError {
    #[error("Failed to load {grammar} markdown grammar: {source}")]
    Language {
        grammar: &'static str,
        source: tree_sitter::LanguageError,
    },
    #[error("Parser produced no tree for a {len} byte document")]
    NoTree { len: usize },
}

/// Block and inline parsers for one document.
pub struct MarkdownParser {
    block: Parser,
    inline: Parser,
}

impl MarkdownParser {
    pub fn new() -> Result<Self, SyntaxError> {
        let mut block = Parser::new();
        block
            .set_language(&LANGUAGE.into())
            .map_err(|source| SyntaxError::Language {
                grammar: "block",
                source,
            })?;

        let mut inline = Parser::new();
        inline
            .set_language(&INLINE_LANGUAGE.into())
            .map_err(|source| SyntaxError::Language {
                grammar: "inline",
                source,
            })?;

        Ok(Self { block, inline })
    }

    /// Parse block structure. Pass the previous tree, already edited, to
    /// reuse unchanged subtrees.
    pub fn parse_blocks(&mut self, text: &str, old_tree: Option<&Tree>) -> Result<Tree, SyntaxError> {
        self.block
            .parse(text, old_tree)
            .ok_or(SyntaxError::NoTree { len: text.len() })
    }

    /// Flatten a block tree plus per-paragraph inline parses into a [`SyntaxTree`].
    pub fn build(&mut self, text: &str, block_tree: &Tree) -> SyntaxTree {
        let mut tree = SyntaxTree::empty(text.len());
        let root = tree.root().id();
        let block_root = block_tree.root_node();
        let mut cursor = block_root.walk();
        for child in block_root.named_children(&mut cursor) {
            self.convert_block(text, child, root, &mut tree);
        }
        tree
    }

    pub fn parse(&mut self, text: &str) -> Result<SyntaxTree, SyntaxError> {
        let block_tree = self.parse_blocks(text, None)?;
        Ok(self.build(text, &block_tree))
    }

    fn convert_block(&mut self, text: &str, node: Node<'_>, parent: NodeId, tree: &mut SyntaxTree) {
        let name = node.kind();
        let id = tree.push(
            NodeKind::from_name(name),
            name,
            node.start_byte(),
            node.end_byte(),
            Some(parent),
        );

        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
        for child in &children {
            self.convert_block(text, *child, id, tree);
        }

        if name == "inline" {
            self.attach_inline(text, node, id, tree);
            tree.sort_children(id);
        }
    }

    fn attach_inline(&mut self, text: &str, node: Node<'_>, id: NodeId, tree: &mut SyntaxTree) {
        let ranges = inline_ranges(node);
        if ranges.is_empty() {
            return;
        }
        if let Err(err) = self.inline.set_included_ranges(&ranges) {
            log::warn!("Skipping inline parse at {}: {err:?}", node.start_byte());
            return;
        }
        let Some(inline_tree) = self.inline.parse(text, None) else {
            log::warn!("Inline parser produced no tree at {}", node.start_byte());
            return;
        };

        let inline_root = inline_tree.root_node();
        let mut cursor = inline_root.walk();
        for child in inline_root.named_children(&mut cursor) {
            convert_inline(child, id, tree);
        }
    }
}

fn convert_inline(node: Node<'_>, parent: NodeId, tree: &mut SyntaxTree) {
    let name = node.kind();
    let id = tree.push(
        NodeKind::from_name(name),
        name,
        node.start_byte(),
        node.end_byte(),
        Some(parent),
    );
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        convert_inline(child, id, tree);
    }
}

/// The inline node's span with its block-level children (continuation
/// markers such as `> ` inside a quoted paragraph) cut out.
fn inline_ranges(node: Node<'_>) -> Vec<tree_sitter::Range> {
    let mut ranges = Vec::new();
    let mut start_byte = node.start_byte();
    let mut start_point = node.start_position();

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.start_byte() > start_byte {
            ranges.push(range(start_byte, start_point, child.start_byte(), child.start_position()));
        }
        start_byte = child.end_byte();
        start_point = child.end_position();
    }
    if node.end_byte() > start_byte {
        ranges.push(range(start_byte, start_point, node.end_byte(), node.end_position()));
    }
    ranges
}

fn range(start_byte: usize, start_point: Point, end_byte: usize, end_point: Point) -> tree_sitter::Range {
    tree_sitter::Range {
        start_byte,
        end_byte,
        start_point,
        end_point,
    }
}

/// Parse `text` into a [`SyntaxTree`]. A grammar failure is logged and yields
/// a tree holding only the document root.
pub fn parse(text: &str) -> SyntaxTree {
    match MarkdownParser::new().and_then(|mut parser| parser.parse(text)) {
        Ok(tree) => tree,
        Err(err) => {
            log::warn!("Falling back to an empty syntax tree: {err}");
            SyntaxTree::empty(text.len())
        }
    }
}
