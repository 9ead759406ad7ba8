//! Fenced code blocks: the language badge, the language popover, and the
//! arrow-key and select-all rules that treat a hidden fence as a boundary.

use serde::Serialize;

use super::Element;
use crate::decorations::DocRange;
use crate::editing::{Change, DispatchError, EditorBuffer, Selection};
use crate::lines::{Line, LineIndex};
use crate::syntax::{NodeKind, SyntaxNode, SyntaxTree};

/// Languages offered by the popover, in display order.
pub const KNOWN_LANGUAGES: &[&str] = &[
    "bash", "c", "cmake", "coffeescript", "cpp", "csharp", "css", "dart", "diff", "docker",
    "elixir", "erlang", "go", "graphql", "groovy", "haskell", "html", "ini", "java",
    "javascript", "json", "jsx", "kotlin", "latex", "lua", "makefile", "markdown", "matlab",
    "mermaid", "nginx", "objectivec", "ocaml", "perl", "php", "plaintext", "powershell",
    "python", "r", "ruby", "rust", "sass", "scala", "scss", "shell", "sql", "swift", "toml",
    "tsx", "typescript", "vim", "xml", "yaml", "zig",
];

pub const MAX_SUGGESTIONS: usize = 8;

/// Language label shown at the end of a (hidden) opening fence line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeBadge {
    pub language: String,
    /// Info string range, or an empty range right after the backticks.
    pub info: DocRange,
    pub block: DocRange,
}

impl CodeBadge {
    pub fn new(language: impl Into<String>, info: DocRange, block: DocRange) -> Self {
        Self {
            language: language.into(),
            info,
            block,
        }
    }

    pub fn render(&self) -> Element {
        Element::new("span")
            .class("codeblock-badge")
            .attr("data-block-id", block_id(self.block))
            .attr("data-info-from", self.info.from.to_string())
            .attr("data-info-to", self.info.to.to_string())
            .text(self.language.clone())
    }
}

pub fn block_id(block: DocRange) -> String {
    format!("{}:{}", block.from, block.to)
}

/// Line geometry of one fenced code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedBlock {
    pub range: DocRange,
    pub language: String,
    pub info: DocRange,
    pub open_line: Line,
    pub close_line: Line,
    /// Code between the fences without the final newline. `None` for an empty block.
    pub code: Option<DocRange>,
    pub first_code_line: Option<Line>,
    pub last_code_line: Option<Line>,
    pub line_above: Option<Line>,
    pub line_below: Option<Line>,
}

impl FencedBlock {
    pub fn from_node(node: SyntaxNode<'_>, text: &str, lines: &LineIndex) -> Self {
        let range = node.range();
        let open_line = lines.line_at(range.from);

        let delimiters: Vec<SyntaxNode<'_>> = node.children_of(NodeKind::FenceDelimiter).collect();
        let close_line = match delimiters.as_slice() {
            [_, .., last] => lines.line_at(last.from()),
            _ => {
                let end = text.get(..range.to).map_or(range.to, |t| t.trim_end_matches('\n').len());
                lines.line_at(range.from.max(end.saturating_sub(1)))
            }
        };

        let info_node = node.child(NodeKind::InfoString);
        let info = match (info_node, delimiters.first()) {
            (Some(info), _) => info.range(),
            (None, Some(open)) => DocRange::new(open.to(), open.to()),
            (None, None) => DocRange::new(open_line.to, open_line.to),
        };
        let language = info_node
            .and_then(|info| info.text(text).split_whitespace().next())
            .unwrap_or("")
            .to_lowercase();

        let code = node.child(NodeKind::CodeFenceContent).and_then(|content| {
            let raw = content.text(text);
            let trimmed = raw.strip_suffix('\n').unwrap_or(raw);
            (!raw.is_empty()).then(|| DocRange::new(content.from(), content.from() + trimmed.len()))
        });
        let first_code_line = code.map(|code| lines.line_at(code.from));
        let last_code_line = code.map(|code| lines.line_at(code.from.max(code.to.saturating_sub(1))));

        let line_above = open_line.number.checked_sub(1).and_then(|n| lines.line(n));
        let line_below = lines.line(close_line.number + 1);

        Self {
            range,
            language,
            info,
            open_line,
            close_line,
            code,
            first_code_line,
            last_code_line,
            line_above,
            line_below,
        }
    }

    pub fn id(&self) -> String {
        block_id(self.range)
    }

    /// Caret position used when entering the block from above.
    pub fn first_code_line_entry(&self) -> Option<usize> {
        self.first_code_line.map(|line| (line.from + 1).min(line.to))
    }

    pub fn badge(&self) -> CodeBadge {
        CodeBadge::new(self.language.clone(), self.info, self.range)
    }

    pub fn popover(&self) -> LanguagePopover {
        LanguagePopover::new(
            &self.badge(),
            self.line_above.map(|line| line.from),
            self.first_code_line_entry(),
        )
    }
}

/// Every fenced code block in document order.
pub fn fenced_blocks(text: &str, tree: &SyntaxTree, lines: &LineIndex) -> Vec<FencedBlock> {
    tree.iter()
        .filter(|node| node.kind() == NodeKind::FencedCodeBlock)
        .map(|node| FencedBlock::from_node(node, text, lines))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationAction {
    OpenLanguageEditor {
        block: DocRange,
        line_above_from: Option<usize>,
        first_code_line_entry: Option<usize>,
    },
    MoveCursor { target: usize },
}

/// What an arrow key should do at a code block boundary. `None` lets the
/// editor's default motion run.
pub fn resolve_arrow_navigation(
    text: &str,
    tree: &SyntaxTree,
    lines: &LineIndex,
    selection: Selection,
    direction: Direction,
) -> Option<NavigationAction> {
    if !selection.is_empty() {
        return None;
    }
    let cursor_line = lines.line_at(selection.head).number;
    let on = |line: Option<Line>| line.is_some_and(|line| line.number == cursor_line);

    for block in fenced_blocks(text, tree, lines) {
        let open_editor = NavigationAction::OpenLanguageEditor {
            block: block.range,
            line_above_from: block.line_above.map(|line| line.from),
            first_code_line_entry: block.first_code_line_entry(),
        };
        match direction {
            Direction::Up => {
                if on(block.first_code_line) {
                    return Some(open_editor);
                }
                if on(block.line_below) {
                    if let Some(last) = block.last_code_line {
                        return Some(NavigationAction::MoveCursor { target: last.from });
                    }
                }
            }
            Direction::Down => {
                if on(block.line_above) && block.first_code_line.is_some() {
                    return Some(open_editor);
                }
                if on(block.last_code_line) {
                    if let Some(below) = block.line_below {
                        return Some(NavigationAction::MoveCursor { target: below.from });
                    }
                }
            }
        }
    }
    None
}

/// Select-all inside a code block (or on either fence line) selects only the code.
pub fn resolve_select_all_range(
    text: &str,
    tree: &SyntaxTree,
    lines: &LineIndex,
    selection: Selection,
) -> Option<DocRange> {
    let head = selection.head;
    let cursor_line = lines.line_at(head).number;
    fenced_blocks(text, tree, lines).into_iter().find_map(|block| {
        let code = block.code?;
        let inside_code = head >= code.from && head <= code.to;
        let on_fence_lines =
            cursor_line >= block.open_line.number && cursor_line <= block.close_line.number;
        (inside_code || on_fence_lines).then_some(code)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopoverKey {
    Up,
    Down,
    Enter,
    Tab,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopoverOutcome {
    /// Still open.
    Pending,
    Committed { changed: bool },
    Cancelled,
    /// Closed by an arrow key with an empty query; the caret moved to `target`.
    Exited { target: Option<usize> },
    /// The popover had already closed.
    Closed,
}

/// Inline language editor opened from a badge or by arrow navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePopover {
    info: DocRange,
    current: String,
    query: String,
    suggestions: Vec<&'static str>,
    active: Option<usize>,
    line_above_from: Option<usize>,
    first_code_line_entry: Option<usize>,
    closed: bool,
}

impl LanguagePopover {
    pub fn new(
        badge: &CodeBadge,
        line_above_from: Option<usize>,
        first_code_line_entry: Option<usize>,
    ) -> Self {
        let mut popover = Self {
            info: badge.info,
            current: badge.language.clone(),
            query: badge.language.clone(),
            suggestions: Vec::new(),
            active: None,
            line_above_from,
            first_code_line_entry,
            closed: false,
        };
        popover.filter();
        popover
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn suggestions(&self) -> &[&'static str] {
        &self.suggestions
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.filter();
    }

    fn filter(&mut self) {
        let query = self.query.trim().to_lowercase();
        self.active = None;
        let matches: Vec<&'static str> = KNOWN_LANGUAGES
            .iter()
            .copied()
            .filter(|language| query.is_empty() || language.contains(query.as_str()))
            .collect();

        self.suggestions = match matches.as_slice() {
            [] => Vec::new(),
            [only] if *only == query => Vec::new(),
            _ => matches.into_iter().take(MAX_SUGGESTIONS).collect(),
        };
    }

    fn set_active(&mut self, index: isize) {
        if self.suggestions.is_empty() {
            return;
        }
        let last = self.suggestions.len() as isize - 1;
        self.active = Some(index.clamp(0, last) as usize);
    }

    fn active_suggestion(&self) -> Option<&'static str> {
        self.active.and_then(|index| self.suggestions.get(index).copied())
    }

    pub fn handle_key<B: EditorBuffer + ?Sized>(
        &mut self,
        key: PopoverKey,
        buffer: &mut B,
    ) -> Result<PopoverOutcome, DispatchError> {
        if self.closed {
            return Ok(PopoverOutcome::Closed);
        }
        match key {
            PopoverKey::Up | PopoverKey::Down if self.query.trim().is_empty() => {
                let target = match key {
                    PopoverKey::Up => self.line_above_from,
                    _ => self.first_code_line_entry,
                };
                self.closed = true;
                if let Some(target) = target {
                    buffer.dispatch(Vec::new(), Some(Selection::caret(target)))?;
                }
                buffer.focus();
                Ok(PopoverOutcome::Exited { target })
            }
            PopoverKey::Down => {
                let next = self.active.map_or(0, |index| index as isize + 1);
                self.set_active(next);
                Ok(PopoverOutcome::Pending)
            }
            PopoverKey::Up => {
                let previous = self.active.map_or(-1, |index| index as isize - 1);
                self.set_active(previous);
                Ok(PopoverOutcome::Pending)
            }
            PopoverKey::Enter => {
                if let Some(suggestion) = self.active_suggestion() {
                    self.query = suggestion.to_string();
                }
                self.commit(buffer)
            }
            PopoverKey::Tab => {
                if let Some(suggestion) = self.active_suggestion() {
                    self.set_query(suggestion);
                }
                Ok(PopoverOutcome::Pending)
            }
            PopoverKey::Escape => {
                self.closed = true;
                buffer.focus();
                Ok(PopoverOutcome::Cancelled)
            }
        }
    }

    /// Write the typed language back into the info string (Enter or blur).
    pub fn commit<B: EditorBuffer + ?Sized>(
        &mut self,
        buffer: &mut B,
    ) -> Result<PopoverOutcome, DispatchError> {
        if self.closed {
            return Ok(PopoverOutcome::Closed);
        }
        self.closed = true;
        let language = self.query.trim().to_lowercase();
        let changed = language != self.current;
        if changed {
            buffer.dispatch(vec![Change::new(self.info.from, self.info.to, language)], None)?;
        }
        buffer.focus();
        Ok(PopoverOutcome::Committed { changed })
    }

    pub fn render(&self) -> Element {
        let query = self.query.trim().to_lowercase();
        let mut list = Element::new("ul").class("codeblock-lang-list");
        if self.suggestions.is_empty() {
            list = list.style("display: none;");
        }
        let items = self.suggestions.iter().enumerate().map(|(index, language)| {
            let class = if Some(index) == self.active {
                "codeblock-lang-option active"
            } else {
                "codeblock-lang-option"
            };
            let item = Element::new("li").class(class);
            match language.find(query.as_str()) {
                Some(at) if !query.is_empty() => item
                    .text(&language[..at])
                    .child(Element::new("strong").text(&language[at..at + query.len()]))
                    .text(&language[at + query.len()..]),
                _ => item.text(*language),
            }
        });

        Element::new("div")
            .class("codeblock-lang-popover")
            .child(
                Element::new("input")
                    .attr("type", "text")
                    .class("codeblock-lang-input")
                    .attr("value", self.query.clone())
                    .attr("spellcheck", "false")
                    .attr("autocomplete", "off")
                    .attr("placeholder", "language\u{2026}"),
            )
            .child(list.children(items))
    }
}
