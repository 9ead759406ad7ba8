use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ListMarkerKind {
    /// `-`, `+` or `*`
    Bullet,
    /// `1.` or `1)`
    Ordered,
}

/// Node types the decoration builder dispatches on. Everything else is
/// `Other` and keeps its grammar name on the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    Document,
    Section,
    AtxHeading,
    AtxMarker(u8),
    SetextHeading,
    SetextUnderline(u8),
    Paragraph,
    Inline,
    BlockQuote,
    BlockQuoteMarker,
    BlockContinuation,
    List,
    ListItem,
    ListMarker(ListMarkerKind),
    TaskMarker { checked: bool },
    ThematicBreak,
    FencedCodeBlock,
    FenceDelimiter,
    InfoString,
    Language,
    CodeFenceContent,
    IndentedCodeBlock,
    HtmlBlock,
    PipeTable,
    Emphasis,
    StrongEmphasis,
    Strikethrough,
    CodeSpan,
    InlineLink,
    Image,
    LinkText,
    LinkDestination,
    ShortcutLink,
    HtmlTag,
    Other,
}

impl NodeKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "document" => NodeKind::Document,
            "section" => NodeKind::Section,
            "atx_heading" => NodeKind::AtxHeading,
            "atx_h1_marker" => NodeKind::AtxMarker(1),
            "atx_h2_marker" => NodeKind::AtxMarker(2),
            "atx_h3_marker" => NodeKind::AtxMarker(3),
            "atx_h4_marker" => NodeKind::AtxMarker(4),
            "atx_h5_marker" => NodeKind::AtxMarker(5),
            "atx_h6_marker" => NodeKind::AtxMarker(6),
            "setext_heading" => NodeKind::SetextHeading,
            "setext_h1_underline" => NodeKind::SetextUnderline(1),
            "setext_h2_underline" => NodeKind::SetextUnderline(2),
            "paragraph" => NodeKind::Paragraph,
            "inline" => NodeKind::Inline,
            "block_quote" => NodeKind::BlockQuote,
            "block_quote_marker" => NodeKind::BlockQuoteMarker,
            "block_continuation" => NodeKind::BlockContinuation,
            "list" => NodeKind::List,
            "list_item" => NodeKind::ListItem,
            "list_marker_minus" | "list_marker_plus" | "list_marker_star" => {
                NodeKind::ListMarker(ListMarkerKind::Bullet)
            }
            "list_marker_dot" | "list_marker_parenthesis" => {
                NodeKind::ListMarker(ListMarkerKind::Ordered)
            }
            "task_list_marker_checked" => NodeKind::TaskMarker { checked: true },
            "task_list_marker_unchecked" => NodeKind::TaskMarker { checked: false },
            "thematic_break" => NodeKind::ThematicBreak,
            "fenced_code_block" => NodeKind::FencedCodeBlock,
            "fenced_code_block_delimiter" => NodeKind::FenceDelimiter,
            "info_string" => NodeKind::InfoString,
            "language" => NodeKind::Language,
            "code_fence_content" => NodeKind::CodeFenceContent,
            "indented_code_block" => NodeKind::IndentedCodeBlock,
            "html_block" => NodeKind::HtmlBlock,
            "pipe_table" => NodeKind::PipeTable,
            "emphasis" => NodeKind::Emphasis,
            "strong_emphasis" => NodeKind::StrongEmphasis,
            "strikethrough" => NodeKind::Strikethrough,
            "code_span" => NodeKind::CodeSpan,
            "inline_link" => NodeKind::InlineLink,
            "image" => NodeKind::Image,
            "link_text" => NodeKind::LinkText,
            "link_destination" => NodeKind::LinkDestination,
            "shortcut_link" => NodeKind::ShortcutLink,
            "html_tag" => NodeKind::HtmlTag,
            _ => NodeKind::Other,
        }
    }

    /// Code whose content must never be decorated as markdown.
    pub fn is_code(&self) -> bool {
        matches!(
            self,
            NodeKind::FencedCodeBlock | NodeKind::IndentedCodeBlock | NodeKind::CodeSpan
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("atx_h3_marker", NodeKind::AtxMarker(3))]
    #[case("list_marker_star", NodeKind::ListMarker(ListMarkerKind::Bullet))]
    #[case("list_marker_parenthesis", NodeKind::ListMarker(ListMarkerKind::Ordered))]
    #[case("task_list_marker_checked", NodeKind::TaskMarker { checked: true })]
    #[case("pipe_table_cell", NodeKind::Other)]
    fn test_from_name(#[case] name: &str, #[case] expected: NodeKind) {
        assert_eq!(NodeKind::from_name(name), expected);
    }
}
