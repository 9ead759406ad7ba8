//! Inline CSS painted onto rendered constructs.
//!
//! Colours go through CSS custom properties so the host theme decides them.

pub const DIM: &str = "opacity: 0.35;";

pub const BOLD: &str = "font-weight: 700;";
pub const ITALIC: &str = "font-style: italic;";
pub const STRIKETHROUGH: &str =
    "text-decoration: line-through; color: rgb(var(--c-wys-strikethrough-text) / 1);";
pub const INLINE_CODE: &str = "background: var(--c-wys-inline-code-bg); padding: 1px 4px; border-radius: 3px; font-family: monospace; font-size: 0.9em;";
pub const LINK_TEXT: &str =
    "color: rgb(var(--c-wys-link-text) / 1); text-decoration: underline; cursor: pointer;";

pub const ORDERED_MARKER: &str = "opacity: 0.6; font-weight: 600;";
pub const LIST_LINE: &str = "padding-left: 8px;";
pub const BLOCKQUOTE_LINE: &str = "border-left: 3px solid rgb(var(--c-wys-blockquote-border) / 1); padding-left: 12px; color: rgb(var(--c-wys-blockquote-text) / 1); font-style: italic;";
pub const HORIZONTAL_RULE_LINE: &str = "border-bottom: 1px solid rgb(var(--c-wys-hr-border) / 1); padding: 12px 0; line-height: 1; color: transparent;";

pub const UNDERLINE: &str = "text-decoration: underline;";
pub const SUPERSCRIPT: &str = "vertical-align: super; font-size: 0.75em; line-height: 1;";
pub const SUBSCRIPT: &str = "vertical-align: sub; font-size: 0.75em; line-height: 1;";

pub const CODE_LINE_CLASS: &str = "codeblock-line";
pub const CODE_FENCE_OPEN_CLASS: &str = "codeblock-fence codeblock-fence-open";
pub const CODE_FENCE_CLOSE_CLASS: &str = "codeblock-fence codeblock-fence-close";

/// Line style for an ATX or setext heading. Levels outside 1..=6 get level 1.
pub fn heading(level: u8) -> &'static str {
    match level {
        2 => "font-size: 1.5em; font-weight: 700; line-height: 1.3;",
        3 => "font-size: 1.25em; font-weight: 600; line-height: 1.4;",
        4 => "font-size: 1.1em; font-weight: 600; line-height: 1.4;",
        5 => "font-size: 1em; font-weight: 600; line-height: 1.5;",
        6 => {
            "font-size: 0.9em; font-weight: 600; line-height: 1.5; color: rgb(var(--c-wys-heading-6-text) / 1);"
        }
        _ => "font-size: 2em; font-weight: 700; line-height: 1.2;",
    }
}
