//! # Render collaborators
//!
//! Math, diagrams, syntax highlighting and image paths are produced outside
//! the engine. These traits are the seams; the engine only caches what they
//! return and falls back to escaped source when they fail.

pub mod cache;
pub mod highlight;
pub mod images;

use markdown_wysiwyg_config::{DiagramSecurityLevel, Theme};
use serde::Serialize;
use thiserror::Error;

pub use cache::{RenderCache, render_cache};
pub use highlight::SyntectHighlighter;
pub use images::{FileImageResolver, ImageSrcResolver, normalize_markdown_url};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("math render failed for {content:?}: {message}")]
    Math { content: String, message: String },

    #[error("diagram render failed: {message}")]
    Diagram { message: String },

    #[error("no renderer registered for {what}")]
    Unavailable { what: &'static str },
}

/// Turns TeX source into sanitized markup.
pub trait MathRenderer {
    fn render_math(&self, content: &str, display: bool) -> Result<String, RenderError>;
}

/// A diagram render the host performs asynchronously.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DiagramRequest {
    pub code: String,
    pub theme: Theme,
    pub security_level: DiagramSecurityLevel,
}

impl DiagramRequest {
    pub fn new(code: impl Into<String>, theme: Theme, security_level: DiagramSecurityLevel) -> Self {
        Self {
            code: code.into(),
            theme,
            security_level,
        }
    }

    /// `{code}:{theme}:{security}`
    pub fn cache_key(&self) -> String {
        format!(
            "{}:{}:{}",
            self.code,
            self.theme.as_str(),
            self.security_level.as_str()
        )
    }
}

/// Turns diagram source into sanitized SVG markup.
///
/// Hosts with a suspending renderer resolve [`crate::session::PendingRender`]s
/// themselves and report back through `EditorSession::complete_render`.
pub trait DiagramRenderer {
    fn render_diagram(&self, request: &DiagramRequest) -> Result<String, RenderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Keyword,
    String,
    Comment,
    Function,
    Number,
    Punctuation,
}

impl TokenKind {
    pub fn color(&self, theme: Theme) -> &'static str {
        let dark = theme == Theme::Dark;
        match (self, dark) {
            (TokenKind::Keyword, true) => "#c678dd",
            (TokenKind::Keyword, false) => "#a626a4",
            (TokenKind::String, true) => "#98c379",
            (TokenKind::String, false) => "#50a14f",
            (TokenKind::Comment, true) => "#5c6370",
            (TokenKind::Comment, false) => "#a0a1a7",
            (TokenKind::Function, true) => "#61afef",
            (TokenKind::Function, false) => "#4078f2",
            (TokenKind::Number, true) => "#d19a66",
            (TokenKind::Number, false) => "#986801",
            (TokenKind::Punctuation, true) => "#abb2bf",
            (TokenKind::Punctuation, false) => "#383a42",
        }
    }
}

/// A highlighted span, relative to the start of the code passed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightToken {
    pub from: usize,
    pub to: usize,
    pub kind: TokenKind,
}

pub trait CodeHighlighter {
    /// Tokens must be sorted and must not overlap. Unknown languages yield none.
    fn highlight(&self, code: &str, language: &str) -> Vec<HighlightToken>;
}

/// Highlighter that never colours anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainHighlighter;

impl CodeHighlighter for PlainHighlighter {
    fn highlight(&self, _code: &str, _language: &str) -> Vec<HighlightToken> {
        Vec::new()
    }
}

/// Math renderer used when the host registers none: escaped TeX in a
/// `math-inline` span or `math-display` div.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceMathRenderer;

impl MathRenderer for SourceMathRenderer {
    fn render_math(&self, content: &str, display: bool) -> Result<String, RenderError> {
        let escaped = html_escape::encode_text(content);
        Ok(if display {
            format!("<div class=\"math-display\">{escaped}</div>")
        } else {
            format!("<span class=\"math-inline\">{escaped}</span>")
        })
    }
}

/// Escaped source in a `pre > code` block, shown when a render fails.
pub fn fallback_code_html(source: &str) -> String {
    format!(
        "<pre class=\"render-fallback\"><code>{}</code></pre>",
        html_escape::encode_text(source)
    )
}
