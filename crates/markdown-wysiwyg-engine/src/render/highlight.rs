use std::sync::OnceLock;

use syntect::parsing::{ParseState, Scope, ScopeStack, SyntaxSet};

use super::{CodeHighlighter, HighlightToken, TokenKind};

fn default_syntaxes() -> &'static SyntaxSet {
    static SYNTAXES: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAXES.get_or_init(SyntaxSet::load_defaults_newlines)
}

/// Scope prefixes, checked in order against each scope on the stack from the
/// outermost in, so a whole comment or string wins over its punctuation.
fn scope_kinds() -> &'static [(Scope, TokenKind)] {
    static KINDS: OnceLock<Vec<(Scope, TokenKind)>> = OnceLock::new();
    KINDS.get_or_init(|| {
        [
            ("comment", TokenKind::Comment),
            ("string", TokenKind::String),
            ("constant.numeric", TokenKind::Number),
            ("constant.language", TokenKind::Keyword),
            ("keyword.operator", TokenKind::Punctuation),
            ("keyword", TokenKind::Keyword),
            ("storage", TokenKind::Keyword),
            ("entity.name.function", TokenKind::Function),
            ("support.function", TokenKind::Function),
            ("variable.function", TokenKind::Function),
            ("punctuation", TokenKind::Punctuation),
        ]
        .into_iter()
        .filter_map(|(prefix, kind)| Scope::new(prefix).ok().map(|scope| (scope, kind)))
        .collect()
    })
}

fn classify(stack: &ScopeStack) -> Option<TokenKind> {
    stack.as_slice().iter().find_map(|scope| {
        scope_kinds()
            .iter()
            .find(|(prefix, _)| prefix.is_prefix_of(*scope))
            .map(|(_, kind)| *kind)
    })
}

/// Highlighting from syntect's bundled Sublime syntaxes. The fence language
/// is looked up by name or file extension (`rust`, `rs`, `py`, `json`, ...).
#[derive(Clone, Copy)]
pub struct SyntectHighlighter {
    syntaxes: &'static SyntaxSet,
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self {
            syntaxes: default_syntaxes(),
        }
    }
}

impl std::fmt::Debug for SyntectHighlighter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntectHighlighter")
            .field("syntaxes", &self.syntaxes.syntaxes().len())
            .finish()
    }
}

impl SyntectHighlighter {
    /// The process-wide instance used when a build context names none.
    pub fn shared() -> &'static Self {
        static SHARED: OnceLock<SyntectHighlighter> = OnceLock::new();
        SHARED.get_or_init(Self::default)
    }

    fn tokens(&self, code: &str, language: &str) -> anyhow::Result<Vec<HighlightToken>> {
        let Some(syntax) = self.syntaxes.find_syntax_by_token(language) else {
            return Ok(Vec::new());
        };
        let mut state = ParseState::new(syntax);
        let mut stack = ScopeStack::new();
        let mut tokens: Vec<HighlightToken> = Vec::new();
        let mut push = |from: usize, to: usize, stack: &ScopeStack| {
            let Some(kind) = classify(stack) else {
                return;
            };
            if from >= to {
                return;
            }
            match tokens.last_mut() {
                Some(last) if last.kind == kind && last.to == from => last.to = to,
                _ => tokens.push(HighlightToken { from, to, kind }),
            }
        };

        let mut offset = 0;
        for line in code.split_inclusive('\n') {
            let ops = state.parse_line(line, self.syntaxes)?;
            let mut start = 0;
            for (at, op) in ops {
                push(offset + start, offset + at, &stack);
                stack.apply(&op)?;
                start = at;
            }
            push(offset + start, offset + line.len(), &stack);
            offset += line.len();
        }
        Ok(tokens)
    }
}

impl CodeHighlighter for SyntectHighlighter {
    fn highlight(&self, code: &str, language: &str) -> Vec<HighlightToken> {
        let language = language.trim();
        if language.is_empty() {
            return Vec::new();
        }
        match self.tokens(code, language) {
            Ok(tokens) => tokens,
            Err(e) => {
                log::warn!("Highlighting {language} failed: {e}");
                Vec::new()
            }
        }
    }
}
