//! Image `src` resolution for the image widget.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use relative_path::RelativePathBuf;

/// Maps the raw markdown URL of an image to something the host can display.
pub trait ImageSrcResolver {
    fn resolve(&self, url: &str, document_path: Option<&Path>) -> String;
}

/// Strip surrounding whitespace and an optional `<...>` wrapper.
pub fn normalize_markdown_url(url: &str) -> &str {
    let trimmed = url.trim();
    trimmed
        .strip_prefix('<')
        .and_then(|rest| rest.strip_suffix('>'))
        .map_or(trimmed, str::trim)
}

fn windows_drive_regex() -> &'static Regex {
    static DRIVE: OnceLock<Regex> = OnceLock::new();
    DRIVE.get_or_init(|| Regex::new(r"^[A-Za-z]:[\\/]").expect("valid drive regex"))
}

fn scheme_regex() -> &'static Regex {
    static SCHEME: OnceLock<Regex> = OnceLock::new();
    SCHEME.get_or_init(|| Regex::new(r"^[a-zA-Z][a-zA-Z\d+.-]*:").expect("valid scheme regex"))
}

pub fn is_absolute_file_path(value: &str) -> bool {
    value.starts_with('/') || value.starts_with("\\\\") || windows_drive_regex().is_match(value)
}

pub fn is_web_url(value: &str) -> bool {
    !is_absolute_file_path(value) && (scheme_regex().is_match(value) || value.starts_with("//"))
}

fn to_file_url(path: &str) -> String {
    let posix = path.replace('\\', "/").replace(' ', "%20");
    if windows_drive_regex().is_match(&posix) {
        format!("file:///{posix}")
    } else if posix.starts_with("//") {
        format!("file:{posix}")
    } else {
        format!("file://{posix}")
    }
}

/// Resolves local images to `file://` URLs, relative paths against the
/// directory of the active document.
#[derive(Debug, Clone, Default)]
pub struct FileImageResolver;

impl FileImageResolver {
    fn resolve_relative(relative: &str, document_path: &Path) -> PathBuf {
        let base = document_path.parent().unwrap_or_else(|| Path::new(""));
        RelativePathBuf::from(relative.replace('\\', "/")).to_logical_path(base)
    }
}

impl ImageSrcResolver for FileImageResolver {
    fn resolve(&self, url: &str, document_path: Option<&Path>) -> String {
        let normalized = normalize_markdown_url(url);
        if normalized.is_empty() || normalized.starts_with("file://") {
            return normalized.to_string();
        }
        if is_absolute_file_path(normalized) {
            return to_file_url(normalized);
        }
        if is_web_url(normalized) {
            return normalized.to_string();
        }
        let Some(document_path) = document_path else {
            return normalized.to_string();
        };
        let resolved = Self::resolve_relative(normalized, document_path);
        to_file_url(&resolved.to_string_lossy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("  a.png ", "a.png")]
    #[case("<my image.png>", "my image.png")]
    #[case("< spaced.png >", "spaced.png")]
    #[case("<unclosed.png", "<unclosed.png")]
    fn test_normalize_markdown_url(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_markdown_url(input), expected);
    }

    #[rstest]
    #[case("https://example.com/a.png", true)]
    #[case("data:image/png;base64,AAAA", true)]
    #[case("//cdn.example.com/a.png", true)]
    #[case("/abs/a.png", false)]
    #[case("C:\\pics\\a.png", false)]
    #[case("img/a.png", false)]
    fn test_web_url_detection(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(is_web_url(input), expected);
    }

    #[test]
    fn test_relative_path_resolves_against_document_directory() {
        let resolved = FileImageResolver.resolve(
            "../assets/pic one.png",
            Some(Path::new("/notes/daily/today.md")),
        );
        assert_eq!(resolved, "file:///notes/assets/pic%20one.png");
    }

    #[test]
    fn test_web_and_absolute_urls() {
        let doc = Some(Path::new("/notes/today.md"));
        assert_eq!(
            FileImageResolver.resolve("https://x.dev/a.png", doc),
            "https://x.dev/a.png"
        );
        assert_eq!(FileImageResolver.resolve("/img/a.png", doc), "file:///img/a.png");
        assert_eq!(
            FileImageResolver.resolve("C:\\img\\a.png", None),
            "file:///C:/img/a.png"
        );
    }

    #[test]
    fn test_relative_without_document_is_unchanged() {
        assert_eq!(FileImageResolver.resolve(" <a.png> ", None), "a.png");
    }
}
