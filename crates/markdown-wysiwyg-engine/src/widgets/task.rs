use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::Element;
use crate::decorations::DocRange;
use crate::editing::{Change, DispatchError, EditorBuffer};

/// Checkbox standing in for `- [ ] `. `marker` is the `[ ]` / `[x]` itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskCheckbox {
    pub checked: bool,
    pub marker: DocRange,
}

fn marker_regex() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"^\[[ xX]\]$").expect("valid task marker regex"))
}

pub fn is_task_marker(text: &str) -> bool {
    marker_regex().is_match(text)
}

pub fn toggled_marker(text: &str) -> &'static str {
    if text.eq_ignore_ascii_case("[x]") { "[ ]" } else { "[x]" }
}

impl TaskCheckbox {
    pub fn new(checked: bool, marker: DocRange) -> Self {
        Self { checked, marker }
    }

    pub fn render(&self) -> Element {
        let mut input = Element::new("input")
            .attr("type", "checkbox")
            .attr("tabindex", "-1")
            .attr("aria-hidden", "true")
            .attr("data-marker-from", self.marker.from.to_string())
            .attr("data-marker-to", self.marker.to.to_string())
            .style("margin-right: 8px; transform: translateY(1px); width: 0.95em; height: 0.95em; accent-color: rgb(var(--c-link) / 1); cursor: pointer;");
        if self.checked {
            input = input.attr("checked", "checked");
        }
        input
    }

    /// Flip the marker text. Returns `Ok(false)` when the recorded range no
    /// longer holds a checkbox marker.
    pub fn toggle<B: EditorBuffer + ?Sized>(&self, buffer: &mut B) -> Result<bool, DispatchError> {
        let DocRange { from, to } = self.marker;
        if from >= to || to > buffer.len() {
            log::warn!("Ignoring task toggle with stale marker range {from}..{to}");
            return Ok(false);
        }
        let current = buffer.slice(from, to);
        if !is_task_marker(&current) {
            return Ok(false);
        }
        match buffer.dispatch(vec![Change::new(from, to, toggled_marker(&current))], None) {
            Ok(_) => Ok(true),
            Err(DispatchError::Misaligned { .. }) => {
                log::warn!("Ignoring task toggle with marker range {from}..{to} inside a character");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}
