//! Per-document engine state: render collaborators, content-addressed
//! caches, and the lifecycle of mounted widgets.
//!
//! Each open document owns one [`EditorSession`]. Nothing here is global, so
//! tests construct a fresh session and two documents never share tokens.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use markdown_wysiwyg_config::{Config, DiagramSecurityLevel, Theme};

use crate::decorations::{BuildContext, DecorationSet, DocRange, build_decorations};
use crate::editing::{Document, Selection};
use crate::lines::LineIndex;
use crate::render::{
    CodeHighlighter, DiagramRenderer, DiagramRequest, FileImageResolver, ImageSrcResolver,
    MathRenderer, RenderCache, RenderError, SourceMathRenderer, SyntectHighlighter, fallback_code_html,
    render_cache,
};
use crate::syntax::SyntaxTree;
use crate::widgets::{Element, RenderContext, Widget, diagram};

/// Handle to a widget mounted in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(u64);

impl SlotId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// A diagram render the host still has to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRender {
    pub slot: SlotId,
    pub token: u64,
    pub request: DiagramRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MountedWidget {
    pub slot: SlotId,
    pub widget: Widget,
    pub element: Element,
    /// Token of the latest render issued for this slot, if one is outstanding.
    token: Option<u64>,
    request: Option<DiagramRequest>,
}

/// [`RenderContext`] over the session's collaborators and caches.
struct WidgetServices<'s> {
    math_renderer: &'s dyn MathRenderer,
    math_cache: &'s mut RenderCache,
    image_resolver: &'s dyn ImageSrcResolver,
    document_path: Option<&'s Path>,
    diagram_cache: &'s mut RenderCache,
    theme: Theme,
    requested: Vec<DiagramRequest>,
}

impl RenderContext for WidgetServices<'_> {
    fn math_html(&mut self, content: &str, display: bool) -> String {
        let key = format!("{}:{content}", if display { "b" } else { "i" });
        if let Some(html) = self.math_cache.get(&key) {
            return html.clone();
        }
        match self.math_renderer.render_math(content, display) {
            Ok(html) => {
                self.math_cache.put(key, html.clone());
                html
            }
            Err(err) => {
                log::warn!("Math render failed, showing source: {err}");
                fallback_code_html(content)
            }
        }
    }

    fn image_src(&self, url: &str) -> String {
        self.image_resolver.resolve(url, self.document_path)
    }

    fn diagram_svg(&mut self, request: &DiagramRequest) -> Option<String> {
        if let Some(svg) = self.diagram_cache.get(&request.cache_key()) {
            return Some(svg.clone());
        }
        self.requested.push(request.clone());
        None
    }

    fn theme(&self) -> Theme {
        self.theme
    }
}

pub struct EditorSession {
    theme: Theme,
    diagram_security_level: DiagramSecurityLevel,
    document_path: Option<PathBuf>,
    math_renderer: Box<dyn MathRenderer>,
    highlighter: Box<dyn CodeHighlighter>,
    image_resolver: Box<dyn ImageSrcResolver>,
    math_cache: RenderCache,
    diagram_cache: RenderCache,
    mounted: BTreeMap<SlotId, MountedWidget>,
    next_slot: u64,
    next_token: u64,
    pending: Vec<PendingRender>,
    measure_requested: bool,
    disposed: bool,
}

impl EditorSession {
    pub fn new(config: &Config) -> Self {
        Self {
            theme: config.theme,
            diagram_security_level: config.diagram_security_level,
            document_path: None,
            math_renderer: Box::new(SourceMathRenderer),
            highlighter: Box::new(SyntectHighlighter::default()),
            image_resolver: Box::new(FileImageResolver),
            math_cache: render_cache(config.math_cache_capacity),
            diagram_cache: render_cache(config.diagram_cache_capacity),
            mounted: BTreeMap::new(),
            next_slot: 0,
            next_token: 0,
            pending: Vec::new(),
            measure_requested: false,
            disposed: false,
        }
    }

    pub fn with_math_renderer(mut self, renderer: impl MathRenderer + 'static) -> Self {
        self.math_renderer = Box::new(renderer);
        self
    }

    pub fn with_highlighter(mut self, highlighter: impl CodeHighlighter + 'static) -> Self {
        self.highlighter = Box::new(highlighter);
        self
    }

    pub fn with_image_resolver(mut self, resolver: impl ImageSrcResolver + 'static) -> Self {
        self.image_resolver = Box::new(resolver);
        self
    }

    /// Relative image paths resolve against this document from the next render on.
    pub fn set_document_path(&mut self, path: Option<PathBuf>) {
        self.document_path = path;
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn build(
        &self,
        text: &str,
        tree: &SyntaxTree,
        lines: &LineIndex,
        selection: Selection,
    ) -> DecorationSet {
        let mut cx = BuildContext::new(text, tree, lines, selection)
            .with_highlighter(self.highlighter.as_ref());
        cx.theme = self.theme;
        cx.diagram_security_level = self.diagram_security_level;
        build_decorations(&cx)
    }

    pub fn build_for(&self, document: &Document) -> DecorationSet {
        let text = document.text();
        self.build(&text, document.syntax(), document.lines(), document.selection())
    }

    pub fn mount(&mut self, widget: Widget) -> SlotId {
        let slot = SlotId(self.next_slot);
        self.next_slot += 1;
        let (element, requested) = self.render_widget(&widget);
        let mut mounted = MountedWidget {
            slot,
            widget,
            element,
            token: None,
            request: None,
        };
        self.issue_renders(&mut mounted, requested);
        self.mounted.insert(slot, mounted);
        slot
    }

    pub fn mounted(&self, slot: SlotId) -> Option<&MountedWidget> {
        self.mounted.get(&slot)
    }

    pub fn element(&self, slot: SlotId) -> Option<&Element> {
        self.mounted.get(&slot).map(|mounted| &mounted.element)
    }

    pub fn mounted_count(&self) -> usize {
        self.mounted.len()
    }

    /// Swap the widget in `slot`. Re-renders only when the new widget cannot
    /// stand in for the old one. Returns whether a re-render happened.
    pub fn update(&mut self, slot: SlotId, widget: Widget) -> bool {
        let needs_render = match self.mounted.get(&slot) {
            Some(mounted) => !mounted.widget.same_as(&widget),
            None => return false,
        };
        if !needs_render {
            return false;
        }
        let (element, requested) = self.render_widget(&widget);
        let Some(mut mounted) = self.mounted.remove(&slot) else {
            return false;
        };
        mounted.widget = widget;
        mounted.element = element;
        mounted.token = None;
        mounted.request = None;
        self.issue_renders(&mut mounted, requested);
        self.mounted.insert(slot, mounted);
        true
    }

    /// Unmount. Late render results for the slot become no-ops.
    pub fn destroy(&mut self, slot: SlotId) -> bool {
        self.pending.retain(|pending| pending.slot != slot);
        self.mounted.remove(&slot).is_some()
    }

    /// Line the mounted widgets up with the widgets of a fresh decoration set:
    /// equal widgets keep their slot, the rest are mounted, leftovers destroyed.
    pub fn reconcile(&mut self, set: &DecorationSet) -> Vec<(DocRange, SlotId)> {
        let mut unclaimed: Vec<SlotId> = self.mounted.keys().copied().collect();
        let mut placed = Vec::new();

        for (decoration, widget) in set.widgets() {
            let reused = unclaimed.iter().position(|slot| {
                self.mounted
                    .get(slot)
                    .is_some_and(|mounted| mounted.widget.same_as(widget))
            });
            let slot = match reused {
                Some(index) => unclaimed.remove(index),
                None => self.mount(widget.clone()),
            };
            placed.push((decoration.range(), slot));
        }

        for slot in unclaimed {
            self.destroy(slot);
        }
        placed
    }

    /// Apply an asynchronous diagram result. Ignored unless `slot` is still
    /// mounted and `token` is the latest render issued for it.
    pub fn complete_render(
        &mut self,
        slot: SlotId,
        token: u64,
        result: Result<String, RenderError>,
    ) -> bool {
        let Some(mounted) = self.mounted.get_mut(&slot) else {
            log::debug!("Dropping render {token} for unmounted slot {}", slot.0);
            return false;
        };
        if mounted.token != Some(token) {
            log::debug!("Dropping stale render {token} for slot {}", slot.0);
            return false;
        }
        let Some(request) = mounted.request.take() else {
            return false;
        };
        mounted.token = None;

        let panel = match result {
            Ok(svg) => {
                self.diagram_cache.put(request.cache_key(), svg.clone());
                diagram::panel().raw(svg)
            }
            Err(err) => {
                log::warn!("Diagram render failed, showing source: {err}");
                diagram::panel().raw(fallback_code_html(&request.code))
            }
        };
        mounted.element = diagram::wrapper(panel);
        self.measure_requested = true;
        true
    }

    pub fn drain_pending(&mut self) -> Vec<PendingRender> {
        std::mem::take(&mut self.pending)
    }

    /// Run every pending render through `renderer`. Returns how many applied.
    pub fn resolve_pending(&mut self, renderer: &dyn DiagramRenderer) -> usize {
        self.drain_pending()
            .into_iter()
            .filter(|pending| {
                let result = renderer.render_diagram(&pending.request);
                self.complete_render(pending.slot, pending.token, result)
            })
            .count()
    }

    /// Hosts call this when an image finishes loading or fails.
    pub fn request_measure(&mut self) {
        self.measure_requested = true;
    }

    /// Whether the host view should re-measure. Clears the flag.
    pub fn take_measure_request(&mut self) -> bool {
        std::mem::take(&mut self.measure_requested)
    }

    pub fn math_cache(&self) -> &RenderCache {
        &self.math_cache
    }

    pub fn diagram_cache(&self) -> &RenderCache {
        &self.diagram_cache
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn dispose(&mut self) {
        self.mounted.clear();
        self.pending.clear();
        self.math_cache.clear();
        self.diagram_cache.clear();
        self.measure_requested = false;
        self.disposed = true;
    }

    fn render_widget(&mut self, widget: &Widget) -> (Element, Vec<DiagramRequest>) {
        let mut services = WidgetServices {
            math_renderer: self.math_renderer.as_ref(),
            math_cache: &mut self.math_cache,
            image_resolver: self.image_resolver.as_ref(),
            document_path: self.document_path.as_deref(),
            diagram_cache: &mut self.diagram_cache,
            theme: self.theme,
            requested: Vec::new(),
        };
        let element = widget.render(&mut services);
        (element, services.requested)
    }

    fn issue_renders(&mut self, mounted: &mut MountedWidget, requested: Vec<DiagramRequest>) {
        for request in requested {
            let token = self.next_token;
            self.next_token += 1;
            mounted.token = Some(token);
            mounted.request = Some(request.clone());
            self.pending.push(PendingRender {
                slot: mounted.slot,
                token,
                request,
            });
        }
    }
}
