use super::Element;

pub const BULLET_GLYPH: &str = "\u{2022}";

pub fn render() -> Element {
    Element::new("span")
        .class("cm-bullet-widget")
        .style("opacity: 0.5; font-size: 1.2em; margin-right: 4px;")
        .text(BULLET_GLYPH)
}
