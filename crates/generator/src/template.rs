use docpress_core::layout::{APP_HTML_MARKER, BODY_START_TAG, HEAD_MARKER, HTML_START_TAG};

/// Named insertion points of the page template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Replaces the head marker
    Head,
    /// Replaces the app-root marker
    AppHtml,
    /// Attributes appended to the opening `<html` tag
    HtmlAttributes,
    /// Attributes appended to the opening `<body` tag
    BodyAttributes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Text(String),
    Slot(Slot),
}

/// Page template split once into literal text and slots.
///
/// Rendering concatenates the literal parts with whatever the fill callback
/// returns for each slot. Substituted text is never scanned again, so
/// markers or `$`-patterns inside rendered content stay as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlTemplate {
    parts: Vec<Part>,
}

impl HtmlTemplate {
    /// Locate the first occurrence of each marker in `source`
    pub fn parse(source: &str) -> Self {
        // (offset, bytes consumed, slot); tag slots keep the tag text itself
        let mut found: Vec<(usize, usize, Slot)> = Vec::new();

        if let Some(i) = source.find(HEAD_MARKER) {
            found.push((i, HEAD_MARKER.len(), Slot::Head));
        }
        if let Some(i) = source.find(APP_HTML_MARKER) {
            found.push((i, APP_HTML_MARKER.len(), Slot::AppHtml));
        }
        if let Some(i) = source.find(HTML_START_TAG) {
            found.push((i + HTML_START_TAG.len(), 0, Slot::HtmlAttributes));
        }
        if let Some(i) = source.find(BODY_START_TAG) {
            found.push((i + BODY_START_TAG.len(), 0, Slot::BodyAttributes));
        }
        found.sort_by_key(|(offset, _, _)| *offset);

        let mut parts = Vec::new();
        let mut cursor = 0;
        for (offset, len, slot) in found {
            // A marker nested inside another one is ignored
            if offset < cursor {
                continue;
            }
            if offset > cursor {
                parts.push(Part::Text(source[cursor..offset].to_string()));
            }
            parts.push(Part::Slot(slot));
            cursor = offset + len;
        }
        if cursor < source.len() {
            parts.push(Part::Text(source[cursor..].to_string()));
        }

        Self { parts }
    }

    pub fn has_slot(&self, slot: Slot) -> bool {
        self.parts.contains(&Part::Slot(slot))
    }

    /// Render the template, asking `fill` for each slot's content.
    ///
    /// Attribute slots are separated from the tag name by a space when
    /// non-empty and leave the tag untouched otherwise.
    pub fn render(&self, fill: impl Fn(Slot) -> String) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Text(text) => out.push_str(text),
                Part::Slot(slot @ (Slot::HtmlAttributes | Slot::BodyAttributes)) => {
                    let attrs = fill(*slot);
                    let attrs = attrs.trim();
                    if !attrs.is_empty() {
                        out.push(' ');
                        out.push_str(attrs);
                    }
                }
                Part::Slot(slot) => out.push_str(&fill(*slot)),
            }
        }
        out
    }
}
