/// Minimal view tree produced by route content and rendered to HTML on the
/// server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Node {
    /// Renders nothing; used as the no-match placeholder
    #[default]
    Empty,
    /// Text content, escaped on output
    Text(String),
    /// Trusted markup emitted verbatim
    Raw(String),
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<Node>,
    },
    /// Suspense boundary around lazily-loaded content
    Suspense {
        fallback: Box<Node>,
        children: Box<Node>,
    },
}

impl Node {
    pub fn element(
        tag: impl Into<String>,
        attrs: Vec<(String, String)>,
        children: Vec<Node>,
    ) -> Self {
        Node::Element {
            tag: tag.into(),
            attrs,
            children,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Node::Empty)
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Empty => {}
            Node::Text(text) => out.push_str(&escape_html(text)),
            Node::Raw(html) => out.push_str(html),
            Node::Element {
                tag,
                attrs,
                children,
            } => {
                out.push('<');
                out.push_str(tag);
                for (key, value) in attrs {
                    out.push(' ');
                    out.push_str(key);
                    out.push_str("=\"");
                    out.push_str(&escape_html(value));
                    out.push('"');
                }
                out.push('>');
                for child in children {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
            // Boundary comments let the client hydrate the suspended subtree
            Node::Suspense { children, .. } => {
                out.push_str("<!--$-->");
                children.write_html(out);
                out.push_str("<!--/$-->");
            }
        }
    }
}

/// HTML-escape a string
///
/// Escapes: & < > " '
pub fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
