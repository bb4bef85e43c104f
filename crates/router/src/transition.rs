use crate::node::Node;
use docpress_core::RenderMode;
use std::sync::Arc;

/// Wraps freshly resolved content in an animated transition container
pub trait TransitionWrapper: Send + Sync {
    fn wrap(&self, content: Node) -> Node;
}

/// Default wrapper: a container named for the browser View Transitions API
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewTransition;

impl TransitionWrapper for ViewTransition {
    fn wrap(&self, content: Node) -> Node {
        Node::element(
            "div",
            vec![
                ("class".to_string(), "docpress-doc-transition".to_string()),
                (
                    "style".to_string(),
                    "view-transition-name: docpress-content".to_string(),
                ),
            ],
            vec![content],
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionOptions {
    pub enable_content_animation: bool,
    pub render_mode: RenderMode,
    /// Rendering on the server rather than in the browser
    pub server: bool,
}

impl TransitionOptions {
    /// Legacy mode cannot emit suspense boundaries during a server render
    pub fn supports_suspense(&self) -> bool {
        !(self.render_mode == RenderMode::Legacy && self.server)
    }
}

/// Renders route content inside an optional transition and a suspense
/// boundary, memoized on the identity of the content handle.
///
/// Passing the same `Arc` again returns the previous node without calling
/// the view or the wrapper, so unrelated parent re-renders never restart a
/// transition.
pub struct TransitionContent<C> {
    options: TransitionOptions,
    wrapper: Box<dyn TransitionWrapper>,
    last: Option<(Arc<C>, Node)>,
}

impl<C> TransitionContent<C> {
    pub fn new(options: TransitionOptions) -> Self {
        Self::with_wrapper(options, ViewTransition)
    }

    pub fn with_wrapper(
        options: TransitionOptions,
        wrapper: impl TransitionWrapper + 'static,
    ) -> Self {
        Self {
            options,
            wrapper: Box::new(wrapper),
            last: None,
        }
    }

    pub fn options(&self) -> TransitionOptions {
        self.options
    }

    /// Render `content`; `None` renders the empty placeholder
    pub fn render(&mut self, content: Option<Arc<C>>, view: impl FnOnce(&C) -> Node) -> Node {
        let Some(content) = content else {
            self.last = None;
            return Node::Empty;
        };

        if let Some((previous, node)) = &self.last
            && Arc::ptr_eq(previous, &content)
        {
            return node.clone();
        }

        let mut node = view(&content);
        if self.options.enable_content_animation {
            node = self.wrapper.wrap(node);
        }
        if self.options.supports_suspense() {
            node = Node::Suspense {
                fallback: Box::new(Node::Empty),
                children: Box::new(node),
            };
        }

        self.last = Some((content, node.clone()));
        node
    }
}
