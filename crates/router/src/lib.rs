//! Client-side route resolution and transition-aware content rendering.

pub mod matcher;
pub mod node;
pub mod transition;

pub use matcher::{RouteEntry, RouteMatch, RouteMatcher};
pub use node::Node;
pub use transition::{TransitionContent, TransitionOptions, TransitionWrapper, ViewTransition};
