// Static page generation: server rendering with client-rendering fallback

pub mod head;
pub mod output;
pub mod pages;
pub mod renderer;
pub mod search;
pub mod template;

pub use pages::{PageRenderer, RenderReport};
pub use renderer::{SsrRenderer, load_renderer};
pub use search::{JsonSearchIndex, SearchIndexWriter};
pub use template::{HtmlTemplate, Slot};
