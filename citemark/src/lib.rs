pub mod citation;
pub mod config;
pub mod document;
pub mod export;
pub mod lint;
pub mod matrix;
pub mod parser;
pub mod render;
pub mod tooltip;

pub use citation::{Citation, CitationTable};
pub use config::RenderConfig;
pub use render::{RenderTree, Renderer};

/// Parse and render `content` against `citations` in one call.
///
/// Rendering is pure: the same text and table always produce an equal tree.
pub fn render(content: &str, citations: &CitationTable) -> RenderTree {
    Renderer::new(citations).render(content)
}
