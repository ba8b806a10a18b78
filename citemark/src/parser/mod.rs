pub mod inline;
pub mod segment;

pub use inline::{scan, scan_spanned};
pub use segment::{segment, split_cells};

use crate::document::Document;

/// Parser entry point.
pub struct Parser<'a> {
    source: &'a str,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Parser { source }
    }

    /// Segment the source into blocks. The dialect has no parse failures:
    /// anything unrecognised becomes a paragraph or plain text.
    pub fn parse(&self) -> Document {
        Document {
            blocks: segment::segment(self.source),
        }
    }
}
