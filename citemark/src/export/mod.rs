pub mod clipboard;
pub mod csv;

pub use clipboard::{Clipboard, ClipboardError, CopyAction, MemoryClipboard, WriterClipboard};
pub use csv::{escape_csv_cell, strip_citation_decoration, table_to_csv};
