pub mod cleaner;
pub mod parser;
pub mod pipeline;
pub mod splitter;

pub use cleaner::clean;
pub use parser::{extract_pages, source_id_from_name};
pub use pipeline::{IngestionReport, Ingestor};
pub use splitter::Splitter;
