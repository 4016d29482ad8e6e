pub mod processor;

pub use processor::{
    combine_pages, extract_pages, extract_pages_from_mem, has_text, ExtractedPage,
    ExtractionError, PageMetadata,
};
