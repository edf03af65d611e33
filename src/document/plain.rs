use std::path::Path;

use super::{read_text, Document, DocumentAdapter, DocumentFormat, Segment};
use crate::errors::DocumentError;

/// Adapter for plain text: the whole file is one untimed segment
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextAdapter;

impl DocumentAdapter for PlainTextAdapter {
    fn parse(&self, path: &Path) -> Result<Document, DocumentError> {
        let content = read_text(path)?;
        let text = content.trim_end().to_string();
        Ok(Document::new(path, DocumentFormat::PlainText, vec![Segment::untimed(1, text)]))
    }
}
