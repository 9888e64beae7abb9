use super::{DescriptionGenerator, GeneratorError, DEFAULT_TEXT_LENGTH};
use crate::document::models::DocumentType;

const EMPTY: &str = "Empty Text File";

/// Describes text files by their first non-blank line.
#[derive(Debug, Clone)]
pub struct TextDescription {
    /// Maximum amount of characters taken from the leading line
    length: usize,
}

impl TextDescription {
    pub fn new(length: usize) -> Self {
        Self {
            length: if length == 0 {
                DEFAULT_TEXT_LENGTH
            } else {
                length
            },
        }
    }
}

impl Default for TextDescription {
    fn default() -> Self {
        Self::new(DEFAULT_TEXT_LENGTH)
    }
}

impl DescriptionGenerator for TextDescription {
    fn document_type(&self) -> DocumentType {
        DocumentType::Text
    }

    fn generate(&self, content: &[u8]) -> Result<String, GeneratorError> {
        Ok(match leading_text(content, self.length) {
            Some(text) => format!("Text file beginning with '{text}'"),
            None => EMPTY.to_string(),
        })
    }
}

/// Scan `content` line by line and return the first non-blank line, trimmed
/// and cut to `max` characters.
///
/// Line breaks are single byte ASCII so splitting on them never cuts a
/// multi-byte sequence. A line is decoded lazily and only up to `max`
/// characters past its leading whitespace.
pub fn leading_text(content: &[u8], max: usize) -> Option<String> {
    for line in content.split(|b| *b == b'\r' || *b == b'\n') {
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let mut chars = lossy_chars(line)
            .skip_while(|c| c.is_whitespace())
            .peekable();

        if chars.peek().is_none() {
            continue;
        }

        let text = chars.take(max).collect::<String>();
        return Some(text.trim_end().to_string());
    }

    None
}

/// Characters of `bytes`, with each invalid sequence replaced by U+FFFD.
fn lossy_chars(bytes: &[u8]) -> impl Iterator<Item = char> + '_ {
    bytes.utf8_chunks().flat_map(|chunk| {
        let invalid = (!chunk.invalid().is_empty()).then_some(char::REPLACEMENT_CHARACTER);
        chunk.valid().chars().chain(invalid)
    })
}
