use crate::{document::models::DocumentType, error::DocuploadError};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

mod image;
mod pdf;
mod text;
mod unknown;

pub use self::image::ImageDescription;
pub use pdf::PdfDescription;
pub use text::TextDescription;
pub use unknown::UnknownDescription;

/// Default amount of characters taken from the first line of a text file
pub const DEFAULT_TEXT_LENGTH: usize = 20;

/// Produces a short human readable description from the raw bytes of a file.
pub trait DescriptionGenerator: Send + Sync {
    fn document_type(&self) -> DocumentType;

    /// Type specific description. Errors never leave [DescriptionGenerator::describe].
    fn generate(&self, content: &[u8]) -> Result<String, GeneratorError>;

    /// Describe non-empty `content`. Failures in [DescriptionGenerator::generate]
    /// degrade to a generic description containing the type and size.
    fn describe(&self, content: &[u8]) -> Result<String, DocuploadError> {
        if content.is_empty() {
            return Err(DocuploadError::InvalidArgument(
                "File must contain data".to_string(),
            ));
        }

        match self.generate(content) {
            Ok(description) => Ok(description),
            Err(e) => {
                debug!("Falling back to generic description: {e}");
                Ok(fallback(self.document_type(), content.len()))
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("image: {0}")]
    Image(#[from] ::image::ImageError),

    #[error("io: {0}")]
    IO(#[from] std::io::Error),

    #[error("{0}")]
    Format(String),
}

fn fallback(document_type: DocumentType, len: usize) -> String {
    format!("{} file with size {len} bytes", document_type.name())
}

/// Fixed mapping of document types to their generators, built once at startup.
pub struct DescriptionGenerators {
    generators: HashMap<DocumentType, Box<dyn DescriptionGenerator>>,
    unknown: UnknownDescription,
}

impl DescriptionGenerators {
    pub fn new(text_length: usize) -> Self {
        let mut generators: HashMap<DocumentType, Box<dyn DescriptionGenerator>> =
            HashMap::with_capacity(3);

        generators.insert(DocumentType::Text, Box::new(TextDescription::new(text_length)));
        generators.insert(DocumentType::Image, Box::new(ImageDescription));
        generators.insert(DocumentType::Pdf, Box::new(PdfDescription));

        Self {
            generators,
            unknown: UnknownDescription,
        }
    }

    /// Never fails; unmapped types get the no-op generator.
    pub fn get(&self, document_type: DocumentType) -> &dyn DescriptionGenerator {
        self.generators
            .get(&document_type)
            .map(|generator| generator.as_ref())
            .unwrap_or(&self.unknown)
    }
}

impl Default for DescriptionGenerators {
    fn default() -> Self {
        Self::new(DEFAULT_TEXT_LENGTH)
    }
}

impl std::fmt::Debug for DescriptionGenerators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptionGenerators")
            .field("types", &self.generators.keys().collect::<Vec<_>>())
            .finish()
    }
}
