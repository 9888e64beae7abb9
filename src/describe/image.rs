use super::{DescriptionGenerator, GeneratorError};
use crate::document::models::DocumentType;
use ::image::ImageReader;
use std::io::Cursor;

/// Describes images by their dimensions and container format. Only the header
/// is decoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageDescription;

impl DescriptionGenerator for ImageDescription {
    fn document_type(&self) -> DocumentType {
        DocumentType::Image
    }

    fn generate(&self, content: &[u8]) -> Result<String, GeneratorError> {
        let reader = ImageReader::new(Cursor::new(content)).with_guessed_format()?;

        let Some(format) = reader.format() else {
            return Err(GeneratorError::Format("unrecognised image format".to_string()));
        };

        let (width, height) = reader.into_dimensions()?;

        Ok(format!("A {height}x{width} {format:?} image"))
    }
}
