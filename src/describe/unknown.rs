use super::{DescriptionGenerator, GeneratorError};
use crate::{document::models::DocumentType, error::DocuploadError};

/// No-op generator for types without a dedicated one.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownDescription;

impl DescriptionGenerator for UnknownDescription {
    fn document_type(&self) -> DocumentType {
        DocumentType::Unknown
    }

    fn generate(&self, _: &[u8]) -> Result<String, GeneratorError> {
        Ok(String::new())
    }

    fn describe(&self, _: &[u8]) -> Result<String, DocuploadError> {
        Ok(String::new())
    }
}
