use super::{DescriptionGenerator, GeneratorError};
use crate::document::models::DocumentType;

const BYTES_PER_KB: usize = 1024;

/// Describes PDFs by size alone; the content is never parsed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfDescription;

impl DescriptionGenerator for PdfDescription {
    fn document_type(&self) -> DocumentType {
        DocumentType::Pdf
    }

    fn generate(&self, content: &[u8]) -> Result<String, GeneratorError> {
        let kb = content.len() / BYTES_PER_KB;
        Ok(format!("This is a PDF File ({}kb)", group_thousands(kb)))
    }
}

fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_pdf() {
        assert_eq!(
            "This is a PDF File (0kb)",
            PdfDescription.describe(&[0u8; 1023]).unwrap()
        );
        assert_eq!(
            "This is a PDF File (2kb)",
            PdfDescription.describe(&[0u8; 2048 + 10]).unwrap()
        );
    }

    #[test]
    fn large_pdf_is_grouped() {
        let content = vec![0u8; 1234 * 1024];
        assert_eq!(
            "This is a PDF File (1,234kb)",
            PdfDescription.describe(&content).unwrap()
        );
    }

    #[test]
    fn grouping() {
        assert_eq!("0", group_thousands(0));
        assert_eq!("999", group_thousands(999));
        assert_eq!("1,000", group_thousands(1000));
        assert_eq!("12,345,678", group_thousands(12_345_678));
    }
}
