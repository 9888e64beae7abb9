use crate::{
    document::DocumentDb,
    file::{FileTypeInfo, FileValidator},
};
use std::sync::Arc;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct Documents {
    pub db: DocumentDb,

    pub validator: Arc<FileValidator>,

    pub file_types: FileTypeInfo,
}

impl Documents {
    pub fn new(db: DocumentDb, validator: FileValidator, file_types: FileTypeInfo) -> Self {
        Self {
            db,
            validator: Arc::new(validator),
            file_types,
        }
    }
}
