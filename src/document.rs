pub mod db;
pub mod models;

pub use db::{DocumentDb, CONFLICT};
pub use models::{Document, DocumentPage, DocumentType, NewDocument, SearchParameters};
