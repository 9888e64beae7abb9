use super::DOCUMENTS_PATH;
use crate::{
    document::{Document, DocumentType, NewDocument, SearchParameters, CONFLICT},
    error::DocuploadError,
    pagination::PageLinks,
    state::Documents,
};
use axum::{
    extract::{Host, Multipart, OriginalUri, Path, Query, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use axum_macros::debug_handler;
use serde::Deserialize;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{info, warn};
use url::Url;

pub const MAX_PAGE_SIZE: i32 = 50;
pub const DEFAULT_PAGE_SIZE: i32 = 10;

const TITLE_MAX: usize = 512;
const OWNER_MAX: usize = 512;
const DESCRIPTION_MAX: usize = 1024;

pub(super) fn documents_router(state: Documents) -> Router {
    Router::new()
        .route("/", get(list).post(upload))
        .route("/:id", get(document).delete(delete))
        .route("/:id/download", get(download))
        .with_state(state)
}

/// Cancelled when the handler future is dropped, i.e. when the client goes away.
fn request_token() -> (CancellationToken, DropGuard) {
    let token = CancellationToken::new();
    let guard = token.clone().drop_guard();
    (token, guard)
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<i32>,
    pub page_size: Option<i32>,
    /// Comma separated type names
    pub types: Option<String>,
}

impl ListQuery {
    /// Resolve defaults and bounds for the requested page.
    pub fn search(&self) -> Result<SearchParameters, DocuploadError> {
        let page = self.page.unwrap_or(1);
        if page < 1 {
            return Err(DocuploadError::Validation(
                "page must be at least 1".to_string(),
            ));
        }

        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size < 1 {
            return Err(DocuploadError::Validation(
                "page_size must be at least 1".to_string(),
            ));
        }

        let document_types = self
            .types
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .filter(|ty| !ty.trim().is_empty())
            .map(str::parse::<DocumentType>)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SearchParameters {
            page: Some(page),
            page_size: Some(page_size.min(MAX_PAGE_SIZE)),
            document_types,
        })
    }
}

async fn list(
    state: State<Documents>,
    Host(host): Host,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<ListQuery>,
) -> Result<Response, DocuploadError> {
    info!("Listing documents");
    let (cancel, _guard) = request_token();

    let search = query.search()?;
    let page = state.db.list_documents(&search, &cancel).await?;

    let base = Url::parse(&format!("http://{host}{uri}"))?;
    let links = PageLinks::build(
        &base,
        i64::from(search.page.unwrap_or(1)),
        i64::from(search.page_size.unwrap_or(DEFAULT_PAGE_SIZE)),
        page.total,
    )?;

    info!("Returning {}/{} documents", page.returned(), page.total);

    Ok((
        [
            (header::LINK, links.to_link_header()),
            (
                HeaderName::from_static("x-pagination-count"),
                page.total.to_string(),
            ),
        ],
        Json(page.documents),
    )
        .into_response())
}

async fn document(
    state: State<Documents>,
    Path(id): Path<i64>,
) -> Result<Json<Document>, DocuploadError> {
    info!("Loading document {id}");
    let (cancel, _guard) = request_token();

    let Some(document) = state.db.get_by_id(id, &cancel).await? else {
        warn!("Document {id} was not found");
        return Err(DocuploadError::NotFound(format!("Document {id} was not found")));
    };

    Ok(Json(document))
}

async fn download(
    state: State<Documents>,
    Path(id): Path<i64>,
) -> Result<Response, DocuploadError> {
    info!("Downloading document {id}");
    let (cancel, _guard) = request_token();

    let Some(document) = state.db.get_by_id(id, &cancel).await? else {
        warn!("Document {id} was not found");
        return Err(DocuploadError::NotFound(format!("Document {id} was not found")));
    };

    let content = state
        .db
        .get_content(id, &cancel)
        .await?
        .filter(|content| !content.is_empty());

    let Some(content) = content else {
        warn!("Content of document {id} was not found");
        return Err(DocuploadError::NotFound(format!(
            "Document {id} was not found or has been deleted"
        )));
    };

    let mime = state.file_types.mime_type(&document.file_name)?;

    info!(
        "Found document {id} ({}, {})",
        document.file_name, document.document_type
    );

    Ok((
        [
            (header::CONTENT_TYPE, mime),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(&document.file_name),
            ),
        ],
        content,
    )
        .into_response())
}

async fn delete(
    state: State<Documents>,
    Path(id): Path<i64>,
) -> Result<StatusCode, DocuploadError> {
    info!("Deleting document {id}");
    let (cancel, _guard) = request_token();

    if !state.db.delete(id, &cancel).await? {
        warn!("Document {id} was not found");
        return Err(DocuploadError::NotFound(format!("Document {id} was not found")));
    }

    info!("Document {id} deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Form fields accompanying an uploaded file.
#[derive(Debug, Default)]
pub struct AddDocumentRequest {
    pub title: String,
    pub owner: String,
    pub description: Option<String>,
}

impl AddDocumentRequest {
    pub fn validate(&self) -> Result<(), DocuploadError> {
        if self.title.trim().is_empty() {
            return Err(DocuploadError::Validation("Title is required".to_string()));
        }

        if self.title.chars().count() > TITLE_MAX {
            return Err(DocuploadError::Validation(format!(
                "Title must be at most {TITLE_MAX} characters"
            )));
        }

        if self.owner.trim().is_empty() {
            return Err(DocuploadError::Validation("Owner is required".to_string()));
        }

        if self.owner.chars().count() > OWNER_MAX {
            return Err(DocuploadError::Validation(format!(
                "Owner must be at most {OWNER_MAX} characters"
            )));
        }

        if !is_email(&self.owner) {
            return Err(DocuploadError::Validation(
                "Owner must be an email address".to_string(),
            ));
        }

        if self
            .description
            .as_ref()
            .is_some_and(|d| d.chars().count() > DESCRIPTION_MAX)
        {
            return Err(DocuploadError::Validation(format!(
                "Description must be at most {DESCRIPTION_MAX} characters"
            )));
        }

        Ok(())
    }
}

/// A single `@` with something on both sides.
fn is_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

#[debug_handler]
async fn upload(
    state: State<Documents>,
    mut multipart: Multipart,
) -> Result<Response, DocuploadError> {
    let (cancel, _guard) = request_token();

    let mut request = AddDocumentRequest::default();
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                file = Some((file_name, bytes.to_vec()));
            }
            "title" => request.title = field.text().await?,
            "owner" => request.owner = field.text().await?,
            "description" => request.description = Some(field.text().await?),
            _ => {}
        }
    }

    let Some((file_name, content)) = file else {
        return Err(DocuploadError::Validation("A file is required".to_string()));
    };

    info!("Uploading {file_name}");

    request.validate()?;

    if let Err(message) = state.validator.validate(&file_name, &content) {
        warn!("Uploaded file {file_name} is not valid: {message}");
        return Err(DocuploadError::Validation(message));
    }

    let details = NewDocument {
        document_type: state.file_types.document_type(&file_name)?,
        file_name,
        title: request.title,
        description: request.description.unwrap_or_default(),
        file_size: content.len() as i64,
        owner: request.owner,
    };

    let id = state.db.insert(details.clone(), &content, &cancel).await?;

    if id == CONFLICT {
        warn!(
            "Unable to upload {} ({}), the title is taken",
            details.file_name, details.title
        );
        return Err(DocuploadError::Conflict(
            "A document with this title already exists".to_string(),
        ));
    }

    info!("Uploaded {} as {id} ({})", details.file_name, details.title);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("{DOCUMENTS_PATH}/{id}"))],
        Json(id),
    )
        .into_response())
}

/// Control characters are dropped, they are not allowed in header values.
fn content_disposition(file_name: &str) -> String {
    let mut escaped = String::with_capacity(file_name.len());
    for c in file_name.chars().filter(|c| !c.is_control()) {
        if c == '\\' || c == '"' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    format!("attachment; filename=\"{escaped}\"")
}
