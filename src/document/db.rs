use super::models::{Document, DocumentPage, NewDocument, SearchParameters};
use crate::{describe::DescriptionGenerators, error::DocuploadError};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Row};
use std::{future::Future, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Returned by [DocumentDb::insert] when the title is already taken.
pub const CONFLICT: i64 = 0;

const DOCUMENT_COLUMNS: &str =
    "id, file_name, title, description, file_size, create_date, owner, document_type";

#[derive(Debug, Clone)]
pub struct DocumentDb {
    pool: PgPool,
    generators: Arc<DescriptionGenerators>,
}

impl DocumentDb {
    pub fn new(pool: PgPool, generators: Arc<DescriptionGenerators>) -> Self {
        Self { pool, generators }
    }

    /// List documents matching `search`. The total is the count of all matching
    /// documents, independent of the requested page.
    pub async fn list_documents(
        &self,
        search: &SearchParameters,
        cancel: &CancellationToken,
    ) -> Result<DocumentPage, DocuploadError> {
        let clauses = SearchClauses::from(search);
        let mut query = list_query(&clauses);

        let rows = cancellable(cancel, async {
            query
                .build()
                .fetch_all(&self.pool)
                .await
                .map_err(DocuploadError::from)
        })
        .await?;

        // The count is joined onto every row, and onto a single empty row when
        // the page has no documents.
        let total = match rows.first() {
            Some(row) => row.try_get::<i64, _>("total")?,
            None => 0,
        };

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows.iter() {
            if row.try_get::<Option<i64>, _>("id")?.is_some() {
                documents.push(Document::from_row(row)?);
            }
        }

        debug!("Listed {}/{total} documents", documents.len());

        Ok(DocumentPage { total, documents })
    }

    pub async fn get_by_id(
        &self,
        id: i64,
        cancel: &CancellationToken,
    ) -> Result<Option<Document>, DocuploadError> {
        let query = format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1");

        cancellable(cancel, async {
            sqlx::query_as::<_, Document>(&query)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(DocuploadError::from)
        })
        .await
    }

    /// Load only the stored bytes of a document.
    pub async fn get_content(
        &self,
        id: i64,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<u8>>, DocuploadError> {
        cancellable(cancel, async {
            sqlx::query_scalar::<_, Vec<u8>>(
                "SELECT content FROM document_content WHERE document_id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DocuploadError::from)
        })
        .await
    }

    /// Returns whether a document was removed. Content is removed with it.
    pub async fn delete(&self, id: i64, cancel: &CancellationToken) -> Result<bool, DocuploadError> {
        let result = cancellable(cancel, async {
            sqlx::query("DELETE FROM documents WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(DocuploadError::from)
        })
        .await?;

        debug!("Deleted {} document(s) with id {id}", result.rows_affected());

        Ok(result.rows_affected() != 0)
    }

    /// Store a document and its content atomically and return the new id, or
    /// [CONFLICT] if a document with the same title exists.
    ///
    /// A blank description is generated from the content before anything is
    /// written.
    pub async fn insert(
        &self,
        mut details: NewDocument,
        content: &[u8],
        cancel: &CancellationToken,
    ) -> Result<i64, DocuploadError> {
        if details.description.trim().is_empty() {
            details.description = self
                .generators
                .get(details.document_type)
                .describe(content)?;
        }

        cancellable(cancel, self.insert_tx(&details, content)).await
    }

    async fn insert_tx(&self, details: &NewDocument, content: &[u8]) -> Result<i64, DocuploadError> {
        let NewDocument {
            file_name,
            title,
            description,
            file_size,
            owner,
            document_type,
        } = details;

        // Dropping the transaction before commit rolls it back, which covers
        // early returns, errors and cancellation alike.
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_scalar::<_, i64>(
            "INSERT INTO documents(file_name, title, description, file_size, owner, document_type)
             VALUES($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(file_name)
        .bind(title)
        .bind(description)
        .bind(file_size)
        .bind(owner)
        .bind(i16::from(*document_type))
        .fetch_one(&mut *tx)
        .await;

        let id = match inserted {
            Ok(id) => id,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                debug!("Title '{title}' already in use");
                tx.rollback().await?;
                return Ok(CONFLICT);
            }
            Err(e) => return Err(e.into()),
        };

        if id <= 0 {
            tx.rollback().await?;
            return Ok(CONFLICT);
        }

        sqlx::query("INSERT INTO document_content(document_id, content) VALUES($1, $2)")
            .bind(id)
            .bind(content)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!("Inserted document {id} ({file_name})");

        Ok(id)
    }
}

/// Filter and paging derived from [SearchParameters], ready to be bound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchClauses {
    pub document_types: Vec<i16>,
    pub paging: Option<Paging>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub limit: i64,
    pub offset: i64,
}

impl From<&SearchParameters> for SearchClauses {
    fn from(search: &SearchParameters) -> Self {
        let mut document_types: Vec<i16> = Vec::with_capacity(search.document_types.len());
        for ty in search.document_types.iter() {
            let ty = i16::from(*ty);
            if !document_types.contains(&ty) {
                document_types.push(ty);
            }
        }

        let paging = (search.page.is_some() || search.page_size.is_some()).then(|| {
            let limit = i64::from(search.page_size.unwrap_or_default().max(1));
            let page = i64::from(search.page.unwrap_or_default().max(1));
            Paging {
                limit,
                offset: (page - 1) * limit,
            }
        });

        Self {
            document_types,
            paging,
        }
    }
}

/// A single statement yielding the filtered count with the requested page
/// laterally joined onto it.
fn list_query(clauses: &SearchClauses) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(
        "SELECT matched.total, page.* FROM (SELECT COUNT(*) AS total FROM documents",
    );
    push_filter(&mut builder, &clauses.document_types);

    builder.push(") matched LEFT JOIN LATERAL (SELECT ");
    builder.push(DOCUMENT_COLUMNS);
    builder.push(" FROM documents");
    push_filter(&mut builder, &clauses.document_types);
    builder.push(" ORDER BY id");

    if let Some(Paging { limit, offset }) = clauses.paging {
        builder.push(" LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);
    }

    builder.push(") page ON TRUE ORDER BY page.id");
    builder
}

fn push_filter(builder: &mut QueryBuilder<'static, Postgres>, document_types: &[i16]) {
    if document_types.is_empty() {
        return;
    }
    builder.push(" WHERE document_type = ANY(");
    builder.push_bind(document_types.to_vec());
    builder.push(")");
}

async fn cancellable<T, F>(cancel: &CancellationToken, task: F) -> Result<T, DocuploadError>
where
    F: Future<Output = Result<T, DocuploadError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DocuploadError::Cancelled),
        result = task => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::models::DocumentType;

    fn search(page: Option<i32>, page_size: Option<i32>) -> SearchParameters {
        SearchParameters {
            page,
            page_size,
            ..Default::default()
        }
    }

    #[test]
    fn no_parameters_no_clauses() {
        let clauses = SearchClauses::from(&SearchParameters::default());
        assert_eq!(SearchClauses::default(), clauses);

        let builder = list_query(&clauses);
        let sql = builder.sql();
        assert!(!sql.contains("WHERE"));
        assert!(!sql.contains("LIMIT"));
        assert!(sql.contains("ORDER BY id"));
    }

    #[test]
    fn paging_offsets() {
        let clauses = SearchClauses::from(&search(Some(3), Some(10)));
        assert_eq!(
            Some(Paging {
                limit: 10,
                offset: 20
            }),
            clauses.paging
        );
    }

    #[test]
    fn paging_clamps_to_first_page_and_single_row() {
        let clauses = SearchClauses::from(&search(Some(0), Some(0)));
        assert_eq!(Some(Paging { limit: 1, offset: 0 }), clauses.paging);

        let clauses = SearchClauses::from(&search(Some(-4), Some(-1)));
        assert_eq!(Some(Paging { limit: 1, offset: 0 }), clauses.paging);
    }

    #[test]
    fn paging_with_only_one_value() {
        let clauses = SearchClauses::from(&search(Some(2), None));
        assert_eq!(Some(Paging { limit: 1, offset: 1 }), clauses.paging);

        let clauses = SearchClauses::from(&search(None, Some(25)));
        assert_eq!(
            Some(Paging {
                limit: 25,
                offset: 0
            }),
            clauses.paging
        );
    }

    #[test]
    fn type_filter_is_bound() {
        let clauses = SearchClauses::from(&SearchParameters {
            document_types: vec![DocumentType::Pdf, DocumentType::Text, DocumentType::Pdf],
            ..Default::default()
        });
        assert_eq!(vec![3, 1], clauses.document_types);

        let builder = list_query(&clauses);
        let sql = builder.sql();
        assert_eq!(2, sql.matches("WHERE document_type = ANY($").count());
        assert!(!sql.contains("'"));
    }

    #[test]
    fn paged_query_binds_limit_and_offset() {
        let clauses = SearchClauses::from(&SearchParameters {
            page: Some(2),
            page_size: Some(5),
            document_types: vec![DocumentType::Image],
        });
        let builder = list_query(&clauses);
        let sql = builder.sql();
        assert!(sql.contains("LIMIT $3 OFFSET $4"));
        assert!(sql.ends_with("ORDER BY page.id"));
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = cancellable(&cancel, std::future::pending::<Result<(), DocuploadError>>()).await;
        assert!(matches!(result, Err(DocuploadError::Cancelled)));
    }

    #[tokio::test]
    async fn uncancelled_token_passes_result() {
        let cancel = CancellationToken::new();
        let result = cancellable(&cancel, async { Ok::<_, DocuploadError>(7) }).await;
        assert_eq!(7, result.unwrap());
    }

    mod store {
        //! Require a Postgres instance reachable through `DATABASE_URL`.

        use super::*;

        fn db(pool: PgPool) -> DocumentDb {
            DocumentDb::new(pool, Arc::new(DescriptionGenerators::default()))
        }

        fn new_document(title: &str) -> NewDocument {
            NewDocument {
                file_name: format!("{title}.txt"),
                title: title.to_string(),
                description: String::new(),
                file_size: 11,
                owner: "owner@example.com".to_string(),
                document_type: DocumentType::Text,
            }
        }

        async fn count(pool: &PgPool, table: &str) -> i64 {
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
                .fetch_one(pool)
                .await
                .unwrap()
        }

        #[sqlx::test]
        #[ignore = "requires postgres"]
        async fn insert_generates_description(pool: PgPool) {
            let db = db(pool);
            let cancel = CancellationToken::new();

            let id = db
                .insert(new_document("hello"), b"Hello\nWorld", &cancel)
                .await
                .unwrap();
            assert!(id > 0);

            let document = db.get_by_id(id, &cancel).await.unwrap().unwrap();
            assert_eq!("Text file beginning with 'Hello'", document.description);
            assert_eq!(DocumentType::Text, document.document_type);

            let content = db.get_content(id, &cancel).await.unwrap().unwrap();
            assert_eq!(b"Hello\nWorld".to_vec(), content);
        }

        #[sqlx::test]
        #[ignore = "requires postgres"]
        async fn insert_keeps_supplied_description(pool: PgPool) {
            let db = db(pool);
            let cancel = CancellationToken::new();

            let mut document = new_document("described");
            document.description = "Quarterly numbers".to_string();

            let id = db.insert(document, b"data", &cancel).await.unwrap();
            let document = db.get_by_id(id, &cancel).await.unwrap().unwrap();
            assert_eq!("Quarterly numbers", document.description);
        }

        #[sqlx::test]
        #[ignore = "requires postgres"]
        async fn insert_generates_over_blank_description(pool: PgPool) {
            let db = db(pool);
            let cancel = CancellationToken::new();

            let mut document = new_document("blank");
            document.description = " \t  ".to_string();

            let id = db.insert(document, b"Minutes\nof the meeting", &cancel).await.unwrap();
            let document = db.get_by_id(id, &cancel).await.unwrap().unwrap();
            assert_eq!("Text file beginning with 'Minutes'", document.description);
        }

        #[sqlx::test]
        #[ignore = "requires postgres"]
        async fn duplicate_title_conflicts(pool: PgPool) {
            let db = db(pool.clone());
            let cancel = CancellationToken::new();

            let id = db.insert(new_document("dup"), b"one", &cancel).await.unwrap();
            assert!(id > 0);

            let again = db.insert(new_document("dup"), b"two", &cancel).await.unwrap();
            assert_eq!(CONFLICT, again);

            assert_eq!(1, count(&pool, "documents").await);
            assert_eq!(1, count(&pool, "document_content").await);
        }

        #[sqlx::test]
        #[ignore = "requires postgres"]
        async fn concurrent_duplicate_titles(pool: PgPool) {
            let db = db(pool.clone());
            let cancel = CancellationToken::new();

            let (a, b) = tokio::join!(
                db.insert(new_document("race"), b"first", &cancel),
                db.insert(new_document("race"), b"second", &cancel)
            );
            let mut ids = [a.unwrap(), b.unwrap()];
            ids.sort();

            assert_eq!(CONFLICT, ids[0]);
            assert!(ids[1] > 0);

            assert_eq!(1, count(&pool, "documents").await);
            assert_eq!(1, count(&pool, "document_content").await);
        }

        #[sqlx::test]
        #[ignore = "requires postgres"]
        async fn list_filters_and_pages(pool: PgPool) {
            let db = db(pool);
            let cancel = CancellationToken::new();

            for i in 0..5 {
                db.insert(new_document(&format!("text-{i}")), b"text", &cancel)
                    .await
                    .unwrap();
            }
            let mut pdf = new_document("report");
            pdf.file_name = "report.pdf".to_string();
            pdf.document_type = DocumentType::Pdf;
            db.insert(pdf, b"%PDF-1.4", &cancel).await.unwrap();

            let all = db
                .list_documents(&SearchParameters::default(), &cancel)
                .await
                .unwrap();
            assert_eq!(6, all.total);
            assert_eq!(6, all.returned());
            assert!(all.documents.windows(2).all(|w| w[0].id < w[1].id));

            let page = db
                .list_documents(
                    &SearchParameters {
                        page: Some(2),
                        page_size: Some(2),
                        document_types: vec![DocumentType::Text],
                    },
                    &cancel,
                )
                .await
                .unwrap();
            assert_eq!(5, page.total);
            assert_eq!(2, page.returned());
            assert_eq!("text-2", page.documents[0].title);

            let past_end = db
                .list_documents(&search(Some(10), Some(10)), &cancel)
                .await
                .unwrap();
            assert_eq!(6, past_end.total);
            assert!(past_end.documents.is_empty());

            let pdfs = db
                .list_documents(
                    &SearchParameters {
                        document_types: vec![DocumentType::Pdf],
                        ..Default::default()
                    },
                    &cancel,
                )
                .await
                .unwrap();
            assert_eq!(1, pdfs.total);
            assert_eq!("This is a PDF File (0kb)", pdfs.documents[0].description);
        }

        #[sqlx::test]
        #[ignore = "requires postgres"]
        async fn delete_removes_metadata_and_content(pool: PgPool) {
            let db = db(pool.clone());
            let cancel = CancellationToken::new();

            assert!(!db.delete(42, &cancel).await.unwrap());

            let id = db.insert(new_document("gone"), b"bytes", &cancel).await.unwrap();
            assert!(db.delete(id, &cancel).await.unwrap());

            assert!(db.get_by_id(id, &cancel).await.unwrap().is_none());
            assert!(db.get_content(id, &cancel).await.unwrap().is_none());
            assert_eq!(0, count(&pool, "document_content").await);
        }

        #[sqlx::test]
        #[ignore = "requires postgres"]
        async fn cancelled_insert_writes_nothing(pool: PgPool) {
            let db = db(pool.clone());
            let cancel = CancellationToken::new();
            cancel.cancel();

            let result = db.insert(new_document("never"), b"bytes", &cancel).await;
            assert!(matches!(result, Err(DocuploadError::Cancelled)));
            assert_eq!(0, count(&pool, "documents").await);
        }
    }
}
