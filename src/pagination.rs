use crate::error::DocuploadError;
use url::Url;

pub const PAGE_KEY: &str = "page";
pub const PAGE_SIZE_KEY: &str = "page_size";

/// Navigation links for a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLinks {
    pub first: Url,
    pub prev: Option<Url>,
    pub next: Option<Url>,
    pub last: Url,
}

impl PageLinks {
    /// Build links relative to `base`. Query parameters of `base` other than
    /// the page number and size are kept as they are.
    pub fn build(base: &Url, page: i64, page_size: i64, total: i64) -> Result<Self, DocuploadError> {
        if page <= 0 {
            return Err(DocuploadError::InvalidArgument(format!(
                "page must be positive, got {page}"
            )));
        }

        if page_size <= 0 {
            return Err(DocuploadError::InvalidArgument(format!(
                "page size must be positive, got {page_size}"
            )));
        }

        if total < 0 {
            return Err(DocuploadError::InvalidArgument(format!(
                "total must not be negative, got {total}"
            )));
        }

        let page_count = page_count(total, page_size);

        let link = |page: i64| {
            let pairs = base
                .query_pairs()
                .filter(|(key, _)| key != PAGE_KEY && key != PAGE_SIZE_KEY)
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect::<Vec<_>>();

            let mut url = base.clone();
            url.query_pairs_mut()
                .clear()
                .extend_pairs(pairs)
                .append_pair(PAGE_KEY, &page.to_string())
                .append_pair(PAGE_SIZE_KEY, &page_size.to_string());
            url
        };

        Ok(Self {
            first: link(1),
            prev: (page > 1).then(|| link(page - 1)),
            next: (page < page_count).then(|| link(page + 1)),
            last: link(page_count),
        })
    }

    /// RFC 8288 `Link` header value.
    pub fn to_link_header(&self) -> String {
        [
            (Some(&self.first), "first"),
            (self.prev.as_ref(), "prev"),
            (self.next.as_ref(), "next"),
            (Some(&self.last), "last"),
        ]
        .into_iter()
        .filter_map(|(url, rel)| url.map(|url| format!("<{url}>; rel=\"{rel}\"")))
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// Never less than one, so an empty listing still has a first and last page.
pub fn page_count(total: i64, page_size: i64) -> i64 {
    (total / page_size + i64::from(total % page_size != 0)).max(1)
}
