//! Fatal layout and configuration mismatches
//!
//! None of these are retried: resubmitting an unchanged request against the
//! same page layout reproduces the same failure.

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// A hidden postback token is missing, usually an expired session or a changed page.
    #[error("Missing form state token: {field}")]
    MissingStateToken { field: &'static str },

    #[error("Document type '{label}' is not one of the search form's options")]
    UnknownDocumentType { label: String },

    #[error("Malformed result row ({reason}): {raw}")]
    MalformedRow { reason: String, raw: String },

    #[error("Malformed pager row: {reason}")]
    MalformedPager { reason: String },

    #[error("Pager reports page {found}, expected page {expected}")]
    PageOutOfSequence { expected: u32, found: u32 },
}
